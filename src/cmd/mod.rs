//! Command-line arguments of the binaries in `src/app`.

pub mod histogram;
