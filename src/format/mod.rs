//! Text formats at the edges of the job: key/value lines in, delimited
//! histogram lines out.

pub mod input;
pub mod output;

pub use input::{list_input_files, read_records, split_records};
pub use output::{OutputSink, TextSink};
