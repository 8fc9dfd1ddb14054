//! A citation histogram computed as a (lite) MapReduce job.
//!
//! Input records map an identifier to a citation count. The map stage emits
//! `(count, 1)` for every record, the reduce stage sums the ones for each
//! distinct count. The shuffle of a real cluster is replaced with an
//! in-process, sharded group-by, so the whole job runs on a single machine.

use bytes::Bytes;
use std::hash::Hasher;

pub mod cmd;
pub mod config;
pub mod error;
pub mod format;
pub mod histogram;
pub mod logging;
pub mod standalone;
pub mod utils;

pub use config::{JobConfig, MalformedPolicy};
pub use error::HistogramError;
pub use histogram::{ExtractedPair, GroupedEntry, InputRecord, OutputRecord};

/////////////////////////////////////////////////////////////////////////////
// Key-value pairs
/////////////////////////////////////////////////////////////////////////////

/// A single key-value pair, as read from a key/value text file.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct KeyValue {
    /// The key.
    pub key: Bytes,
    /// The value.
    pub value: Bytes,
}

impl KeyValue {
    /// Construct a new key-value pair from the given key and value.
    pub fn new(key: Bytes, value: Bytes) -> Self {
        Self { key, value }
    }
}

/// Hashes an intermediate key. Compute a reduce bucket for a given key
/// by calculating `ihash(key) % n_reduce`.
pub fn ihash(key: &[u8]) -> u32 {
    let mut hasher = fnv::FnvHasher::with_key(0);
    hasher.write(key);
    // Masked to 31 bits, so the conversion cannot fail.
    (hasher.finish() & 0x7fffffff) as u32
}
