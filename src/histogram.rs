//! The map and reduce stages of the citation histogram.
//!
//! ```text
//! input                 map output          reduce output
//! CiteId   cited        cited  occurrence   cited  frequency
//! 1        2            2      1            2      1
//! 10000    1      ->    1      1      ->    1      3
//! 100000   1            1      1
//! 1000006  1            1      1
//! ```
//!
//! Both stages are pure: the engine in [`crate::standalone`] owns reading,
//! grouping and writing.

use std::sync::Arc;

use bytes::Bytes;
use tracing::trace;

use crate::error::HistogramError;
use crate::utils::{lossy_string, str_from_bytes};
use crate::KeyValue;

/// Origin reported for records that were not read from a file.
pub const MEMORY_ORIGIN: &str = "memory";

/// One `identifier -> citation count` line of input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputRecord {
    /// File the record was read from, or [`MEMORY_ORIGIN`].
    pub origin: Arc<str>,
    /// 1-based line number within `origin`.
    pub line: u64,
    /// Identifier as key, citation count text as value.
    pub kv: KeyValue,
}

impl InputRecord {
    pub fn new(origin: Arc<str>, line: u64, kv: KeyValue) -> Self {
        Self { origin, line, kv }
    }

    /// A record that did not come from a file.
    pub fn from_pair(line: u64, identifier: impl Into<Bytes>, count: impl Into<Bytes>) -> Self {
        Self {
            origin: Arc::from(MEMORY_ORIGIN),
            line,
            kv: KeyValue::new(identifier.into(), count.into()),
        }
    }

    fn malformed(&self, reason: impl ToString) -> HistogramError {
        HistogramError::MalformedInput {
            origin: self.origin.to_string(),
            line: self.line,
            identifier: lossy_string(&self.kv.key),
            value: lossy_string(&self.kv.value),
            reason: reason.to_string(),
        }
    }
}

/// Output of the map stage: a citation count seen once.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExtractedPair {
    pub citation_count: u64,
    pub occurrence: u64,
}

impl ExtractedPair {
    pub fn once(citation_count: u64) -> Self {
        Self {
            citation_count,
            occurrence: 1,
        }
    }

    /// The bytes the pair is partitioned on.
    #[inline]
    pub fn partition_key(&self) -> [u8; 8] {
        self.citation_count.to_be_bytes()
    }
}

/// All occurrences of one citation count, gathered by the engine.
///
/// `occurrences` is consumed exactly once, by [`aggregate`].
#[derive(Debug)]
pub struct GroupedEntry<I> {
    pub citation_count: u64,
    pub occurrences: I,
}

/// One line of the histogram.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OutputRecord {
    pub citation_count: u64,
    /// Number of identifiers having `citation_count` citations.
    pub frequency: u64,
}

impl OutputRecord {
    pub fn new(citation_count: u64, frequency: u64) -> Self {
        Self {
            citation_count,
            frequency,
        }
    }
}

/// Map stage: parses the citation count of `record` and emits it once.
///
/// Counts must be non-negative decimal integers fitting in a `u64`; a
/// leading `+` is accepted, surrounding whitespace is not.
pub fn extract(record: &InputRecord) -> Result<ExtractedPair, HistogramError> {
    let text = str_from_bytes(&record.kv.value).map_err(|e| record.malformed(e))?;
    let citation_count = text.parse::<u64>().map_err(|e| record.malformed(e))?;
    trace!(origin = %record.origin, line = record.line, citation_count, "extracted");
    Ok(ExtractedPair::once(citation_count))
}

/// Reduce stage: sums every occurrence of one citation count.
///
/// The sum is checked; a frequency that does not fit in a `u64` is an
/// [`HistogramError::Overflow`] rather than a wrapped value.
pub fn aggregate<I>(entry: GroupedEntry<I>) -> Result<OutputRecord, HistogramError>
where
    I: IntoIterator<Item = u64>,
{
    let GroupedEntry {
        citation_count,
        occurrences,
    } = entry;
    let frequency = occurrences
        .into_iter()
        .try_fold(0u64, |acc, n| acc.checked_add(n))
        .ok_or(HistogramError::Overflow { citation_count })?;
    Ok(OutputRecord::new(citation_count, frequency))
}
