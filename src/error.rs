use std::path::PathBuf;

use thiserror::Error;

/// Failures specific to the citation histogram job.
///
/// I/O failures are not listed here; they travel as [`anyhow::Error`] with
/// the offending path attached as context.
#[derive(Debug, Error)]
pub enum HistogramError {
    #[error("{origin}:{line}: malformed citation count {value:?} for identifier {identifier:?}: {reason}")]
    MalformedInput {
        origin: String,
        line: u64,
        identifier: String,
        value: String,
        reason: String,
    },
    #[error("frequency of citation count {citation_count} overflows a 64-bit counter")]
    Overflow { citation_count: u64 },
    #[error("output directory {} already exists", .0.display())]
    OutputExists(PathBuf),
    #[error("input location '{0}' matches no files")]
    NoInput(String),
    #[error("configuration error: {0}")]
    InvalidConfig(String),
}
