//! Runs the histogram job on a single machine.
//!
//! The map logic carries out mapping and also the shuffle: pairs land
//! directly in the bucket of their reduce partition. Once every input has
//! been mapped, each bucket is reduced into its own output.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::JobConfig;
use crate::format::{input, output};
use crate::histogram::{InputRecord, OutputRecord, MEMORY_ORIGIN};
use crate::KeyValue;
use self::engine::{in_pool, perform_map, perform_reduce, Buckets, CounterSnapshot, JobCounters};

pub mod engine;

/// What a finished file-based job produced.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub input_files: Vec<PathBuf>,
    pub part_files: Vec<PathBuf>,
    pub counters: CounterSnapshot,
}

/// Computes the histogram of in-memory `(identifier, citation count)`
/// pairs, sorted by citation count.
pub fn compute<I, K, V>(pairs: I, config: &JobConfig) -> Result<Vec<OutputRecord>>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Bytes>,
    V: Into<Bytes>,
{
    let origin: Arc<str> = Arc::from(MEMORY_ORIGIN);
    let records: Vec<InputRecord> = pairs
        .into_iter()
        .enumerate()
        .map(|(i, (id, count))| {
            InputRecord::new(origin.clone(), i as u64 + 1, KeyValue::new(id.into(), count.into()))
        })
        .collect();
    let (histogram, _) = compute_records(&records, config)?;
    Ok(histogram)
}

/// Like [`compute`], for records that already exist, also returning the
/// job counters.
pub fn compute_records(
    records: &[InputRecord],
    config: &JobConfig,
) -> Result<(Vec<OutputRecord>, CounterSnapshot)> {
    config.validate()?;
    let buckets = Buckets::new();
    let counters = JobCounters::default();

    in_pool(config.threads, || perform_map(records, config, &buckets, &counters))?;

    let mut sinks: Vec<Vec<OutputRecord>> = vec![Vec::new(); config.reducers as usize];
    perform_reduce(buckets, &mut sinks, &counters)?;

    let mut histogram: Vec<OutputRecord> = sinks.into_iter().flatten().collect();
    histogram.sort_unstable();
    Ok((histogram, counters.snapshot()))
}

/// Reads `config.input`, writes `part-NNNNN` files and a success marker
/// into `config.output`.
pub fn run_job(config: &JobConfig) -> Result<JobSummary> {
    config.validate()?;
    output::check_output_absent(&config.output)?;
    let input_files = input::list_input_files(&config.input)?;
    info!(
        input = %config.input,
        output = %config.output.display(),
        reducers = config.reducers,
        "starting citation histogram job"
    );
    debug!("job config: {}", serde_json::to_string(config)?);

    let buckets = Buckets::new();
    let counters = JobCounters::default();
    let separator = config.separator_byte();

    in_pool(config.threads, || {
        for path in &input_files {
            let records = input::read_records(path, separator)?;
            debug!(file = %path.display(), records = records.len(), "mapping input file");
            perform_map(&records, config, &buckets, &counters)
                .with_context(|| format!("Map phase failed on {}", path.display()))?;
        }
        Ok(())
    })?;
    info!(
        records = counters.snapshot().input_records,
        partitions = buckets.len(),
        "map phase complete"
    );

    // Only created once the map phase succeeded, so a failed run leaves
    // nothing behind.
    output::create_output_dir(&config.output)?;
    let (part_files, mut sinks): (Vec<_>, Vec<_>) =
        output::create_part_sinks(&config.output, config.reducers, &config.output_separator)?
            .into_iter()
            .unzip();
    perform_reduce(buckets, &mut sinks, &counters)?;
    for sink in sinks {
        sink.finish()?;
    }
    output::mark_success(&config.output)?;

    let summary = JobSummary {
        input_files,
        part_files,
        counters: counters.snapshot(),
    };
    info!(
        input_records = summary.counters.input_records,
        malformed_records = summary.counters.malformed_records,
        output_records = summary.counters.reduce_output_records,
        "job complete"
    );
    debug!("job summary: {}", serde_json::to_string(&summary)?);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MalformedPolicy;
    use crate::error::HistogramError;

    #[test]
    fn single_record_histogram() {
        let histogram = compute([("1", "5")], &JobConfig::default()).unwrap();
        assert_eq!(histogram, vec![OutputRecord::new(5, 1)]);
    }

    #[test]
    fn empty_input_gives_empty_histogram() {
        let pairs: Vec<(&'static str, &'static str)> = Vec::new();
        assert!(compute(pairs, &JobConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn counts_identifiers_per_citation_count() {
        let histogram = compute(
            [("a", "2"), ("b", "1"), ("c", "1"), ("d", "1")],
            &JobConfig::default(),
        )
        .unwrap();
        assert_eq!(
            histogram,
            vec![OutputRecord::new(1, 3), OutputRecord::new(2, 1)]
        );
    }

    #[test]
    fn malformed_record_aborts_by_default() {
        let err = compute([("a", "1"), ("x", "abc")], &JobConfig::default()).unwrap_err();
        match err.downcast_ref::<HistogramError>() {
            Some(HistogramError::MalformedInput {
                identifier, line, ..
            }) => {
                assert_eq!(identifier, "x");
                assert_eq!(*line, 2);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn malformed_record_is_skipped_when_asked() {
        let config = JobConfig::default().with_policy(MalformedPolicy::Skip);
        let records = vec![
            InputRecord::from_pair(1, "a", "1"),
            InputRecord::from_pair(2, "x", "abc"),
            InputRecord::from_pair(3, "b", "1"),
        ];
        let (histogram, counters) = compute_records(&records, &config).unwrap();
        assert_eq!(histogram, vec![OutputRecord::new(1, 2)]);
        assert_eq!(counters.malformed_records, 1);
        assert_eq!(counters.reduce_output_records, 1);
    }

    #[test]
    fn invalid_config_is_rejected_before_mapping() {
        let config = JobConfig::default().with_reducers(0);
        let err = compute([("a", "1")], &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HistogramError>(),
            Some(HistogramError::InvalidConfig(_))
        ));
    }
}
