use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{anyhow, Result};
use dashmap::DashMap;
use itertools::Itertools;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{JobConfig, MalformedPolicy};
use crate::error::HistogramError;
use crate::format::OutputSink;
use crate::histogram::{self, ExtractedPair, GroupedEntry, InputRecord};
use crate::ihash;

// types related to this engine
pub type BucketIndex = u32;
pub type Buckets = DashMap<BucketIndex, Vec<ExtractedPair>>;

/// Running totals of a job, shared by the map workers.
#[derive(Debug, Default)]
pub struct JobCounters {
    pub input_records: AtomicU64,
    pub malformed_records: AtomicU64,
    pub map_output_records: AtomicU64,
    pub reduce_input_groups: AtomicU64,
    pub reduce_output_records: AtomicU64,
}

/// A point-in-time copy of [`JobCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub input_records: u64,
    pub malformed_records: u64,
    pub map_output_records: u64,
    pub reduce_input_groups: u64,
    pub reduce_output_records: u64,
}

impl JobCounters {
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            input_records: self.input_records.load(Ordering::Relaxed),
            malformed_records: self.malformed_records.load(Ordering::Relaxed),
            map_output_records: self.map_output_records.load(Ordering::Relaxed),
            reduce_input_groups: self.reduce_input_groups.load(Ordering::Relaxed),
            reduce_output_records: self.reduce_output_records.load(Ordering::Relaxed),
        }
    }
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Reduce partition a pair is routed to.
pub fn partition_of(pair: &ExtractedPair, num_reduce_worker: u32) -> BucketIndex {
    ihash(&pair.partition_key()) % num_reduce_worker
}

/// Runs `op` on a dedicated pool of `threads` workers, or on the global
/// rayon pool when `threads` is `None`.
pub fn in_pool<T, F>(threads: Option<usize>, op: F) -> Result<T>
where
    T: Send,
    F: FnOnce() -> Result<T> + Send,
{
    match threads {
        Some(n) => rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()?
            .install(op),
        None => op(),
    }
}

/// Map phase for one batch of records.
///
/// Records are extracted in parallel and every pair is pushed into the
/// bucket of its reduce partition. Malformed records either abort the
/// phase or are skipped, according to `config.on_malformed`.
pub fn perform_map(
    records: &[InputRecord],
    config: &JobConfig,
    buckets: &Buckets,
    counters: &JobCounters,
) -> Result<()> {
    records.par_iter().try_for_each(|record| -> Result<()> {
        bump(&counters.input_records);
        match histogram::extract(record) {
            Ok(pair) => {
                let bucket_no = partition_of(&pair, config.reducers);
                #[allow(clippy::unwrap_or_default)]
                buckets
                    .entry(bucket_no)
                    .or_insert(Vec::new())
                    .push(pair);
                bump(&counters.map_output_records);
                Ok(())
            }
            Err(err @ HistogramError::MalformedInput { .. })
                if config.on_malformed == MalformedPolicy::Skip =>
            {
                warn!("Skipping record: {}", err);
                bump(&counters.malformed_records);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    })
}

/// Reduce phase.
///
/// Each bucket is sorted by citation count, grouped, aggregated and written
/// to `sinks[bucket]`, so every sink receives its records in ascending
/// count order.
pub fn perform_reduce<S: OutputSink>(
    buckets: Buckets,
    sinks: &mut [S],
    counters: &JobCounters,
) -> Result<()> {
    for (reduce_id, mut bkt) in buckets.into_iter() {
        let sink = sinks
            .get_mut(reduce_id as usize)
            .ok_or_else(|| anyhow!("No output sink for partition {}", reduce_id))?;
        debug!(partition = reduce_id, pairs = bkt.len(), "reducing partition");

        bkt.sort_unstable_by_key(|pair| pair.citation_count);
        for (citation_count, group) in &bkt.into_iter().chunk_by(|pair| pair.citation_count) {
            bump(&counters.reduce_input_groups);
            let record = histogram::aggregate(GroupedEntry {
                citation_count,
                occurrences: group.map(|pair| pair.occurrence),
            })?;
            sink.write(record)?;
            bump(&counters.reduce_output_records);
        }
    }
    Ok(())
}
