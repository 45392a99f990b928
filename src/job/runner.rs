//! Local parallel runner
//!
//! Executes the map and combine stages on a dedicated rayon pool. Every
//! shard is one unit of work: it is read sequentially and folded into its
//! own partial accumulator, and the partials are tree-reduced with
//! [`parallel_combine`]. A shard that fails with a transient error is
//! restarted from an empty accumulator, so a retried record is never
//! counted twice.

use crate::aggregate::{parallel_combine, MetricAccumulator};
use crate::error::{Result, SummaryError};
use crate::metric::MetricEvaluator;
use crate::record::RecordReader;
use crate::storage::ShardStore;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default number of attempts per shard, including the first
pub const DEFAULT_MAX_SHARD_ATTEMPTS: u32 = 3;

/// Scheduling options for the local runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Worker threads; `None` uses one per logical CPU
    pub parallelism: Option<usize>,
    /// Attempts per shard before a transient failure becomes fatal
    pub max_shard_attempts: u32,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            parallelism: None,
            max_shard_attempts: DEFAULT_MAX_SHARD_ATTEMPTS,
        }
    }
}

impl RunnerOptions {
    pub fn validate(&self) -> Result<()> {
        if self.parallelism == Some(0) {
            return Err(SummaryError::config("parallelism", "must be at least 1"));
        }
        if self.max_shard_attempts == 0 {
            return Err(SummaryError::config(
                "max_shard_attempts",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// In-process execution engine for the summary job
pub struct LocalRunner {
    pool: ThreadPool,
    max_shard_attempts: u32,
}

impl std::fmt::Debug for LocalRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalRunner")
            .field("workers", &self.workers())
            .field("max_shard_attempts", &self.max_shard_attempts)
            .finish()
    }
}

impl LocalRunner {
    pub fn new(options: RunnerOptions) -> Result<Self> {
        options.validate()?;

        let mut builder =
            ThreadPoolBuilder::new().thread_name(|index| format!("summary-worker-{index}"));
        if let Some(threads) = options.parallelism {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .map_err(|e| SummaryError::config("parallelism", e.to_string()))?;

        Ok(Self {
            pool,
            max_shard_attempts: options.max_shard_attempts,
        })
    }

    /// Number of worker threads in the pool
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Evaluate and combine every record of every shard
    ///
    /// Returns only once all shards have been merged; the first fatal error
    /// aborts the reduction.
    pub fn combine_shards(
        &self,
        store: &dyn ShardStore,
        shards: &[PathBuf],
        evaluator: &MetricEvaluator,
    ) -> Result<MetricAccumulator> {
        self.pool.install(|| {
            let partials = shards
                .par_iter()
                .map(|shard| self.process_shard(store, shard, evaluator))
                .collect::<Result<Vec<_>>>()?;
            parallel_combine(evaluator.arity(), partials)
        })
    }

    fn process_shard(
        &self,
        store: &dyn ShardStore,
        shard: &Path,
        evaluator: &MetricEvaluator,
    ) -> Result<MetricAccumulator> {
        let mut attempt = 1;
        loop {
            let result = store
                .open_shard(shard)
                .and_then(|reader| fold_shard(shard, reader, evaluator));

            match result {
                Ok(partial) => {
                    debug!(
                        shard = %shard.display(),
                        records = partial.count(),
                        attempt,
                        "Shard combined"
                    );
                    return Ok(partial);
                }
                Err(e) if e.is_transient() && attempt < self.max_shard_attempts => {
                    warn!(
                        shard = %shard.display(),
                        attempt,
                        max_attempts = self.max_shard_attempts,
                        "Retrying shard after transient failure: {}",
                        e
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Fold one shard's records into a fresh partial accumulator
pub fn fold_shard<R: BufRead>(
    shard: &Path,
    reader: R,
    evaluator: &MetricEvaluator,
) -> Result<MetricAccumulator> {
    let mut partial = MetricAccumulator::identity(evaluator.arity());
    let mut records = RecordReader::new(shard, reader);

    while let Some(record) = records.next() {
        let record = record?;
        let tuple = evaluator.evaluate(&record, shard, records.line())?;
        partial.push(&tuple)?;
    }

    Ok(partial)
}
