//! The prediction summary job
//!
//! Wires the four stages together:
//!
//! ```text
//! list shards -> evaluate + combine (parallel) -> format summary -> write summary
//! ```
//!
//! Every configuration problem is reported when the job is built, before a
//! single shard is listed. The summary is written only after all shards have
//! been combined and formatted, so a failed job never leaves a partial or
//! stale-looking summary behind.

pub mod runner;

pub use runner::{fold_shard, LocalRunner, RunnerOptions, DEFAULT_MAX_SHARD_ATTEMPTS};

use crate::aggregate::{MetricAccumulator, Summary};
use crate::config::JobConfig;
use crate::error::{Result, SummaryError};
use crate::metric::{MetricEvaluator, MetricFn, MetricKeys, MetricRegistry};
use crate::storage::{LocalShardStore, ShardStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span};

/// Outcome of a successful job run
#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    pub summary: Summary,
    pub output_path: PathBuf,
    pub shards: usize,
    pub duration: Duration,
}

/// A configured, ready-to-run summary job
pub struct SummaryJob {
    prediction_path: PathBuf,
    evaluator: MetricEvaluator,
    runner: LocalRunner,
    store: Arc<dyn ShardStore>,
}

impl std::fmt::Debug for SummaryJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryJob")
            .field("prediction_path", &self.prediction_path)
            .field("evaluator", &self.evaluator)
            .field("runner", &self.runner)
            .finish()
    }
}

impl SummaryJob {
    pub fn builder() -> SummaryJobBuilder {
        SummaryJobBuilder::default()
    }

    /// Build a job from validated configuration, resolving the metric
    /// function by name
    pub fn from_config(
        config: &JobConfig,
        registry: &MetricRegistry,
        store: Arc<dyn ShardStore>,
    ) -> Result<Self> {
        let metric_fn = registry.resolve(&config.metric_fn, &config.metric_options())?;
        Self::builder()
            .prediction_path(&config.prediction_path)
            .metric_keys(config.metric_keys.clone())
            .metric_fn(metric_fn)
            .runner_options(config.runner)
            .store(store)
            .build()
    }

    pub fn prediction_path(&self) -> &Path {
        &self.prediction_path
    }

    pub fn metric_keys(&self) -> &MetricKeys {
        self.evaluator.keys()
    }

    /// Shards the job would read, without reading them
    pub fn plan(&self) -> Result<Vec<PathBuf>> {
        self.store.list_shards(&self.prediction_path)
    }

    /// Evaluate and combine every record without formatting or writing
    pub fn aggregate(&self) -> Result<MetricAccumulator> {
        let shards = self.plan()?;
        self.aggregate_shards(&shards)
    }

    fn aggregate_shards(&self, shards: &[PathBuf]) -> Result<MetricAccumulator> {
        self.runner
            .combine_shards(self.store.as_ref(), shards, &self.evaluator)
    }

    /// Run the whole pipeline and write the summary
    pub fn run(&self) -> Result<JobReport> {
        let span = info_span!("summary_job", path = %self.prediction_path.display());
        let _guard = span.enter();
        let started = Instant::now();

        let shards = self.plan()?;
        info!(
            shards = shards.len(),
            workers = self.runner.workers(),
            keys = %self.evaluator.keys(),
            "Starting prediction summary"
        );

        let aggregate = self.aggregate_shards(&shards)?;
        debug!(tuple = ?aggregate.to_tuple(), "All shards combined");

        let summary = Summary::from_aggregate(&aggregate, self.evaluator.keys())?;
        let contents = summary.to_json_line()?;
        let output_path = self
            .store
            .write_summary(&self.prediction_path, contents.as_bytes())?;

        let duration = started.elapsed();
        info!(
            records = summary.count(),
            output = %output_path.display(),
            elapsed_ms = duration.as_millis() as u64,
            "Prediction summary written"
        );

        Ok(JobReport {
            summary,
            output_path,
            shards: shards.len(),
            duration,
        })
    }
}

/// Builder for [`SummaryJob`]
#[derive(Default)]
pub struct SummaryJobBuilder {
    prediction_path: Option<PathBuf>,
    metric_keys: Option<MetricKeys>,
    metric_fn: Option<Arc<dyn MetricFn>>,
    runner: RunnerOptions,
    store: Option<Arc<dyn ShardStore>>,
}

impl SummaryJobBuilder {
    pub fn prediction_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.prediction_path = Some(path.into());
        self
    }

    pub fn metric_keys(mut self, keys: MetricKeys) -> Self {
        self.metric_keys = Some(keys);
        self
    }

    pub fn metric_fn(mut self, metric_fn: Arc<dyn MetricFn>) -> Self {
        self.metric_fn = Some(metric_fn);
        self
    }

    pub fn runner_options(mut self, options: RunnerOptions) -> Self {
        self.runner = options;
        self
    }

    pub fn parallelism(mut self, workers: usize) -> Self {
        self.runner.parallelism = Some(workers);
        self
    }

    pub fn max_shard_attempts(mut self, attempts: u32) -> Self {
        self.runner.max_shard_attempts = attempts;
        self
    }

    /// Storage backend; defaults to the local filesystem
    pub fn store(mut self, store: Arc<dyn ShardStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<SummaryJob> {
        let metric_keys = self
            .metric_keys
            .ok_or_else(|| SummaryError::config("metric_keys", "is required"))?;
        let metric_fn = self
            .metric_fn
            .ok_or_else(|| SummaryError::config("metric_fn", "is required"))?;
        let prediction_path = self
            .prediction_path
            .ok_or_else(|| SummaryError::config("prediction_path", "is required"))?;
        let runner = LocalRunner::new(self.runner)?;

        Ok(SummaryJob {
            prediction_path,
            evaluator: MetricEvaluator::new(metric_fn, metric_keys),
            runner,
            store: self
                .store
                .unwrap_or_else(|| Arc::new(LocalShardStore::new())),
        })
    }
}
