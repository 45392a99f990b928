//! Job configuration
//!
//! Settings come from two layers: an optional TOML file and command-line
//! flags. Both deserialize into the same partial [`JobSettings`]; flags are
//! merged over the file and the result is validated into a [`JobConfig`]
//! before any shard is touched.
//!
//! ```toml
//! prediction_path = "out/batch-2024-01-01"
//! metric_fn = "binary_classification"
//! metric_keys = ["log_loss", "mse"]
//! parallelism = 8
//! ```

use crate::error::{Result, SummaryError};
use crate::job::RunnerOptions;
use crate::metric::builtin::DEFAULT_LABEL_FIELD;
use crate::metric::{MetricKeys, MetricOptions};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Metric keys as written in a config file: `"a,b"` or `["a", "b"]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum KeyList {
    Joined(String),
    List(Vec<String>),
}

impl KeyList {
    fn parse(&self) -> Result<MetricKeys> {
        match self {
            Self::Joined(raw) => MetricKeys::parse(raw),
            Self::List(names) => MetricKeys::new(names),
        }
    }
}

/// Partially specified job settings from one configuration layer
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobSettings {
    pub prediction_path: Option<PathBuf>,
    pub metric_fn: Option<String>,
    pub metric_keys: Option<KeyList>,
    pub label_field: Option<String>,
    pub parallelism: Option<usize>,
    pub max_shard_attempts: Option<u32>,
    /// Execution-engine options carried through without interpretation
    #[serde(default)]
    pub engine_options: Vec<String>,
}

impl JobSettings {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| SummaryError::config("config", e.to_string()))
    }

    /// Read settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| SummaryError::io(path, e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            SummaryError::Configuration { reason, .. } => {
                SummaryError::config(format!("config file {}", path.display()), reason)
            }
            other => other,
        })
    }

    /// Layer `overrides` on top of these settings
    ///
    /// Every value present in `overrides` wins; engine options from both
    /// layers are kept, file options first.
    pub fn merge(self, overrides: JobSettings) -> JobSettings {
        let mut engine_options = self.engine_options;
        engine_options.extend(overrides.engine_options);

        JobSettings {
            prediction_path: overrides.prediction_path.or(self.prediction_path),
            metric_fn: overrides.metric_fn.or(self.metric_fn),
            metric_keys: overrides.metric_keys.or(self.metric_keys),
            label_field: overrides.label_field.or(self.label_field),
            parallelism: overrides.parallelism.or(self.parallelism),
            max_shard_attempts: overrides.max_shard_attempts.or(self.max_shard_attempts),
            engine_options,
        }
    }

    /// Validate into a complete job configuration
    pub fn resolve(self) -> Result<JobConfig> {
        let metric_keys = required(self.metric_keys, "metric_keys")?.parse()?;
        let metric_fn = required(self.metric_fn, "metric_fn")?;
        if metric_fn.trim().is_empty() {
            return Err(SummaryError::config("metric_fn", "must not be empty"));
        }
        let prediction_path = required(self.prediction_path, "prediction_path")?;

        let defaults = RunnerOptions::default();
        let runner = RunnerOptions {
            parallelism: self.parallelism.or(defaults.parallelism),
            max_shard_attempts: self
                .max_shard_attempts
                .unwrap_or(defaults.max_shard_attempts),
        };
        runner.validate()?;

        Ok(JobConfig {
            prediction_path,
            metric_fn: metric_fn.trim().to_string(),
            metric_keys,
            label_field: self
                .label_field
                .unwrap_or_else(|| DEFAULT_LABEL_FIELD.to_string()),
            runner,
            engine_options: self.engine_options,
        })
    }
}

/// Fully validated job configuration
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    pub prediction_path: PathBuf,
    pub metric_fn: String,
    pub metric_keys: MetricKeys,
    pub label_field: String,
    pub runner: RunnerOptions,
    pub engine_options: Vec<String>,
}

impl JobConfig {
    /// Options handed to the metric registry
    pub fn metric_options(&self) -> MetricOptions {
        MetricOptions::new(self.metric_keys.clone()).with_label_field(self.label_field.clone())
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| SummaryError::config(field, "is required"))
}
