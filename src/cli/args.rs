//! CLI argument structures

use crate::config::{JobSettings, KeyList};
use clap::Parser;
use std::path::PathBuf;

/// Summarize batch prediction results
#[derive(Parser, Debug)]
#[command(name = "prediction-summary")]
#[command(
    about = "prediction-summary - Average per-instance metrics over sharded batch prediction results",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Folder holding prediction.results-NNNNN-of-NNNNN shards; the summary is written here
    #[arg(long, alias = "prediction_path", value_name = "PATH")]
    pub prediction_path: Option<PathBuf>,

    /// Name of the metric function applied to every record
    #[arg(long, alias = "metric_fn", value_name = "NAME")]
    pub metric_fn: Option<String>,

    /// Comma-separated metric names, in the order the metric function returns them
    #[arg(long, alias = "metric_keys", value_name = "KEYS")]
    pub metric_keys: Option<String>,

    /// Record field holding the ground-truth label (binary_classification)
    #[arg(long, value_name = "FIELD")]
    pub label_field: Option<String>,

    /// Number of worker threads (default: one per CPU)
    #[arg(long, value_name = "N")]
    pub parallelism: Option<usize>,

    /// Attempts per shard before a read failure aborts the job
    #[arg(long, value_name = "N")]
    pub max_shard_attempts: Option<u32>,

    /// Path to a TOML configuration file; flags take precedence
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Validate configuration and list shards without reading or writing
    #[arg(long)]
    pub dry_run: bool,

    /// List available metric functions and exit
    #[arg(long)]
    pub list_metrics: bool,

    /// Execution engine options, passed through uninterpreted
    #[arg(last = true, value_name = "ENGINE_OPTIONS")]
    pub engine_options: Vec<String>,
}

impl Cli {
    /// Settings given on the command line
    pub fn settings(&self) -> JobSettings {
        JobSettings {
            prediction_path: self.prediction_path.clone(),
            metric_fn: self.metric_fn.clone(),
            metric_keys: self.metric_keys.clone().map(KeyList::Joined),
            label_field: self.label_field.clone(),
            parallelism: self.parallelism,
            max_shard_attempts: self.max_shard_attempts,
            engine_options: self.engine_options.clone(),
        }
    }
}
