//! Command-line entry point
//!
//! Turns parsed arguments into a validated job, runs it against the local
//! filesystem, and prints the summary.

pub mod args;

pub use args::Cli;

use crate::config::JobSettings;
use crate::job::SummaryJob;
use crate::metric::MetricRegistry;
use crate::storage::{summary_path, LocalShardStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

/// Log filter for a `-v` count
pub fn get_log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        2 => "trace",
        _ => "trace,rayon_core=debug", // -vvv shows everything including dependencies
    }
}

/// Run the command described by `cli`
pub fn run(cli: Cli) -> Result<()> {
    let registry = MetricRegistry::default();

    if cli.list_metrics {
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(());
    }

    let file_settings = match &cli.config {
        Some(path) => JobSettings::load(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => JobSettings::default(),
    };
    let config = file_settings
        .merge(cli.settings())
        .resolve()
        .context("Invalid job configuration")?;

    if !config.engine_options.is_empty() {
        debug!(
            "Passing through engine options: {:?}",
            config.engine_options
        );
    }

    let job = SummaryJob::from_config(&config, &registry, Arc::new(LocalShardStore::new()))
        .context("Invalid job configuration")?;

    if cli.dry_run {
        let shards = job.plan().context("Failed to list prediction shards")?;
        println!(
            "Would summarize {} shard(s) into {}",
            shards.len(),
            summary_path(job.prediction_path()).display()
        );
        for shard in shards {
            println!("  {}", shard.display());
        }
        return Ok(());
    }

    let report = job.run().context("Prediction summary failed")?;
    println!("{}", serde_json::to_string(&report.summary)?);
    Ok(())
}
