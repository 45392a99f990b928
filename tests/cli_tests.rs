//! Integration tests for the CLI interface
//!
//! Runs the binary against temporary prediction folders

mod common;

use assert_cmd::Command;
use common::PredictionDir;
use predicates::prelude::*;
use std::fs;

fn summary_cmd() -> Command {
    Command::cargo_bin("prediction-summary").unwrap()
}

#[test]
fn test_cli_help_flag() {
    summary_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--prediction-path"))
        .stdout(predicate::str::contains("--metric-keys"));
}

#[test]
fn test_cli_version_flag() {
    summary_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("prediction-summary"));
}

#[test]
fn test_list_metrics() {
    summary_cmd()
        .arg("--list-metrics")
        .assert()
        .success()
        .stdout(predicate::str::contains("binary_classification"))
        .stdout(predicate::str::contains("field_values"));
}

#[test]
fn test_summarizes_prediction_folder() {
    let dir = PredictionDir::with_sample().unwrap();

    summary_cmd()
        .arg("--prediction-path")
        .arg(dir.path())
        .args(["--metric-fn", "binary_classification"])
        .args(["--metric-keys", "log_loss,mse"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"mse\":0.25"))
        .stdout(predicate::str::contains("\"count\":4}"));

    let summary = dir.summary().unwrap();
    assert!(summary.contains("\"mse\":0.25,\"count\":4}"));
}

#[test]
fn test_engine_options_are_passed_through() {
    let dir = PredictionDir::with_sample().unwrap();

    summary_cmd()
        .arg("-v")
        .arg("--prediction-path")
        .arg(dir.path())
        .args(["--metric-fn", "binary_classification"])
        .args(["--metric-keys", "log_loss,mse"])
        .args(["--", "--runner=DataflowRunner", "--num_workers=4"])
        .assert()
        .success()
        .stderr(predicate::str::contains("--runner=DataflowRunner"));
}

#[test]
fn test_reserved_key_fails_without_output() {
    let dir = PredictionDir::with_sample().unwrap();

    summary_cmd()
        .arg("--prediction-path")
        .arg(dir.path())
        .args(["--metric-fn", "binary_classification"])
        .args(["--metric-keys", "count,mse"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid job configuration"))
        .stderr(predicate::str::contains("reserved"));

    assert_eq!(dir.summary(), None);
}

#[test]
fn test_empty_folder_fails() {
    let dir = PredictionDir::new().unwrap();

    summary_cmd()
        .arg("--prediction-path")
        .arg(dir.path())
        .args(["--metric-fn", "binary_classification"])
        .args(["--metric-keys", "log_loss,mse"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("zero records"));

    assert_eq!(dir.summary(), None);
}

#[test]
fn test_missing_metric_keys() {
    let dir = PredictionDir::with_sample().unwrap();

    summary_cmd()
        .arg("--prediction-path")
        .arg(dir.path())
        .args(["--metric-fn", "binary_classification"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("metric_keys"));
}

#[test]
fn test_unknown_metric_fn() {
    let dir = PredictionDir::with_sample().unwrap();

    summary_cmd()
        .arg("--prediction-path")
        .arg(dir.path())
        .args(["--metric-fn", "does_not_exist"])
        .args(["--metric-keys", "mse"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("binary_classification"));
}

#[test]
fn test_dry_run_lists_shards_without_writing() {
    let dir = PredictionDir::with_sample().unwrap();

    summary_cmd()
        .arg("--dry-run")
        .arg("--prediction-path")
        .arg(dir.path())
        .args(["--metric-fn", "binary_classification"])
        .args(["--metric-keys", "log_loss,mse"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would summarize 2 shard(s)"))
        .stdout(predicate::str::contains("prediction.results-00000-of-00002"));

    assert_eq!(dir.summary(), None);
}

#[test]
fn test_config_file() {
    let dir = PredictionDir::with_sample().unwrap();
    let config_path = dir.scratch().join("summary.toml");
    fs::write(
        &config_path,
        "metric_fn = \"binary_classification\"\nmetric_keys = [\"mse\", \"log_loss\"]\n",
    )
    .unwrap();

    summary_cmd()
        .arg("--config")
        .arg(&config_path)
        .arg("--prediction-path")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{\"mse\":0.25,\"log_loss\":"));
}

#[test]
fn test_config_file_rejects_unknown_fields() {
    let dir = PredictionDir::with_sample().unwrap();
    let config_path = dir.scratch().join("summary.toml");
    fs::write(&config_path, "metric_function = \"oops\"\n").unwrap();

    summary_cmd()
        .arg("-c")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config file"));
}
