//! Structured error types for the summary job
//!
//! Every stage of the pipeline reports failures through [`SummaryError`].
//! Variants are grouped by how the job reacts to them: configuration errors
//! abort before any record is read, record errors abort the job with the
//! offending location, and I/O errors on shard reads are the only ones the
//! local runner retries.

use crate::metric::MetricError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for summary jobs
#[derive(Debug, Error)]
pub enum SummaryError {
    // Configuration errors
    #[error("Invalid configuration for {field}: {reason}")]
    Configuration { field: String, reason: String },

    #[error("Metric function returned {actual} value(s) but {expected} metric key(s) are configured")]
    ArityMismatch { expected: usize, actual: usize },

    // Record-level errors
    #[error("Failed to decode record at {}:{line}", .shard.display())]
    RecordDecode {
        shard: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Metric function rejected record at {}:{line}: {source}", .shard.display())]
    Metric {
        shard: PathBuf,
        line: usize,
        #[source]
        source: MetricError,
    },

    // End-of-job errors
    #[error("Cannot average metrics over zero records")]
    DivisionByZero,

    #[error("Metric {key} has a non-finite mean ({value})")]
    NonFiniteSummary { key: String, value: f64 },

    // I/O errors
    #[error("I/O error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize summary")]
    Serialization(#[from] serde_json::Error),
}

impl SummaryError {
    /// Build a configuration error for the named option
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether re-running the failed unit of work could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Whether the error was detected from configuration alone
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::ArityMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SummaryError>;
