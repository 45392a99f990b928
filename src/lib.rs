//! # Prediction Summary
//!
//! Summarize batch prediction output: apply a metric function to every
//! prediction record in a sharded, line-delimited JSON collection and reduce
//! the per-record metric tuples into one averaged summary.
//!
//! ## Usage
//!
//! ```bash
//! prediction-summary --prediction-path out/ --metric-fn binary_classification --metric-keys log_loss,mse
//! ```
//!
//! ## Modules
//!
//! - `aggregate` - Associative metric accumulator and the summary formatter
//! - `cli` - Command-line interface definition and entry point
//! - `config` - Job configuration from flags and TOML files
//! - `error` - Error taxonomy shared by every stage of the job
//! - `job` - Pipeline wiring and the local parallel runner
//! - `metric` - Metric function contract, metric keys, and built-in metrics
//! - `record` - Prediction records and line-delimited JSON decoding
//! - `storage` - Shard discovery, shard reading, and summary writing
pub mod aggregate;
pub mod cli;
pub mod config;
pub mod error;
pub mod job;
pub mod metric;
pub mod record;
pub mod storage;

pub use aggregate::{MetricAccumulator, Summary};
pub use error::{Result, SummaryError};
pub use job::{JobReport, SummaryJob};
pub use metric::{MetricError, MetricFn, MetricKeys, MetricTuple};
pub use record::Record;
