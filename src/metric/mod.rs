//! Metric function contract and per-record evaluation
//!
//! A metric function maps one [`Record`] to a fixed-arity tuple of numbers.
//! It must be pure: no side effects, no dependence on evaluation order, and
//! safe to call concurrently or more than once for the same record. The
//! [`MetricEvaluator`] pairs a function with the configured [`MetricKeys`]
//! and enforces the arity contract on every call.

pub mod builtin;
pub mod keys;
pub mod registry;

pub use builtin::{BinaryClassification, FieldValues};
pub use keys::{MetricKeys, COUNT_KEY};
pub use registry::{MetricOptions, MetricRegistry};

use crate::error::{Result, SummaryError};
use crate::record::Record;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Ordered metric values produced for one record
pub type MetricTuple = Vec<f64>;

/// Reasons a metric function can reject a record
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MetricError {
    #[error("missing field `{0}`")]
    MissingField(String),

    #[error("field `{field}` is not numeric: {value}")]
    NotNumeric { field: String, value: String },

    #[error("field `{field}` has no element at index {index}")]
    MissingIndex { field: String, index: usize },

    #[error("metric {index} is not finite ({value})")]
    NonFinite { index: usize, value: f64 },

    #[error("{0}")]
    Invalid(String),
}

/// A pure function from a record to its metric tuple
pub trait MetricFn: Send + Sync {
    /// Compute the metric values for one record
    fn evaluate(&self, record: &Record) -> std::result::Result<MetricTuple, MetricError>;
}

impl<F> MetricFn for F
where
    F: Fn(&Record) -> std::result::Result<MetricTuple, MetricError> + Send + Sync,
{
    fn evaluate(&self, record: &Record) -> std::result::Result<MetricTuple, MetricError> {
        self(record)
    }
}

/// Applies a metric function and checks its output against the metric keys
#[derive(Clone)]
pub struct MetricEvaluator {
    metric_fn: Arc<dyn MetricFn>,
    keys: MetricKeys,
}

impl std::fmt::Debug for MetricEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricEvaluator")
            .field("metric_fn", &"<function>")
            .field("keys", &self.keys)
            .finish()
    }
}

impl MetricEvaluator {
    pub fn new(metric_fn: Arc<dyn MetricFn>, keys: MetricKeys) -> Self {
        Self { metric_fn, keys }
    }

    pub fn keys(&self) -> &MetricKeys {
        &self.keys
    }

    /// Number of values every metric tuple must carry
    pub fn arity(&self) -> usize {
        self.keys.len()
    }

    /// Evaluate one record read from `shard` at `line`
    ///
    /// A tuple of the wrong length is a configuration error and aborts the
    /// job. A rejected record or a non-finite value is a record error.
    pub fn evaluate(&self, record: &Record, shard: &Path, line: usize) -> Result<MetricTuple> {
        let rejected = |source| SummaryError::Metric {
            shard: shard.to_path_buf(),
            line,
            source,
        };

        let tuple = self.metric_fn.evaluate(record).map_err(rejected)?;

        if tuple.len() != self.arity() {
            return Err(SummaryError::ArityMismatch {
                expected: self.arity(),
                actual: tuple.len(),
            });
        }

        if let Some((index, value)) = tuple.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(rejected(MetricError::NonFinite {
                index,
                value: *value,
            }));
        }

        Ok(tuple)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn evaluator<F>(keys: &str, f: F) -> MetricEvaluator
    where
        F: Fn(&Record) -> std::result::Result<MetricTuple, MetricError> + Send + Sync + 'static,
    {
        MetricEvaluator::new(Arc::new(f), MetricKeys::parse(keys).unwrap())
    }

    #[test]
    fn test_closure_is_a_metric_fn() {
        let eval = evaluator("a,b", |_: &Record| Ok(vec![1.0, 2.0]));
        let tuple = eval
            .evaluate(&record(json!({})), Path::new("shard"), 1)
            .unwrap();
        assert_eq!(tuple, vec![1.0, 2.0]);
    }

    #[test]
    fn test_arity_mismatch_is_fatal_configuration() {
        let eval = evaluator("a,b", |_: &Record| Ok(vec![1.0, 2.0, 3.0]));
        let err = eval
            .evaluate(&record(json!({})), Path::new("shard"), 1)
            .unwrap_err();
        assert!(matches!(
            err,
            SummaryError::ArityMismatch {
                expected: 2,
                actual: 3
            }
        ));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_short_tuple_is_never_padded() {
        let eval = evaluator("a,b", |_: &Record| Ok(vec![]));
        assert!(matches!(
            eval.evaluate(&record(json!({})), Path::new("shard"), 1),
            Err(SummaryError::ArityMismatch {
                expected: 2,
                actual: 0
            })
        ));
    }

    #[test]
    fn test_rejection_carries_location() {
        let eval = evaluator("a", |_: &Record| {
            Err(MetricError::MissingField("classes".to_string()))
        });
        match eval.evaluate(&record(json!({})), Path::new("shard-3"), 12) {
            Err(SummaryError::Metric {
                shard,
                line,
                source,
            }) => {
                assert_eq!(shard, Path::new("shard-3"));
                assert_eq!(line, 12);
                assert_eq!(source, MetricError::MissingField("classes".to_string()));
            }
            other => panic!("expected metric error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let eval = evaluator("a,b", |_: &Record| Ok(vec![0.5, f64::NAN]));
        assert!(matches!(
            eval.evaluate(&record(json!({})), Path::new("shard"), 1),
            Err(SummaryError::Metric {
                source: MetricError::NonFinite { index: 1, .. },
                ..
            })
        ));

        let eval = evaluator("a", |_: &Record| Ok(vec![f64::INFINITY]));
        assert!(eval
            .evaluate(&record(json!({})), Path::new("shard"), 1)
            .is_err());
    }
}
