//! Final summary: per-metric means plus the record count

use super::MetricAccumulator;
use crate::error::{Result, SummaryError};
use crate::metric::{MetricKeys, COUNT_KEY};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Mean of every metric over all records, plus the number of records
///
/// Serializes as one JSON object whose fields are the metric keys in
/// configured order followed by `"count"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    means: Vec<(String, f64)>,
    count: u64,
}

impl Summary {
    /// Divide every metric sum by the record count
    ///
    /// Fails with [`SummaryError::DivisionByZero`] when no record was
    /// processed instead of producing NaN means.
    pub fn from_aggregate(aggregate: &MetricAccumulator, keys: &MetricKeys) -> Result<Self> {
        if aggregate.arity() != keys.len() {
            return Err(SummaryError::ArityMismatch {
                expected: keys.len(),
                actual: aggregate.arity(),
            });
        }
        if aggregate.is_empty() {
            return Err(SummaryError::DivisionByZero);
        }

        let count = aggregate.count();
        let means = keys
            .iter()
            .zip(aggregate.sums())
            .map(|(key, sum)| {
                let mean = sum / count as f64;
                if mean.is_finite() {
                    Ok((key.to_string(), mean))
                } else {
                    Err(SummaryError::NonFiniteSummary {
                        key: key.to_string(),
                        value: mean,
                    })
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { means, count })
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean of the named metric
    pub fn get(&self, key: &str) -> Option<f64> {
        self.means
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, mean)| *mean)
    }

    /// Metric means in key order
    pub fn means(&self) -> impl Iterator<Item = (&str, f64)> {
        self.means.iter().map(|(name, mean)| (name.as_str(), *mean))
    }

    /// Compact JSON object terminated by a newline, as written to the sink
    pub fn to_json_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

impl Serialize for Summary {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.means.len() + 1))?;
        for (name, mean) in &self.means {
            map.serialize_entry(name, mean)?;
        }
        map.serialize_entry(COUNT_KEY, &self.count)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(raw: &str) -> MetricKeys {
        MetricKeys::parse(raw).unwrap()
    }

    #[test]
    fn test_means_divide_by_count() {
        let aggregate = MetricAccumulator::from_tuple(&[1.0, 3.0, 4.0]).unwrap();
        let summary = Summary::from_aggregate(&aggregate, &keys("a,b")).unwrap();
        assert_eq!(summary.get("a"), Some(0.25));
        assert_eq!(summary.get("b"), Some(0.75));
        assert_eq!(summary.get("count"), None);
        assert_eq!(summary.count(), 4);
        assert_eq!(
            summary.means().collect::<Vec<_>>(),
            vec![("a", 0.25), ("b", 0.75)]
        );
    }

    #[test]
    fn test_zero_records_is_division_by_zero() {
        let aggregate = MetricAccumulator::identity(2);
        assert!(matches!(
            Summary::from_aggregate(&aggregate, &keys("log_loss,mse")),
            Err(SummaryError::DivisionByZero)
        ));
    }

    #[test]
    fn test_overflowed_sum_is_not_emitted() {
        let half = MetricAccumulator::from_tuple(&[f64::MAX, 1.0, 1.0]).unwrap();
        let overflowed = half.clone().merge(half).unwrap();
        match Summary::from_aggregate(&overflowed, &keys("big,small")) {
            Err(SummaryError::NonFiniteSummary { key, .. }) => assert_eq!(key, "big"),
            other => panic!("expected non-finite summary, got {other:?}"),
        }
    }

    #[test]
    fn test_arity_must_match_keys() {
        let aggregate = MetricAccumulator::from_tuple(&[1.0, 1.0]).unwrap();
        assert!(matches!(
            Summary::from_aggregate(&aggregate, &keys("a,b")),
            Err(SummaryError::ArityMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_serialized_form_keeps_key_order() {
        let aggregate = MetricAccumulator::from_tuple(&[1.7556204226121819, 1.0, 4.0]).unwrap();
        let summary = Summary::from_aggregate(&aggregate, &keys("log_loss,mse")).unwrap();
        insta::assert_snapshot!(
            serde_json::to_string(&summary).unwrap(),
            @r#"{"log_loss":0.43890510565304547,"mse":0.25,"count":4}"#
        );
        assert!(summary.to_json_line().unwrap().ends_with("}\n"));
    }

    #[test]
    fn test_serialized_form_follows_configured_order() {
        let aggregate = MetricAccumulator::from_tuple(&[1.0, 2.0, 2.0]).unwrap();
        let summary = Summary::from_aggregate(&aggregate, &keys("zeta,alpha")).unwrap();
        assert_eq!(
            serde_json::to_string(&summary).unwrap(),
            r#"{"zeta":0.5,"alpha":1.0,"count":2}"#
        );
    }
}
