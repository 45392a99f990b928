//! Metric key list validation

use crate::error::{Result, SummaryError};
use serde::Serialize;
use std::collections::HashSet;
use std::str::FromStr;

/// Summary field reserved for the number of records processed
pub const COUNT_KEY: &str = "count";

/// Ordered, distinct names of the metrics in every tuple
///
/// The order defines both tuple positions and the field order of the
/// summary. The list is never empty and never contains [`COUNT_KEY`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MetricKeys(Vec<String>);

impl MetricKeys {
    /// Parse a comma-separated key list such as `log_loss,mse`
    pub fn parse(raw: &str) -> Result<Self> {
        Self::new(raw.split(','))
    }

    /// Validate an explicit list of names
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .collect();

        if names.is_empty() || names.iter().all(|n| n.is_empty()) {
            return Err(invalid("at least one metric key is required"));
        }
        if names.iter().any(|n| n.is_empty()) {
            return Err(invalid("metric keys must not be empty"));
        }
        if names.iter().any(|n| n == COUNT_KEY) {
            return Err(invalid(format!(
                "`{COUNT_KEY}` is reserved for the number of records"
            )));
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = names.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(invalid(format!("duplicate metric key `{duplicate}`")));
        }

        Ok(Self(names))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for keys that passed validation
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl FromStr for MetricKeys {
    type Err = SummaryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for MetricKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}

fn invalid(reason: impl Into<String>) -> SummaryError {
    SummaryError::config("metric_keys", reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_order() {
        let keys = MetricKeys::parse("log_loss,mse").unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys.iter().collect::<Vec<_>>(), vec!["log_loss", "mse"]);
        assert_eq!(keys.to_string(), "log_loss,mse");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let keys = MetricKeys::parse(" log_loss , mse ").unwrap();
        assert_eq!(keys.as_slice(), &["log_loss".to_string(), "mse".to_string()]);
    }

    #[test]
    fn test_count_is_reserved() {
        let err = MetricKeys::parse("count,mse").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn test_rejects_empty_and_duplicate_keys() {
        assert!(MetricKeys::parse("").is_err());
        assert!(MetricKeys::parse(" , ").is_err());
        assert!(MetricKeys::parse("a,,b").is_err());
        assert!(MetricKeys::new(Vec::<String>::new()).is_err());

        let err = MetricKeys::parse("mse,log_loss,mse").unwrap_err();
        assert!(err.to_string().contains("duplicate metric key `mse`"));
    }

    #[test]
    fn test_from_str() {
        let keys: MetricKeys = "accuracy".parse().unwrap();
        assert_eq!(keys.len(), 1);
    }
}
