//! Built-in metric functions

use super::{MetricError, MetricFn, MetricKeys, MetricTuple};
use crate::record::{value_as_f64, Record};
use serde_json::Value;

/// Label field read by [`BinaryClassification`] unless configured otherwise
pub const DEFAULT_LABEL_FIELD: &str = "input_label";

/// Log loss and squared error of a binary classifier
///
/// For a record with label `y`, predicted class `c`, and positive-class
/// score `p = scores[1]`:
///
/// ```text
/// log_loss      = ln(1 + exp(-(2y - 1) * ln(p / (1 - p))))
/// squared_error = (c - y)^2
/// ```
///
/// # Example
///
/// ```
/// use prediction_summary::metric::{BinaryClassification, MetricFn};
/// use serde_json::json;
///
/// let record = json!({"input_label": 1, "classes": 1, "scores": [0.1, 0.9]});
/// let tuple = BinaryClassification::default()
///     .evaluate(record.as_object().unwrap())
///     .unwrap();
/// assert!((tuple[0] - 0.9f64.ln().abs()).abs() < 1e-12);
/// assert_eq!(tuple[1], 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryClassification {
    label_field: String,
}

impl Default for BinaryClassification {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL_FIELD)
    }
}

impl BinaryClassification {
    pub fn new(label_field: impl Into<String>) -> Self {
        Self {
            label_field: label_field.into(),
        }
    }

    pub fn label_field(&self) -> &str {
        &self.label_field
    }
}

impl MetricFn for BinaryClassification {
    fn evaluate(&self, record: &Record) -> Result<MetricTuple, MetricError> {
        let label = numeric_field(record, &self.label_field)?;
        let classes = numeric_field(record, "classes")?;
        let prediction = numeric_element(record, "scores", 1)?;

        if !(prediction > 0.0 && prediction < 1.0) {
            return Err(MetricError::Invalid(format!(
                "score {prediction} must lie strictly between 0 and 1"
            )));
        }

        let logit = (prediction / (1.0 - prediction)).ln();
        let log_loss = (1.0 + (-(label * 2.0 - 1.0) * logit).exp()).ln();
        let squared_error = (classes - label).powi(2);

        Ok(vec![log_loss, squared_error])
    }
}

/// Reads one numeric field per metric key, in key order
///
/// Useful when the prediction job already emits per-instance metrics and
/// the summary only needs their means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValues {
    fields: Vec<String>,
}

impl FieldValues {
    pub fn new(keys: &MetricKeys) -> Self {
        Self {
            fields: keys.as_slice().to_vec(),
        }
    }
}

impl MetricFn for FieldValues {
    fn evaluate(&self, record: &Record) -> Result<MetricTuple, MetricError> {
        self.fields
            .iter()
            .map(|field| numeric_field(record, field))
            .collect()
    }
}

fn numeric_field(record: &Record, field: &str) -> Result<f64, MetricError> {
    let value = record
        .get(field)
        .ok_or_else(|| MetricError::MissingField(field.to_string()))?;
    as_number(field, value)
}

fn numeric_element(record: &Record, field: &str, index: usize) -> Result<f64, MetricError> {
    let value = record
        .get(field)
        .ok_or_else(|| MetricError::MissingField(field.to_string()))?;
    let element = value
        .as_array()
        .and_then(|items| items.get(index))
        .ok_or_else(|| MetricError::MissingIndex {
            field: field.to_string(),
            index,
        })?;
    as_number(field, element)
}

fn as_number(field: &str, value: &Value) -> Result<f64, MetricError> {
    value_as_f64(value).ok_or_else(|| MetricError::NotNumeric {
        field: field.to_string(),
        value: value.to_string(),
    })
}
