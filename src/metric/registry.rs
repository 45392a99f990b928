//! Name-based lookup of metric functions
//!
//! Jobs launched from the command line select their metric function by
//! name. Library users can register their own factories or bypass the
//! registry entirely and hand a [`MetricFn`] to the job builder.

use super::builtin::{BinaryClassification, FieldValues, DEFAULT_LABEL_FIELD};
use super::{MetricFn, MetricKeys};
use crate::error::{Result, SummaryError};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Inputs available to a metric factory
#[derive(Debug, Clone, PartialEq)]
pub struct MetricOptions {
    pub keys: MetricKeys,
    pub label_field: String,
}

impl MetricOptions {
    pub fn new(keys: MetricKeys) -> Self {
        Self {
            keys,
            label_field: DEFAULT_LABEL_FIELD.to_string(),
        }
    }

    pub fn with_label_field(mut self, label_field: impl Into<String>) -> Self {
        self.label_field = label_field.into();
        self
    }
}

/// Builds a metric function from job options
pub type MetricFactory = Arc<dyn Fn(&MetricOptions) -> Arc<dyn MetricFn> + Send + Sync>;

/// Registry of metric functions available by name
#[derive(Clone)]
pub struct MetricRegistry {
    factories: BTreeMap<String, MetricFactory>,
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for MetricRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl MetricRegistry {
    /// Registry without any metric functions
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry preloaded with `binary_classification` and `field_values`
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(
            "binary_classification",
            |options: &MetricOptions| -> Arc<dyn MetricFn> {
                Arc::new(BinaryClassification::new(options.label_field.clone()))
            },
        );
        registry.register(
            "field_values",
            |options: &MetricOptions| -> Arc<dyn MetricFn> {
                Arc::new(FieldValues::new(&options.keys))
            },
        );
        registry
    }

    /// Add or replace a metric factory
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&MetricOptions) -> Arc<dyn MetricFn> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Build the metric function registered under `name`
    pub fn resolve(&self, name: &str, options: &MetricOptions) -> Result<Arc<dyn MetricFn>> {
        let factory = self.factories.get(name).ok_or_else(|| {
            SummaryError::config(
                "metric_fn",
                format!(
                    "unknown metric function `{name}` (available: {})",
                    self.names().join(", ")
                ),
            )
        })?;
        Ok(factory(options))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}
