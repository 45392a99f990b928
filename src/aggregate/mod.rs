//! Metric aggregation and summary formatting
//!
//! Per-record metric tuples are folded into [`MetricAccumulator`]s, merged
//! across shards and workers, and finally turned into a [`Summary`] of means.

pub mod accumulator;
pub mod summary;

pub use accumulator::{combine_all, parallel_combine, CompensatedSum, MetricAccumulator};
pub use summary::Summary;
