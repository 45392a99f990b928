//! Associative accumulator for metric tuples
//!
//! [`MetricAccumulator`] is a monoid over augmented metric tuples: the
//! identity is the all-zero tuple and `merge` adds position by position.
//! Because merge is associative and commutative, partial accumulators built
//! by any number of workers over any partition of the records can be
//! combined in any order or tree shape. Results may differ only in the last
//! bits of floating-point rounding.

use crate::error::{Result, SummaryError};
use rayon::prelude::*;

/// Neumaier-compensated floating-point sum
///
/// Tracks the low-order bits lost by each addition so that summing millions
/// of small per-record values does not drift.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    pub const ZERO: Self = Self {
        sum: 0.0,
        compensation: 0.0,
    };

    pub fn add(&mut self, value: f64) {
        let total = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - total) + value;
        } else {
            self.compensation += (value - total) + self.sum;
        }
        self.sum = total;
    }

    pub fn merge(mut self, other: Self) -> Self {
        self.add(other.sum);
        self.add(other.compensation);
        self
    }

    /// Best estimate of the exact sum
    pub fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

impl From<f64> for CompensatedSum {
    fn from(value: f64) -> Self {
        let mut sum = Self::ZERO;
        sum.add(value);
        sum
    }
}

/// Running elementwise sum of augmented metric tuples
///
/// Holds one compensated sum per metric position plus the exact number of
/// tuples folded in, which is the trailing unit-count position of the
/// aggregate tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricAccumulator {
    sums: Vec<CompensatedSum>,
    count: u64,
}

impl MetricAccumulator {
    /// The all-zero accumulator for tuples of `arity` metrics
    pub fn identity(arity: usize) -> Self {
        Self {
            sums: vec![CompensatedSum::ZERO; arity],
            count: 0,
        }
    }

    /// Rebuild an accumulator from its `arity + 1` positional form
    ///
    /// The last element is the record count and must be a non-negative
    /// whole number.
    pub fn from_tuple(tuple: &[f64]) -> Result<Self> {
        let (count, sums) = tuple.split_last().ok_or(SummaryError::ArityMismatch {
            expected: 1,
            actual: 0,
        })?;

        if !(count.is_finite() && *count >= 0.0 && count.fract() == 0.0) {
            return Err(SummaryError::config(
                "aggregate",
                format!("record count {count} is not a non-negative whole number"),
            ));
        }

        Ok(Self {
            sums: sums.iter().copied().map(CompensatedSum::from).collect(),
            count: *count as u64,
        })
    }

    /// Number of metric positions, excluding the count
    pub fn arity(&self) -> usize {
        self.sums.len()
    }

    /// Number of records folded in so far
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Fold in one record's metric tuple paired with a count of one
    pub fn push(&mut self, tuple: &[f64]) -> Result<()> {
        if tuple.len() != self.arity() {
            return Err(SummaryError::ArityMismatch {
                expected: self.arity(),
                actual: tuple.len(),
            });
        }
        for (sum, value) in self.sums.iter_mut().zip(tuple) {
            sum.add(*value);
        }
        self.count = self.count.saturating_add(1);
        Ok(())
    }

    /// Combine two partial accumulators
    pub fn merge(self, other: Self) -> Result<Self> {
        if self.arity() != other.arity() {
            return Err(SummaryError::ArityMismatch {
                expected: self.arity(),
                actual: other.arity(),
            });
        }
        let sums = self
            .sums
            .into_iter()
            .zip(other.sums)
            .map(|(a, b)| a.merge(b))
            .collect();
        Ok(Self {
            sums,
            count: self.count.saturating_add(other.count),
        })
    }

    /// Per-metric sums, in key order
    pub fn sums(&self) -> Vec<f64> {
        self.sums.iter().map(CompensatedSum::value).collect()
    }

    /// Positional `arity + 1` view: metric sums followed by the count
    pub fn to_tuple(&self) -> Vec<f64> {
        let mut tuple = self.sums();
        tuple.push(self.count as f64);
        tuple
    }
}

/// Fold accumulators left to right, starting from the identity
pub fn combine_all<I>(arity: usize, partials: I) -> Result<MetricAccumulator>
where
    I: IntoIterator<Item = MetricAccumulator>,
{
    partials
        .into_iter()
        .try_fold(MetricAccumulator::identity(arity), MetricAccumulator::merge)
}

/// Combine accumulators as a parallel tree reduction
///
/// # Example
/// ```
/// use prediction_summary::aggregate::{parallel_combine, MetricAccumulator};
///
/// let partials: Vec<_> = (0..1000)
///     .map(|_| {
///         let mut acc = MetricAccumulator::identity(1);
///         acc.push(&[0.5]).unwrap();
///         acc
///     })
///     .collect();
///
/// let combined = parallel_combine(1, partials).unwrap();
/// assert_eq!(combined.count(), 1000);
/// assert_eq!(combined.sums(), vec![500.0]);
/// ```
pub fn parallel_combine(arity: usize, partials: Vec<MetricAccumulator>) -> Result<MetricAccumulator> {
    partials
        .into_par_iter()
        .map(Ok)
        .try_reduce(|| MetricAccumulator::identity(arity), MetricAccumulator::merge)
}
