//! Strictly increasing time grids.
//!
//! Used both for simulation times and for tenor (component) dates.

use super::error::DiscretizationError;
use std::sync::Arc;

/// Tolerance used when locating a time on the grid.
const TIME_TOLERANCE: f64 = 1e-10;

/// A strictly increasing sequence of times.
///
/// Times are stored behind an `Arc`; clones share storage.
///
/// # Example
///
/// ```
/// use pricer_core::types::TimeDiscretization;
///
/// let grid = TimeDiscretization::new(vec![0.0, 0.5, 1.0, 2.0]).unwrap();
/// assert_eq!(grid.len(), 4);
/// assert_eq!(grid.step(2), 1.0);
/// assert_eq!(grid.index_of(1.0), Some(2));
/// assert_eq!(grid.index_before(1.5), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TimeDiscretization {
    times: Arc<[f64]>,
}

impl TimeDiscretization {
    /// Create a discretisation from explicit times.
    ///
    /// # Errors
    ///
    /// - `DiscretizationError::Empty` if `times` is empty
    /// - `DiscretizationError::NonFinite` if any time is NaN or infinite
    /// - `DiscretizationError::NotIncreasing` if times are not strictly increasing
    pub fn new(times: Vec<f64>) -> Result<Self, DiscretizationError> {
        if times.is_empty() {
            return Err(DiscretizationError::Empty);
        }
        for (index, t) in times.iter().enumerate() {
            if !t.is_finite() {
                return Err(DiscretizationError::NonFinite { index });
            }
        }
        for (index, pair) in times.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(DiscretizationError::NotIncreasing {
                    index: index + 1,
                    previous: pair[0],
                    current: pair[1],
                });
            }
        }
        Ok(Self {
            times: times.into(),
        })
    }

    /// Create `number_of_steps + 1` equally spaced times starting at `start`.
    pub fn uniform(
        start: f64,
        number_of_steps: usize,
        step: f64,
    ) -> Result<Self, DiscretizationError> {
        if !step.is_finite() || step <= 0.0 {
            return Err(DiscretizationError::InvalidStep { step });
        }
        Self::new(
            (0..=number_of_steps)
                .map(|i| start + i as f64 * step)
                .collect(),
        )
    }

    /// Number of times on the grid.
    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Always false; an empty grid cannot be constructed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Number of intervals (`len() - 1`).
    #[inline]
    pub fn number_of_steps(&self) -> usize {
        self.times.len() - 1
    }

    /// Time at `index`, if on the grid.
    #[inline]
    pub fn time(&self, index: usize) -> Option<f64> {
        self.times.get(index).copied()
    }

    /// All times.
    #[inline]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// First time on the grid.
    #[inline]
    pub fn first(&self) -> f64 {
        self.times[0]
    }

    /// Last time on the grid.
    #[inline]
    pub fn last(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    /// Length of the interval starting at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index + 1 >= len()`.
    #[inline]
    pub fn step(&self, index: usize) -> f64 {
        self.times[index + 1] - self.times[index]
    }

    /// Index of `time` on the grid, within a small tolerance.
    pub fn index_of(&self, time: f64) -> Option<usize> {
        let i = self.times.partition_point(|&t| t < time - TIME_TOLERANCE);
        match self.times.get(i) {
            Some(&t) if (t - time).abs() <= TIME_TOLERANCE => Some(i),
            _ => None,
        }
    }

    /// Index of the last grid time less than or equal to `time`.
    pub fn index_before(&self, time: f64) -> Option<usize> {
        let i = self.times.partition_point(|&t| t <= time + TIME_TOLERANCE);
        i.checked_sub(1)
    }

    /// Whether every time of `other` is also on this grid.
    pub fn contains_all(&self, other: &TimeDiscretization) -> bool {
        other.times.iter().all(|&t| self.index_of(t).is_some())
    }
}
