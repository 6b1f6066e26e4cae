//! Structured error types for the numeric foundation.
//!
//! This module provides:
//! - `SolverError`: Errors from the least-squares solver
//! - `DiscretizationError`: Errors from building time grids

use std::fmt;
use thiserror::Error;

/// Least-squares solver errors.
///
/// # Examples
/// ```
/// use pricer_core::types::SolverError;
///
/// let err = SolverError::MaxIterationsExceeded { iterations: 100 };
/// assert!(format!("{}", err).contains("100 iterations"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverError {
    /// Solver failed to converge within maximum iterations.
    #[error("Failed to converge after {iterations} iterations")]
    MaxIterationsExceeded {
        /// Number of iterations attempted
        iterations: usize,
    },

    /// The problem has no free parameters.
    #[error("Least-squares problem has no parameters")]
    EmptyProblem,

    /// Bounds or step vectors do not match the parameter count.
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which vector had the wrong length
        what: &'static str,
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// The objective returned a different number of residuals than before.
    #[error("Residual count changed from {expected} to {actual}")]
    ResidualCountChanged {
        /// Residual count of the first evaluation
        expected: usize,
        /// Residual count of the offending evaluation
        actual: usize,
    },

    /// Invalid solver configuration (non-positive step, inverted bounds, ...).
    #[error("Invalid solver configuration: {0}")]
    InvalidConfiguration(String),

    /// Numerical instability during computation.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}

impl SolverError {
    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what,
            expected,
            actual,
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

/// Errors raised while building a [`TimeDiscretization`](super::TimeDiscretization).
#[derive(Debug, Clone, PartialEq)]
pub enum DiscretizationError {
    /// The grid has no points.
    Empty,

    /// Times are not strictly increasing at the given index.
    NotIncreasing {
        /// Index of the offending time
        index: usize,
        /// Previous time
        previous: f64,
        /// Offending time
        current: f64,
    },

    /// A time is NaN or infinite.
    NonFinite {
        /// Index of the offending time
        index: usize,
    },

    /// Uniform grid step is not strictly positive.
    InvalidStep {
        /// Offending step
        step: f64,
    },
}

impl fmt::Display for DiscretizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscretizationError::Empty => write!(f, "Time discretisation has no points"),
            DiscretizationError::NotIncreasing {
                index,
                previous,
                current,
            } => write!(
                f,
                "Times not strictly increasing at index {}: {} then {}",
                index, previous, current
            ),
            DiscretizationError::NonFinite { index } => {
                write!(f, "Non-finite time at index {}", index)
            }
            DiscretizationError::InvalidStep { step } => {
                write!(f, "Uniform step must be positive, got {}", step)
            }
        }
    }
}

impl std::error::Error for DiscretizationError {}
