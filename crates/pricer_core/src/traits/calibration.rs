//! Parameter bounds for constrained least-squares problems.
//!
//! # Example
//!
//! ```
//! use pricer_core::traits::calibration::{BoxConstraints, ParameterBounds};
//!
//! let bounds = BoxConstraints::new(vec![
//!     ParameterBounds::non_negative(),
//!     ParameterBounds::unbounded(),
//! ]);
//!
//! let mut x = vec![-0.5, -0.5];
//! bounds.project(&mut x);
//! assert_eq!(x, vec![0.0, -0.5]);
//! ```

use crate::types::SolverError;

/// Bounds for a single parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterBounds {
    /// Minimum allowed value.
    pub min: f64,
    /// Maximum allowed value.
    pub max: f64,
}

impl ParameterBounds {
    /// Create new bounds.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Create bounds for a non-negative parameter.
    pub fn non_negative() -> Self {
        Self {
            min: 0.0,
            max: f64::INFINITY,
        }
    }

    /// Create bounds for a parameter in [-1, 1] (correlations).
    pub fn correlation() -> Self {
        Self { min: -1.0, max: 1.0 }
    }

    /// Create unbounded.
    pub fn unbounded() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    /// Check if a value is within bounds.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp a value to bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Whether the bounds describe a non-empty interval.
    pub fn is_valid(&self) -> bool {
        !self.min.is_nan() && !self.max.is_nan() && self.min <= self.max
    }
}

impl Default for ParameterBounds {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Per-parameter bounds for a whole parameter vector.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoxConstraints {
    bounds: Vec<ParameterBounds>,
}

impl BoxConstraints {
    /// Wrap explicit per-parameter bounds.
    pub fn new(bounds: Vec<ParameterBounds>) -> Self {
        Self { bounds }
    }

    /// Unbounded constraints for `n` parameters.
    pub fn unbounded(n: usize) -> Self {
        Self {
            bounds: vec![ParameterBounds::unbounded(); n],
        }
    }

    /// Build from optional lower and upper bound vectors of length `n`.
    ///
    /// A missing vector means unbounded on that side.
    ///
    /// # Errors
    ///
    /// - `SolverError::DimensionMismatch` if a vector's length differs from `n`
    /// - `SolverError::InvalidConfiguration` if some lower bound exceeds its upper bound
    pub fn from_vectors(
        n: usize,
        lower: Option<&[f64]>,
        upper: Option<&[f64]>,
    ) -> Result<Self, SolverError> {
        if let Some(lower) = lower {
            if lower.len() != n {
                return Err(SolverError::dimension_mismatch("lower bounds", n, lower.len()));
            }
        }
        if let Some(upper) = upper {
            if upper.len() != n {
                return Err(SolverError::dimension_mismatch("upper bounds", n, upper.len()));
            }
        }

        let bounds = (0..n)
            .map(|i| {
                ParameterBounds::new(
                    lower.map_or(f64::NEG_INFINITY, |l| l[i]),
                    upper.map_or(f64::INFINITY, |u| u[i]),
                )
            })
            .collect();
        let constraints = Self { bounds };
        constraints.validate()?;
        Ok(constraints)
    }

    /// Number of parameters covered.
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// Whether no parameters are covered.
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Bounds of parameter `i`.
    pub fn get(&self, i: usize) -> Option<&ParameterBounds> {
        self.bounds.get(i)
    }

    /// Check every interval is non-empty.
    pub fn validate(&self) -> Result<(), SolverError> {
        match self.bounds.iter().position(|b| !b.is_valid()) {
            Some(i) => Err(SolverError::invalid_configuration(format!(
                "bounds of parameter {} are empty: [{}, {}]",
                i, self.bounds[i].min, self.bounds[i].max
            ))),
            None => Ok(()),
        }
    }

    /// Clamp every component of `x` into its interval.
    pub fn project(&self, x: &mut [f64]) {
        for (value, bounds) in x.iter_mut().zip(&self.bounds) {
            *value = bounds.clamp(*value);
        }
    }

    /// Whether every component of `x` lies inside its interval.
    pub fn contains(&self, x: &[f64]) -> bool {
        x.iter().zip(&self.bounds).all(|(v, b)| b.contains(*v))
    }
}
