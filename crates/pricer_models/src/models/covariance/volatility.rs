//! Leaf volatility models.
//!
//! A volatility model maps (time, component) to an instantaneous volatility.
//! It is combined with a correlation model by
//! [`VolatilityCorrelationModel`](super::VolatilityCorrelationModel).

use crate::error::{check_length, ModelError};
use pricer_core::types::TimeDiscretization;
use std::fmt::Debug;

/// Instantaneous volatility of each forward rate component.
pub trait VolatilityModel: Debug + Clone + Send + Sync + 'static {
    /// Own parameters, in a fixed order.
    fn parameters(&self) -> Vec<f64>;

    /// A copy with new parameters; `parameters` has exactly the current length.
    fn with_parameters(&self, parameters: &[f64]) -> Result<Self, ModelError>;

    /// Volatility of `component` (fixing at `fixing`) at time `time`.
    fn volatility(&self, time: f64, component: usize, fixing: f64) -> f64;

    /// Check the model is usable on the given grids.
    fn check(&self, _tenor: &TimeDiscretization) -> Result<(), ModelError> {
        Ok(())
    }
}

/// Constant volatility for every component and time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatVolatility {
    sigma: f64,
}

impl FlatVolatility {
    /// Create a flat volatility.
    pub fn new(sigma: f64) -> Self {
        Self { sigma }
    }

    /// The constant volatility.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl VolatilityModel for FlatVolatility {
    fn parameters(&self) -> Vec<f64> {
        vec![self.sigma]
    }

    fn with_parameters(&self, parameters: &[f64]) -> Result<Self, ModelError> {
        check_length(1, parameters)?;
        Ok(Self::new(parameters[0]))
    }

    fn volatility(&self, _time: f64, _component: usize, _fixing: f64) -> f64 {
        self.sigma
    }
}

/// The abcd volatility function of the time to fixing τ = T_i - t.
///
/// ```text
/// σ_i(t) = (a + b τ) exp(-c τ) + d
/// ```
///
/// # Example
///
/// ```
/// use pricer_models::models::covariance::{AbcdVolatility, VolatilityModel};
///
/// let vol = AbcdVolatility::new(0.1, 0.2, 0.5, 0.05);
/// // At the fixing date only a + d remains.
/// assert!((vol.volatility(2.0, 3, 2.0) - 0.15).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbcdVolatility {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
}

impl AbcdVolatility {
    /// Create an abcd volatility.
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }
}

impl VolatilityModel for AbcdVolatility {
    fn parameters(&self) -> Vec<f64> {
        vec![self.a, self.b, self.c, self.d]
    }

    fn with_parameters(&self, parameters: &[f64]) -> Result<Self, ModelError> {
        check_length(4, parameters)?;
        Ok(Self::new(
            parameters[0],
            parameters[1],
            parameters[2],
            parameters[3],
        ))
    }

    fn volatility(&self, time: f64, _component: usize, fixing: f64) -> f64 {
        let tau = fixing - time;
        (self.a + self.b * tau) * (-self.c * tau).exp() + self.d
    }
}

/// One constant volatility per component.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseConstantVolatility {
    volatilities: Vec<f64>,
}

impl PiecewiseConstantVolatility {
    /// Create from one volatility per component.
    pub fn new(volatilities: Vec<f64>) -> Self {
        Self { volatilities }
    }
}

impl VolatilityModel for PiecewiseConstantVolatility {
    fn parameters(&self) -> Vec<f64> {
        self.volatilities.clone()
    }

    fn with_parameters(&self, parameters: &[f64]) -> Result<Self, ModelError> {
        check_length(self.volatilities.len(), parameters)?;
        Ok(Self::new(parameters.to_vec()))
    }

    fn volatility(&self, _time: f64, component: usize, _fixing: f64) -> f64 {
        self.volatilities.get(component).copied().unwrap_or(0.0)
    }

    fn check(&self, tenor: &TimeDiscretization) -> Result<(), ModelError> {
        let components = tenor.number_of_steps();
        if self.volatilities.len() != components {
            return Err(ModelError::ParameterLengthMismatch {
                expected: components,
                got: self.volatilities.len(),
            });
        }
        Ok(())
    }
}
