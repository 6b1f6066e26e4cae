//! Parametric volatility of a Hull-White type short rate.
//!
//! ```text
//! dr(t) = (θ(t) - a(t) r(t)) dt + σ(t) dW(t)
//! ```
//!
//! σ and a are piecewise constant on the model's time grid. The same cloning
//! contract as the forward rate covariance models applies: an empty vector
//! returns the receiver, any other vector must have exactly the current
//! length.

use crate::error::{check_length, ModelError};
use pricer_core::types::TimeDiscretization;
use std::fmt::Debug;
use std::sync::Arc;

/// Volatility and mean reversion of a short rate model.
pub trait ShortRateVolatilityModel: Debug + Send + Sync {
    /// Time grid on which the functions are piecewise constant.
    fn time_discretization(&self) -> &TimeDiscretization;

    /// σ on the interval starting at `time_index`.
    fn volatility(&self, time_index: usize) -> Result<f64, ModelError>;

    /// a on the interval starting at `time_index`.
    fn mean_reversion(&self, time_index: usize) -> Result<f64, ModelError>;

    /// Whether this model contributes its parameters.
    fn is_calibrateable(&self) -> bool;

    /// Parameter vector, zero-length if not calibrateable.
    fn parameters(&self) -> Vec<f64>;

    /// Clone with a new parameter vector; an empty slice returns the receiver.
    fn with_modified_parameters(
        self: Arc<Self>,
        parameters: &[f64],
    ) -> Result<Arc<dyn ShortRateVolatilityModel>, ModelError>;

    /// Variance of r(t_k) given r(0):
    ///
    /// ```text
    /// V_{j+1} = V_j exp(-2 a_j Δ_j) + σ_j² (1 - exp(-2 a_j Δ_j)) / (2 a_j)
    /// ```
    fn short_rate_variance(&self, time_index: usize) -> Result<f64, ModelError> {
        let times = self.time_discretization();
        if time_index >= times.len() {
            return Err(ModelError::index_out_of_range("time", time_index, times.len()));
        }
        let mut variance = 0.0;
        for j in 0..time_index {
            let dt = times.step(j);
            let a = self.mean_reversion(j)?;
            let sigma = self.volatility(j)?;
            let decay = (-2.0 * a * dt).exp();
            let accrued = if (a * dt).abs() < 1e-10 {
                sigma * sigma * dt
            } else {
                sigma * sigma * (1.0 - decay) / (2.0 * a)
            };
            variance = variance * decay + accrued;
        }
        Ok(variance)
    }
}

/// Piecewise constant σ and a, one value per interval of the time grid.
///
/// Parameter vector: volatilities, then mean reversions.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use pricer_core::types::TimeDiscretization;
/// use pricer_models::models::rates::{
///     PiecewiseConstantShortRateVolatility, ShortRateVolatilityModel,
/// };
///
/// let times = TimeDiscretization::uniform(0.0, 2, 1.0).unwrap();
/// let model = Arc::new(
///     PiecewiseConstantShortRateVolatility::new(times, vec![0.01, 0.012], vec![0.05, 0.05], true)
///         .unwrap(),
/// );
/// assert_eq!(model.parameters(), vec![0.01, 0.012, 0.05, 0.05]);
///
/// let modified = model.with_modified_parameters(&[0.02, 0.02, 0.1, 0.1]).unwrap();
/// assert_eq!(modified.volatility(1).unwrap(), 0.02);
/// ```
#[derive(Debug, Clone)]
pub struct PiecewiseConstantShortRateVolatility {
    time_discretization: TimeDiscretization,
    volatilities: Vec<f64>,
    mean_reversions: Vec<f64>,
    calibrateable: bool,
}

impl PiecewiseConstantShortRateVolatility {
    /// Create with one volatility and one mean reversion per grid interval.
    pub fn new(
        time_discretization: TimeDiscretization,
        volatilities: Vec<f64>,
        mean_reversions: Vec<f64>,
        calibrateable: bool,
    ) -> Result<Self, ModelError> {
        let intervals = time_discretization.number_of_steps();
        check_length(intervals, &volatilities)?;
        check_length(intervals, &mean_reversions)?;
        Ok(Self {
            time_discretization,
            volatilities,
            mean_reversions,
            calibrateable,
        })
    }

    fn value(values: &[f64], time_index: usize) -> Result<f64, ModelError> {
        values
            .get(time_index)
            .copied()
            .ok_or_else(|| ModelError::index_out_of_range("time", time_index, values.len()))
    }
}

impl ShortRateVolatilityModel for PiecewiseConstantShortRateVolatility {
    fn time_discretization(&self) -> &TimeDiscretization {
        &self.time_discretization
    }

    fn volatility(&self, time_index: usize) -> Result<f64, ModelError> {
        Self::value(&self.volatilities, time_index)
    }

    fn mean_reversion(&self, time_index: usize) -> Result<f64, ModelError> {
        Self::value(&self.mean_reversions, time_index)
    }

    fn is_calibrateable(&self) -> bool {
        self.calibrateable
    }

    fn parameters(&self) -> Vec<f64> {
        if !self.calibrateable {
            return Vec::new();
        }
        let mut parameters = self.volatilities.clone();
        parameters.extend_from_slice(&self.mean_reversions);
        parameters
    }

    fn with_modified_parameters(
        self: Arc<Self>,
        parameters: &[f64],
    ) -> Result<Arc<dyn ShortRateVolatilityModel>, ModelError> {
        if parameters.is_empty() {
            return Ok(self);
        }
        check_length(self.parameters().len(), parameters)?;
        let split = self.volatilities.len();
        Ok(Arc::new(Self::new(
            self.time_discretization.clone(),
            parameters[..split].to_vec(),
            parameters[split..].to_vec(),
            self.calibrateable,
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn model(calibrateable: bool) -> Arc<PiecewiseConstantShortRateVolatility> {
        Arc::new(
            PiecewiseConstantShortRateVolatility::new(
                TimeDiscretization::uniform(0.0, 3, 1.0).unwrap(),
                vec![0.01, 0.01, 0.01],
                vec![0.1, 0.1, 0.1],
                calibrateable,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_length_checked() {
        assert!(PiecewiseConstantShortRateVolatility::new(
            TimeDiscretization::uniform(0.0, 3, 1.0).unwrap(),
            vec![0.01],
            vec![0.1, 0.1, 0.1],
            true,
        )
        .is_err());
    }

    #[test]
    fn test_constant_parameters_match_closed_form() {
        let m = model(true);
        let (a, sigma, t): (f64, f64, f64) = (0.1, 0.01, 3.0);
        let expected = sigma * sigma * (1.0 - (-2.0 * a * t).exp()) / (2.0 * a);
        assert_relative_eq!(m.short_rate_variance(3).unwrap(), expected, epsilon = 1e-15);
        assert_eq!(m.short_rate_variance(0).unwrap(), 0.0);
    }

    #[test]
    fn test_zero_mean_reversion_limit() {
        let m = PiecewiseConstantShortRateVolatility::new(
            TimeDiscretization::uniform(0.0, 2, 0.5).unwrap(),
            vec![0.02, 0.02],
            vec![0.0, 0.0],
            true,
        )
        .unwrap();
        assert_relative_eq!(m.short_rate_variance(2).unwrap(), 0.0004, epsilon = 1e-15);
    }

    #[test]
    fn test_round_trip_and_identity() {
        let m = model(true);
        let p = vec![0.02, 0.03, 0.04, 0.2, 0.3, 0.4];
        let modified = m.clone().with_modified_parameters(&p).unwrap();
        assert_eq!(modified.parameters(), p);
        assert_eq!(modified.mean_reversion(2).unwrap(), 0.4);

        let same = m.clone().with_modified_parameters(&[]).unwrap();
        let m_dyn: Arc<dyn ShortRateVolatilityModel> = m;
        assert!(Arc::ptr_eq(&m_dyn, &same));
    }

    #[test]
    fn test_not_calibrateable() {
        let m = model(false);
        assert!(m.parameters().is_empty());
        assert!(m.with_modified_parameters(&[0.1]).is_err());
    }
}
