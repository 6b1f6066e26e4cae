//! LIBOR market model description.
//!
//! The model is the data a forward rate simulation needs: the tenor
//! structure, the initial forward rates and a parametric covariance model.
//! Time stepping lives in the simulation layer.

use crate::error::ModelError;
use crate::models::covariance::ParametricModel;
use pricer_core::market_data::curves::YieldCurve;
use pricer_core::types::TimeDiscretization;
use std::sync::Arc;

/// A LIBOR market model: tenor, initial forwards and covariance model.
///
/// Cloning is cheap; all components are shared immutable data.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use pricer_core::market_data::curves::FlatCurve;
/// use pricer_core::types::TimeDiscretization;
/// use pricer_models::models::covariance::{
///     ExponentialDecayCorrelation, FlatVolatility, VolatilityCorrelationModel,
/// };
/// use pricer_models::models::rates::LiborMarketModel;
///
/// let covariance = Arc::new(
///     VolatilityCorrelationModel::new(
///         TimeDiscretization::uniform(0.0, 8, 0.5).unwrap(),
///         TimeDiscretization::uniform(0.0, 4, 1.0).unwrap(),
///         FlatVolatility::new(0.2),
///         ExponentialDecayCorrelation::new(0.1, 2).unwrap(),
///         true,
///     )
///     .unwrap(),
/// );
/// let model = LiborMarketModel::new(covariance, &FlatCurve::new(0.03)).unwrap();
///
/// assert_eq!(model.component_count(), 4);
/// assert!((model.initial_forwards()[0] - (0.03_f64.exp() - 1.0)).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct LiborMarketModel {
    initial_forwards: Arc<[f64]>,
    covariance_model: Arc<dyn ParametricModel>,
}

impl LiborMarketModel {
    /// Build from a covariance model and an initial yield curve.
    ///
    /// Initial forwards are the simply compounded forwards of the curve over
    /// each tenor period.
    ///
    /// # Errors
    ///
    /// - `ModelError::InvalidDiscretization` if the tenor does not start at zero
    /// - `ModelError::MarketData` if the curve cannot be evaluated
    pub fn new(
        covariance_model: Arc<dyn ParametricModel>,
        curve: &impl YieldCurve<f64>,
    ) -> Result<Self, ModelError> {
        let tenor = covariance_model.tenor_discretization().times();
        let forwards = tenor
            .windows(2)
            .map(|w| curve.simple_forward_rate(w[0], w[1]))
            .collect::<Result<Vec<f64>, _>>()?;
        Self::from_forwards(covariance_model, forwards)
    }

    /// Build from explicit initial forwards, one per tenor period.
    pub fn from_forwards(
        covariance_model: Arc<dyn ParametricModel>,
        forwards: Vec<f64>,
    ) -> Result<Self, ModelError> {
        let tenor = covariance_model.tenor_discretization();
        if tenor.first() != 0.0 {
            return Err(ModelError::invalid_discretization(format!(
                "tenor must start at 0, starts at {}",
                tenor.first()
            )));
        }
        if forwards.len() != tenor.number_of_steps() {
            return Err(ModelError::ParameterLengthMismatch {
                expected: tenor.number_of_steps(),
                got: forwards.len(),
            });
        }
        if let Some(&bad) = forwards.iter().find(|f| !f.is_finite()) {
            return Err(ModelError::invalid_parameter(
                "initial forward",
                bad,
                "must be finite",
            ));
        }
        Ok(Self {
            initial_forwards: forwards.into(),
            covariance_model,
        })
    }

    /// Tenor dates.
    pub fn tenor_discretization(&self) -> &TimeDiscretization {
        self.covariance_model.tenor_discretization()
    }

    /// Simulation times of the covariance model.
    pub fn time_discretization(&self) -> &TimeDiscretization {
        self.covariance_model.time_discretization()
    }

    /// Number of forward rates.
    pub fn component_count(&self) -> usize {
        self.initial_forwards.len()
    }

    /// Initial forward rates.
    pub fn initial_forwards(&self) -> &[f64] {
        &self.initial_forwards
    }

    /// The covariance model.
    pub fn covariance_model(&self) -> &Arc<dyn ParametricModel> {
        &self.covariance_model
    }

    /// Same forwards with another covariance model on the same tenor.
    pub fn with_covariance_model(
        &self,
        covariance_model: Arc<dyn ParametricModel>,
    ) -> Result<Self, ModelError> {
        if covariance_model.tenor_discretization() != self.tenor_discretization() {
            return Err(ModelError::invalid_discretization(
                "covariance model tenor differs from the model tenor",
            ));
        }
        Ok(Self {
            initial_forwards: self.initial_forwards.clone(),
            covariance_model,
        })
    }

    /// Parameters of the covariance model.
    pub fn parameters(&self) -> Vec<f64> {
        self.covariance_model.parameters()
    }

    /// Same model with re-parameterised covariance.
    pub fn with_modified_parameters(&self, parameters: &[f64]) -> Result<Self, ModelError> {
        let covariance_model = self
            .covariance_model
            .clone()
            .with_modified_parameters(parameters)?;
        Ok(Self {
            initial_forwards: self.initial_forwards.clone(),
            covariance_model,
        })
    }
}
