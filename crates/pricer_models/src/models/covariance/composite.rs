//! Covariance model built from a volatility model and a correlation model.

use super::correlation::CorrelationModel;
use super::traits::{check_indices, FactorLoadingModel, ParametricModel};
use super::volatility::VolatilityModel;
use crate::error::{check_length, ModelError};
use pricer_core::types::{RandomVariable, TimeDiscretization};
use std::sync::Arc;

/// Factor loading `σ_i(t) · f_ik` from a volatility and a correlation model.
///
/// The parameter vector is the volatility parameters followed by the
/// correlation parameters. The factor matrix is computed once, at
/// construction.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use pricer_core::types::TimeDiscretization;
/// use pricer_models::models::covariance::{
///     ExponentialDecayCorrelation, FlatVolatility, ParametricModel, VolatilityCorrelationModel,
/// };
///
/// let times = TimeDiscretization::uniform(0.0, 8, 0.5).unwrap();
/// let tenor = TimeDiscretization::uniform(0.0, 4, 1.0).unwrap();
/// let model = Arc::new(
///     VolatilityCorrelationModel::new(
///         times,
///         tenor,
///         FlatVolatility::new(0.2),
///         ExponentialDecayCorrelation::new(0.1, 2).unwrap(),
///         true,
///     )
///     .unwrap(),
/// );
/// assert_eq!(model.parameters(), vec![0.2, 0.1]);
///
/// let modified = model.clone().with_modified_parameters(&[0.3, 0.05]).unwrap();
/// assert_eq!(modified.parameters(), vec![0.3, 0.05]);
/// assert_eq!(model.parameters(), vec![0.2, 0.1]);
/// ```
#[derive(Debug, Clone)]
pub struct VolatilityCorrelationModel<V: VolatilityModel, C: CorrelationModel> {
    time_discretization: TimeDiscretization,
    tenor_discretization: TimeDiscretization,
    volatility: V,
    correlation: C,
    factor_matrix: Arc<Vec<Vec<f64>>>,
    calibrateable: bool,
}

impl<V: VolatilityModel, C: CorrelationModel> VolatilityCorrelationModel<V, C> {
    /// Create the model and compute its factor matrix.
    ///
    /// # Errors
    ///
    /// - `ModelError::InvalidDiscretization` if the tenor has fewer than two dates
    /// - Errors from the volatility model's grid check or the factor reduction
    pub fn new(
        time_discretization: TimeDiscretization,
        tenor_discretization: TimeDiscretization,
        volatility: V,
        correlation: C,
        calibrateable: bool,
    ) -> Result<Self, ModelError> {
        if tenor_discretization.len() < 2 {
            return Err(ModelError::invalid_discretization(
                "tenor needs at least two dates",
            ));
        }
        volatility.check(&tenor_discretization)?;
        let factor_matrix = Arc::new(correlation.factor_matrix(&tenor_discretization)?);
        Ok(Self {
            time_discretization,
            tenor_discretization,
            volatility,
            correlation,
            factor_matrix,
            calibrateable,
        })
    }

    /// The volatility model.
    pub fn volatility(&self) -> &V {
        &self.volatility
    }

    /// The correlation model.
    pub fn correlation(&self) -> &C {
        &self.correlation
    }

    fn own_parameters(&self) -> Vec<f64> {
        let mut parameters = self.volatility.parameters();
        parameters.extend(self.correlation.parameters());
        parameters
    }
}

impl<V: VolatilityModel, C: CorrelationModel> FactorLoadingModel
    for VolatilityCorrelationModel<V, C>
{
    fn time_discretization(&self) -> &TimeDiscretization {
        &self.time_discretization
    }

    fn tenor_discretization(&self) -> &TimeDiscretization {
        &self.tenor_discretization
    }

    fn factor_count(&self) -> usize {
        self.factor_matrix.first().map_or(0, |row| row.len())
    }

    fn factor_loading(
        &self,
        time_index: usize,
        component: usize,
        _realisation: Option<&[RandomVariable]>,
    ) -> Result<Vec<RandomVariable>, ModelError> {
        check_indices(self, time_index, component)?;
        let time = self.time_discretization.times()[time_index];
        let fixing = self.tenor_discretization.times()[component];
        let sigma = self.volatility.volatility(time, component, fixing);
        Ok(self.factor_matrix[component]
            .iter()
            .map(|f| RandomVariable::constant(time, sigma * f))
            .collect())
    }
}

impl<V: VolatilityModel, C: CorrelationModel> ParametricModel
    for VolatilityCorrelationModel<V, C>
{
    fn is_calibrateable(&self) -> bool {
        self.calibrateable
    }

    fn parameters(&self) -> Vec<f64> {
        if self.calibrateable {
            self.own_parameters()
        } else {
            Vec::new()
        }
    }

    fn with_modified_parameters(
        self: Arc<Self>,
        parameters: &[f64],
    ) -> Result<Arc<dyn ParametricModel>, ModelError> {
        if parameters.is_empty() {
            return Ok(self);
        }
        check_length(self.parameter_count(), parameters)?;

        let split = self.volatility.parameters().len();
        let volatility = self.volatility.with_parameters(&parameters[..split])?;
        let correlation = self.correlation.with_parameters(&parameters[split..])?;
        Ok(Arc::new(Self::new(
            self.time_discretization.clone(),
            self.tenor_discretization.clone(),
            volatility,
            correlation,
            self.calibrateable,
        )?))
    }

    fn deep_clone(&self) -> Arc<dyn ParametricModel> {
        Arc::new(Self {
            factor_matrix: Arc::new(self.factor_matrix.as_ref().clone()),
            ..self.clone()
        })
    }
}
