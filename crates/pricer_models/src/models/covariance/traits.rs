//! Factor loading and parametric model contracts.

use crate::error::ModelError;
use pricer_core::traits::StochasticDriver;
use pricer_core::types::{RandomVariable, TimeDiscretization};
use std::fmt::Debug;
use std::sync::Arc;

/// Factor loadings of a forward rate curve.
///
/// Component `i` is the forward rate fixing at `tenor[i]` and paying at
/// `tenor[i + 1]`, so a tenor with `n + 1` dates has `n` components.
///
/// `factor_loading` is a pure function of its arguments. `realisation`
/// carries the current forward rates of every component on every path; it is
/// `None` when no state dependent (local volatility) adjustment is requested,
/// in which case state dependent decorators pass the inner loading through.
pub trait FactorLoadingModel: Debug + Send + Sync {
    /// Simulation time grid on which loadings are defined.
    fn time_discretization(&self) -> &TimeDiscretization;

    /// Tenor dates of the forward rate curve.
    fn tenor_discretization(&self) -> &TimeDiscretization;

    /// Number of independent factors.
    fn factor_count(&self) -> usize;

    /// Number of forward rate components.
    fn component_count(&self) -> usize {
        self.tenor_discretization().number_of_steps()
    }

    /// Factor loading vector of `component` at simulation time index `time_index`.
    ///
    /// # Errors
    ///
    /// `ModelError::IndexOutOfRange` for an index outside the model's grids.
    fn factor_loading(
        &self,
        time_index: usize,
        component: usize,
        realisation: Option<&[RandomVariable]>,
    ) -> Result<Vec<RandomVariable>, ModelError>;

    /// Stochastic driver the loadings themselves are built from, if any.
    ///
    /// A simulation of a model that reports a driver must be run on that
    /// same driver instance, otherwise the loadings and the forward rate
    /// increments live on different path sets.
    fn embedded_driver(&self) -> Option<&Arc<dyn StochasticDriver>> {
        None
    }

    /// Instantaneous covariance of two components, the inner product of their loadings.
    fn covariance(
        &self,
        time_index: usize,
        component1: usize,
        component2: usize,
        realisation: Option<&[RandomVariable]>,
    ) -> Result<RandomVariable, ModelError> {
        let f1 = self.factor_loading(time_index, component1, realisation)?;
        let f2 = self.factor_loading(time_index, component2, realisation)?;
        Ok(f1
            .iter()
            .zip(&f2)
            .fold(RandomVariable::deterministic(0.0), |acc, (a, b)| acc + a * b))
    }
}

/// A factor loading model with a modifiable parameter vector.
///
/// Nodes are immutable. Re-parameterisation builds a new node tree and never
/// touches the receiver, so clones can be used concurrently by different
/// optimiser trial points.
///
/// # Parameter layout
///
/// A composed model's vector is the inner model's parameters followed by the
/// node's own. A node with `is_calibrateable() == false` contributes nothing
/// and forwards the whole vector to its inner model.
pub trait ParametricModel: FactorLoadingModel {
    /// Whether this node contributes its own parameters.
    fn is_calibrateable(&self) -> bool;

    /// Parameter vector of the whole subtree, zero-length if nothing is calibrateable.
    fn parameters(&self) -> Vec<f64>;

    /// Length of [`parameters`](Self::parameters).
    fn parameter_count(&self) -> usize {
        self.parameters().len()
    }

    /// Clone the subtree with a new parameter vector.
    ///
    /// An empty `parameters` slice returns the receiver itself.
    ///
    /// # Errors
    ///
    /// - `ModelError::ParameterLengthMismatch` if the length differs from `parameter_count()`
    /// - `ModelError::InvalidParameter` if a value is outside its domain
    fn with_modified_parameters(
        self: Arc<Self>,
        parameters: &[f64],
    ) -> Result<Arc<dyn ParametricModel>, ModelError>;

    /// Structural copy with identical parameters.
    fn deep_clone(&self) -> Arc<dyn ParametricModel>;
}

/// Validate time and component indices against a model's grids.
pub(crate) fn check_indices(
    model: &(impl FactorLoadingModel + ?Sized),
    time_index: usize,
    component: usize,
) -> Result<(), ModelError> {
    let times = model.time_discretization().len();
    if time_index >= times {
        return Err(ModelError::index_out_of_range("time", time_index, times));
    }
    let components = model.component_count();
    if component >= components {
        return Err(ModelError::index_out_of_range("component", component, components));
    }
    Ok(())
}
