//! Generic decorator node.
//!
//! [`Decorated`] wraps an inner [`ParametricModel`] and applies a
//! [`Decoration`] strategy to its factor loadings. All parameter splitting
//! happens here, once, for every strategy.

use super::traits::{check_indices, FactorLoadingModel, ParametricModel};
use crate::error::{check_length, ModelError};
use pricer_core::traits::StochasticDriver;
use pricer_core::types::{RandomVariable, TimeDiscretization};
use std::fmt::Debug;
use std::sync::Arc;

/// Where a factor loading is being evaluated.
#[derive(Debug, Clone, Copy)]
pub struct LoadingContext<'a> {
    /// Simulation time index.
    pub time_index: usize,
    /// Simulation time.
    pub time: f64,
    /// Forward rate component.
    pub component: usize,
    /// Fixing date of the component.
    pub fixing: f64,
    /// Current forward rates of all components, if supplied.
    pub realisation: Option<&'a [RandomVariable]>,
}

impl<'a> LoadingContext<'a> {
    /// Current forward rate of this context's component, if a realisation was supplied.
    pub fn forward(&self) -> Option<&'a RandomVariable> {
        self.realisation.and_then(|r| r.get(self.component))
    }
}

/// A transformation of an inner model's factor loadings.
pub trait Decoration: Debug + Clone + Send + Sync + 'static {
    /// Short name used in diagnostics.
    const NAME: &'static str;

    /// Own parameters, in a fixed order.
    fn parameters(&self) -> Vec<f64>;

    /// A copy with new parameters; `parameters` has exactly the current length.
    fn with_parameters(&self, parameters: &[f64]) -> Result<Self, ModelError>;

    /// Transform the inner loading.
    fn decorate(
        &self,
        context: &LoadingContext<'_>,
        loading: Vec<RandomVariable>,
    ) -> Result<Vec<RandomVariable>, ModelError>;

    /// Check the decoration can wrap `inner`.
    fn check(&self, _inner: &dyn ParametricModel) -> Result<(), ModelError> {
        Ok(())
    }

    /// Driver the decoration draws its own randomness from, if any.
    fn driver(&self) -> Option<&Arc<dyn StochasticDriver>> {
        None
    }
}

/// A parametric node wrapping one inner model with a decoration strategy.
///
/// Parameter vector: the inner model's parameters, then the decoration's
/// own (only when calibrateable).
#[derive(Debug, Clone)]
pub struct Decorated<D: Decoration> {
    inner: Arc<dyn ParametricModel>,
    decoration: D,
    calibrateable: bool,
}

impl<D: Decoration> Decorated<D> {
    /// Wrap `inner`.
    ///
    /// # Errors
    ///
    /// - Errors from the decoration's own compatibility check
    /// - `ModelError::IncompatibleDriver` if the decoration and the inner
    ///   model draw from different driver instances
    pub fn new(
        inner: Arc<dyn ParametricModel>,
        decoration: D,
        calibrateable: bool,
    ) -> Result<Self, ModelError> {
        decoration.check(inner.as_ref())?;
        if let (Some(own), Some(nested)) = (decoration.driver(), inner.embedded_driver()) {
            if !Arc::ptr_eq(own, nested) {
                return Err(ModelError::incompatible_driver(format!(
                    "{} decoration and its inner model use different drivers",
                    D::NAME
                )));
            }
        }
        Ok(Self {
            inner,
            decoration,
            calibrateable,
        })
    }

    /// The wrapped model.
    pub fn inner(&self) -> &Arc<dyn ParametricModel> {
        &self.inner
    }

    /// The decoration strategy.
    pub fn decoration(&self) -> &D {
        &self.decoration
    }

    /// Name of the decoration.
    pub fn name(&self) -> &'static str {
        D::NAME
    }
}

impl<D: Decoration> FactorLoadingModel for Decorated<D> {
    fn time_discretization(&self) -> &TimeDiscretization {
        self.inner.time_discretization()
    }

    fn tenor_discretization(&self) -> &TimeDiscretization {
        self.inner.tenor_discretization()
    }

    fn factor_count(&self) -> usize {
        self.inner.factor_count()
    }

    fn component_count(&self) -> usize {
        self.inner.component_count()
    }

    fn embedded_driver(&self) -> Option<&Arc<dyn StochasticDriver>> {
        self.decoration
            .driver()
            .or_else(|| self.inner.embedded_driver())
    }

    fn factor_loading(
        &self,
        time_index: usize,
        component: usize,
        realisation: Option<&[RandomVariable]>,
    ) -> Result<Vec<RandomVariable>, ModelError> {
        check_indices(self, time_index, component)?;
        let loading = self.inner.factor_loading(time_index, component, realisation)?;
        let context = LoadingContext {
            time_index,
            time: self.time_discretization().times()[time_index],
            component,
            fixing: self.tenor_discretization().times()[component],
            realisation,
        };
        self.decoration.decorate(&context, loading)
    }
}

impl<D: Decoration> ParametricModel for Decorated<D> {
    fn is_calibrateable(&self) -> bool {
        self.calibrateable
    }

    fn parameters(&self) -> Vec<f64> {
        let mut parameters = self.inner.parameters();
        if self.calibrateable {
            parameters.extend(self.decoration.parameters());
        }
        parameters
    }

    fn with_modified_parameters(
        self: Arc<Self>,
        parameters: &[f64],
    ) -> Result<Arc<dyn ParametricModel>, ModelError> {
        if parameters.is_empty() {
            return Ok(self);
        }
        check_length(self.parameter_count(), parameters)?;

        let (inner, decoration) = if self.calibrateable {
            // Recomputed on every call from the inner model's own vector.
            let split = self.inner.parameter_count();
            let inner = self
                .inner
                .clone()
                .with_modified_parameters(&parameters[..split])?;
            (inner, self.decoration.with_parameters(&parameters[split..])?)
        } else {
            let inner = self.inner.clone().with_modified_parameters(parameters)?;
            (inner, self.decoration.clone())
        };

        Ok(Arc::new(Self::new(inner, decoration, self.calibrateable)?))
    }

    fn deep_clone(&self) -> Arc<dyn ParametricModel> {
        Arc::new(Self {
            inner: self.inner.deep_clone(),
            decoration: self.decoration.clone(),
            calibrateable: self.calibrateable,
        })
    }
}
