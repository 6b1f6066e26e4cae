//! Deterministic and local volatility decorations.
//!
//! - [`Displaced`]: displaced diffusion, scales by `(L + d) / L`
//! - [`ExponentialDecay`]: damps loadings by `exp(-k (T_i - t))`
//! - [`Blended`]: blends lognormal and normal dynamics around an anchor forward
//!
//! The state dependent decorations divide by the simulated forward and
//! reject a realisation holding a forward of exactly zero.

use super::decorated::{Decoration, LoadingContext};
use super::{FactorLoadingModel, ParametricModel};
use crate::error::{check_length, ModelError};
use pricer_core::types::RandomVariable;

fn scale(loading: Vec<RandomVariable>, factor: &RandomVariable) -> Vec<RandomVariable> {
    loading.into_iter().map(|l| l * factor).collect()
}

fn check_nonzero(component: usize, forward: &RandomVariable) -> Result<(), ModelError> {
    match (0..forward.size()).find(|&path| forward.get(path) == 0.0) {
        Some(path) => Err(ModelError::ZeroForward { component, path }),
        None => Ok(()),
    }
}

/// Displaced diffusion: the loading becomes `λ (L + d) / L`.
///
/// Passes through when no realisation is supplied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Displaced {
    displacement: f64,
}

impl Displaced {
    /// Create with displacement `d`.
    pub fn new(displacement: f64) -> Self {
        Self { displacement }
    }
}

impl Decoration for Displaced {
    const NAME: &'static str = "displaced";

    fn parameters(&self) -> Vec<f64> {
        vec![self.displacement]
    }

    fn with_parameters(&self, parameters: &[f64]) -> Result<Self, ModelError> {
        check_length(1, parameters)?;
        Ok(Self::new(parameters[0]))
    }

    fn decorate(
        &self,
        context: &LoadingContext<'_>,
        loading: Vec<RandomVariable>,
    ) -> Result<Vec<RandomVariable>, ModelError> {
        match context.forward() {
            Some(forward) => {
                check_nonzero(context.component, forward)?;
                let d = self.displacement;
                let factor = forward.map(|l| (l + d) / l);
                Ok(scale(loading, &factor))
            }
            None => Ok(loading),
        }
    }
}

/// Exponential damping by time to fixing: `λ exp(-k max(T_i - t, 0))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialDecay {
    decay: f64,
}

impl ExponentialDecay {
    /// Create with decay `k`.
    pub fn new(decay: f64) -> Self {
        Self { decay }
    }
}

impl Decoration for ExponentialDecay {
    const NAME: &'static str = "exponential-decay";

    fn parameters(&self) -> Vec<f64> {
        vec![self.decay]
    }

    fn with_parameters(&self, parameters: &[f64]) -> Result<Self, ModelError> {
        check_length(1, parameters)?;
        Ok(Self::new(parameters[0]))
    }

    fn decorate(
        &self,
        context: &LoadingContext<'_>,
        loading: Vec<RandomVariable>,
    ) -> Result<Vec<RandomVariable>, ModelError> {
        let tau = (context.fixing - context.time).max(0.0);
        let factor = RandomVariable::deterministic((-self.decay * tau).exp());
        Ok(scale(loading, &factor))
    }
}

/// Blend of lognormal and normal dynamics.
///
/// The loading becomes `λ (b L̄_i + (1 - b) L_i) / L_i` where `L̄_i` is the
/// anchor (initial) forward of component `i`. Passes through when no
/// realisation is supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct Blended {
    blend: f64,
    anchors: Vec<f64>,
}

impl Blended {
    /// Create with blend `b` and one anchor forward per component.
    pub fn new(blend: f64, anchors: Vec<f64>) -> Self {
        Self { blend, anchors }
    }
}

impl Decoration for Blended {
    const NAME: &'static str = "blended";

    fn parameters(&self) -> Vec<f64> {
        vec![self.blend]
    }

    fn with_parameters(&self, parameters: &[f64]) -> Result<Self, ModelError> {
        check_length(1, parameters)?;
        Ok(Self::new(parameters[0], self.anchors.clone()))
    }

    fn decorate(
        &self,
        context: &LoadingContext<'_>,
        loading: Vec<RandomVariable>,
    ) -> Result<Vec<RandomVariable>, ModelError> {
        let Some(forward) = context.forward() else {
            return Ok(loading);
        };
        let anchor = self.anchors.get(context.component).copied().ok_or_else(|| {
            ModelError::index_out_of_range("anchor", context.component, self.anchors.len())
        })?;
        check_nonzero(context.component, forward)?;
        let b = self.blend;
        let factor = forward.map(|l| (b * anchor + (1.0 - b) * l) / l);
        Ok(scale(loading, &factor))
    }

    fn check(&self, inner: &dyn ParametricModel) -> Result<(), ModelError> {
        let components = inner.component_count();
        if self.anchors.len() != components {
            return Err(ModelError::ParameterLengthMismatch {
                expected: components,
                got: self.anchors.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::covariance::{
        Decorated, ExponentialDecayCorrelation, FactorLoadingModel, FlatVolatility,
        ParametricModel, VolatilityCorrelationModel,
    };
    use approx::assert_relative_eq;
    use pricer_core::types::TimeDiscretization;
    use std::sync::Arc;

    fn base(calibrateable: bool) -> Arc<dyn ParametricModel> {
        Arc::new(
            VolatilityCorrelationModel::new(
                TimeDiscretization::uniform(0.0, 4, 0.5).unwrap(),
                TimeDiscretization::uniform(0.0, 3, 1.0).unwrap(),
                FlatVolatility::new(0.2),
                ExponentialDecayCorrelation::new(0.0, 1).unwrap(),
                calibrateable,
            )
            .unwrap(),
        )
    }

    fn forwards() -> Vec<RandomVariable> {
        vec![
            RandomVariable::from_values(0.0, vec![0.02, 0.04]),
            RandomVariable::from_values(0.0, vec![0.03, 0.05]),
            RandomVariable::from_values(0.0, vec![0.01, 0.02]),
        ]
    }

    // ========================================
    // Decoration behaviour
    // ========================================

    #[test]
    fn test_displaced_scales_by_realisation() {
        let model = Decorated::new(base(true), Displaced::new(0.02), true).unwrap();
        let r = forwards();
        let loading = model.factor_loading(0, 0, Some(r.as_slice())).unwrap();
        assert_relative_eq!(loading[0].get(0), 0.2 * 2.0, epsilon = 1e-12);
        assert_relative_eq!(loading[0].get(1), 0.2 * 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_displaced_passes_through_without_realisation() {
        let model = Decorated::new(base(true), Displaced::new(0.02), true).unwrap();
        let loading = model.factor_loading(0, 0, None).unwrap();
        assert_relative_eq!(loading[0].get(0), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_exponential_decay() {
        let model = Decorated::new(base(true), ExponentialDecay::new(0.5), true).unwrap();
        // t = 0.5, fixing of component 2 is 2.0
        let loading = model.factor_loading(1, 2, None).unwrap();
        assert_relative_eq!(loading[0].get(0), 0.2 * (-0.75_f64).exp(), epsilon = 1e-12);
        // after fixing the damping is one
        let loading = model.factor_loading(4, 1, None).unwrap();
        assert_relative_eq!(loading[0].get(0), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_blended() {
        let anchors = vec![0.03, 0.03, 0.03];
        let model = Decorated::new(base(true), Blended::new(0.5, anchors), true).unwrap();
        let r = forwards();
        let loading = model.factor_loading(0, 2, Some(r.as_slice())).unwrap();
        // (0.5 * 0.03 + 0.5 * 0.01) / 0.01 = 2
        assert_relative_eq!(loading[0].get(0), 0.4, epsilon = 1e-12);
        assert_eq!(model.factor_loading(0, 2, None).unwrap()[0].get(0), 0.2);
    }

    #[test]
    fn test_zero_forward_rejected() {
        let mut r = forwards();
        r[1] = RandomVariable::from_values(0.0, vec![0.03, 0.0]);

        let displaced = Decorated::new(base(true), Displaced::new(0.02), true).unwrap();
        assert_eq!(
            displaced.factor_loading(0, 1, Some(r.as_slice())).unwrap_err(),
            ModelError::ZeroForward {
                component: 1,
                path: 1
            }
        );
        let blended =
            Decorated::new(base(true), Blended::new(0.5, vec![0.03; 3]), true).unwrap();
        assert!(matches!(
            blended.factor_loading(0, 1, Some(r.as_slice())),
            Err(ModelError::ZeroForward { .. })
        ));
        // other components are unaffected
        assert!(displaced.factor_loading(0, 0, Some(r.as_slice())).is_ok());
    }

    #[test]
    fn test_blended_anchor_count_checked() {
        let err = Decorated::new(base(true), Blended::new(0.5, vec![0.03]), true).unwrap_err();
        assert!(matches!(err, ModelError::ParameterLengthMismatch { .. }));
    }

    // ========================================
    // Parameter splitting
    // ========================================

    #[test]
    fn test_parameters_inner_first() {
        let inner: Arc<dyn ParametricModel> =
            Arc::new(Decorated::new(base(true), Displaced::new(0.01), true).unwrap());
        let outer = Arc::new(Decorated::new(inner, ExponentialDecay::new(0.3), true).unwrap());
        assert_eq!(outer.parameters(), vec![0.2, 0.0, 0.01, 0.3]);
    }

    #[test]
    fn test_outer_slice_change_keeps_inner_bitwise() {
        let inner: Arc<dyn ParametricModel> =
            Arc::new(Decorated::new(base(true), Displaced::new(0.01), true).unwrap());
        let outer = Arc::new(Decorated::new(inner.clone(), ExponentialDecay::new(0.3), true).unwrap());

        let mut p = outer.parameters();
        p[3] = 0.9;
        let modified = outer.clone().with_modified_parameters(&p).unwrap();

        let p_new = modified.parameters();
        assert_eq!(p_new[3], 0.9);
        for (a, b) in p_new[..3].iter().zip(inner.parameters()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
        // the original is untouched
        assert_eq!(outer.parameters()[3], 0.3);
    }

    #[test]
    fn test_non_calibrateable_decorator_forwards_everything() {
        let model = Arc::new(Decorated::new(base(true), ExponentialDecay::new(0.3), false).unwrap());
        assert_eq!(model.parameters(), vec![0.2, 0.0]);

        let modified = model.clone().with_modified_parameters(&[0.25, 0.1]).unwrap();
        assert_eq!(modified.parameters(), vec![0.25, 0.1]);

        // the decoration keeps its own value
        let loading = modified.factor_loading(0, 1, None).unwrap();
        assert_relative_eq!(loading[0].get(0), 0.25 * (-0.3_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_calibrateable_decorator_over_fixed_base() {
        let model = Arc::new(Decorated::new(base(false), ExponentialDecay::new(0.3), true).unwrap());
        assert_eq!(model.parameters(), vec![0.3]);
        let modified = model.with_modified_parameters(&[0.7]).unwrap();
        assert_eq!(modified.parameters(), vec![0.7]);
    }

    #[test]
    fn test_fully_fixed_tree_has_no_parameters() {
        let model = Arc::new(Decorated::new(base(false), Displaced::new(0.01), false).unwrap());
        assert!(model.parameters().is_empty());
        let same = model.clone().with_modified_parameters(&[]).unwrap();
        let model_dyn: Arc<dyn ParametricModel> = model;
        assert!(Arc::ptr_eq(&model_dyn, &same));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let model = Arc::new(Decorated::new(base(true), Displaced::new(0.01), true).unwrap());
        assert_eq!(
            model.with_modified_parameters(&[0.1, 0.2]).unwrap_err(),
            ModelError::ParameterLengthMismatch {
                expected: 3,
                got: 2
            }
        );
    }

    #[test]
    fn test_deep_clone() {
        let model = Decorated::new(base(true), Displaced::new(0.01), true).unwrap();
        let copy = model.deep_clone();
        let r = forwards();
        assert_eq!(copy.parameters(), model.parameters());
        assert_eq!(
            copy.factor_loading(2, 1, Some(r.as_slice())).unwrap(),
            model.factor_loading(2, 1, Some(r.as_slice())).unwrap()
        );
    }
}
