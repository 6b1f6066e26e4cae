//! Stochastic volatility scaling of factor loadings.
//!
//! The decoration drives a lognormal scaling process λ from two factors of
//! the shared stochastic driver:
//!
//! ```text
//! λ_0 = 1
//! λ_{j+1} = λ_j exp(-ν²Δt/2 + ν ΔB_j)
//! ΔB_j = ρ ΔW_{0,j} + sqrt(1 - ρ²) ΔW_{k,j}
//! ```
//!
//! and multiplies the inner loading at time index `j` by `λ_j`.
//!
//! The process is built lazily, on the first loading request, and cached in
//! the decoration instance. A re-parameterised decoration starts with an
//! empty cache.

use super::decorated::{Decoration, LoadingContext};
use super::{FactorLoadingModel, ParametricModel};
use crate::error::{check_length, ModelError};
use pricer_core::traits::StochasticDriver;
use pricer_core::types::RandomVariable;
use std::sync::{Arc, OnceLock};

/// Stochastic volatility decoration with parameters `(ν, ρ)`.
///
/// `factor_index` selects the driver factor used for the orthogonal part of
/// the scaling process; factor 0 supplies the correlated part. The
/// orthogonal factor must lie beyond the factors of the wrapped model, and a
/// simulation of the decorated model must run on the decoration's driver.
#[derive(Debug, Clone)]
pub struct StochasticVolatility {
    nu: f64,
    rho: f64,
    factor_index: usize,
    driver: Arc<dyn StochasticDriver>,
    process: OnceLock<Arc<[RandomVariable]>>,
}

impl StochasticVolatility {
    /// Create the decoration.
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` if `nu` is not finite or `rho` is outside [-1, 1]
    /// - `IndexOutOfRange` if `factor_index` is not a factor of `driver`
    pub fn new(
        nu: f64,
        rho: f64,
        factor_index: usize,
        driver: Arc<dyn StochasticDriver>,
    ) -> Result<Self, ModelError> {
        if !nu.is_finite() {
            return Err(ModelError::invalid_parameter("nu", nu, "must be finite"));
        }
        if !(-1.0..=1.0).contains(&rho) {
            return Err(ModelError::invalid_parameter("rho", rho, "must lie in [-1, 1]"));
        }
        if factor_index >= driver.factor_count() {
            return Err(ModelError::index_out_of_range(
                "driver factor",
                factor_index,
                driver.factor_count(),
            ));
        }
        Ok(Self {
            nu,
            rho,
            factor_index,
            driver,
            process: OnceLock::new(),
        })
    }

    /// Whether the scaling process has been built.
    pub fn is_built(&self) -> bool {
        self.process.get().is_some()
    }

    /// The scaling process at every time index of the driver's grid.
    pub fn process(&self) -> &[RandomVariable] {
        self.process.get_or_init(|| self.build())
    }

    fn build(&self) -> Arc<[RandomVariable]> {
        let times = self.driver.time_discretization();
        let steps = times.number_of_steps();
        let orthogonal = (1.0 - self.rho * self.rho).max(0.0).sqrt();

        let mut process = Vec::with_capacity(steps + 1);
        let mut lambda = self.driver.random_variable_for_constant(1.0);
        process.push(lambda.clone());

        for j in 0..steps {
            let dt = times.step(j);
            let (Some(dw0), Some(dwk)) = (
                self.driver.increment(j, 0),
                self.driver.increment(j, self.factor_index),
            ) else {
                break;
            };
            let db = dw0 * self.rho + dwk * orthogonal;
            let growth = (db * self.nu - 0.5 * self.nu * self.nu * dt).exp();
            lambda = (&lambda * &growth).with_filtration_time(times.times()[j + 1]);
            process.push(lambda.clone());
        }

        process.into()
    }
}

impl Decoration for StochasticVolatility {
    const NAME: &'static str = "stochastic-volatility";

    fn parameters(&self) -> Vec<f64> {
        vec![self.nu, self.rho]
    }

    fn with_parameters(&self, parameters: &[f64]) -> Result<Self, ModelError> {
        check_length(2, parameters)?;
        Self::new(
            parameters[0],
            parameters[1],
            self.factor_index,
            self.driver.clone(),
        )
    }

    fn decorate(
        &self,
        context: &LoadingContext<'_>,
        loading: Vec<RandomVariable>,
    ) -> Result<Vec<RandomVariable>, ModelError> {
        let process = self.process();
        let lambda = process.get(context.time_index).ok_or_else(|| {
            ModelError::index_out_of_range("time", context.time_index, process.len())
        })?;
        Ok(loading.into_iter().map(|l| l * lambda).collect())
    }

    fn check(&self, inner: &dyn ParametricModel) -> Result<(), ModelError> {
        if self.driver.time_discretization() != inner.time_discretization() {
            return Err(ModelError::invalid_discretization(
                "stochastic volatility driver must share the model's time grid",
            ));
        }
        if self.factor_index < inner.factor_count() {
            return Err(ModelError::incompatible_driver(format!(
                "orthogonal factor {} is one of the {} factors of the inner model",
                self.factor_index,
                inner.factor_count()
            )));
        }
        Ok(())
    }

    fn driver(&self) -> Option<&Arc<dyn StochasticDriver>> {
        Some(&self.driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::covariance::{
        Decorated, ExponentialDecayCorrelation, FactorLoadingModel, FlatVolatility,
        VolatilityCorrelationModel,
    };
    use approx::assert_relative_eq;
    use pricer_core::types::TimeDiscretization;

    /// Driver with fixed increments: factor `f` moves by `(f + 1) * 0.1` on path 0
    /// and by the opposite on path 1.
    #[derive(Debug)]
    struct FixedDriver {
        times: TimeDiscretization,
        increments: Vec<Vec<RandomVariable>>,
    }

    impl FixedDriver {
        fn new(times: TimeDiscretization, factors: usize) -> Self {
            let increments = (0..times.number_of_steps())
                .map(|_| {
                    (0..factors)
                        .map(|f| {
                            let x = (f + 1) as f64 * 0.1;
                            RandomVariable::from_values(0.0, vec![x, -x])
                        })
                        .collect()
                })
                .collect();
            Self { times, increments }
        }
    }

    impl StochasticDriver for FixedDriver {
        fn time_discretization(&self) -> &TimeDiscretization {
            &self.times
        }

        fn factor_count(&self) -> usize {
            self.increments.first().map_or(0, |row| row.len())
        }

        fn path_count(&self) -> usize {
            2
        }

        fn increment(&self, time_index: usize, factor: usize) -> Option<&RandomVariable> {
            self.increments.get(time_index)?.get(factor)
        }
    }

    fn times() -> TimeDiscretization {
        TimeDiscretization::uniform(0.0, 4, 0.25).unwrap()
    }

    fn base() -> Arc<dyn ParametricModel> {
        Arc::new(
            VolatilityCorrelationModel::new(
                times(),
                TimeDiscretization::uniform(0.0, 2, 0.5).unwrap(),
                FlatVolatility::new(0.2),
                ExponentialDecayCorrelation::new(0.0, 1).unwrap(),
                true,
            )
            .unwrap(),
        )
    }

    fn driver() -> Arc<dyn StochasticDriver> {
        Arc::new(FixedDriver::new(times(), 2))
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(StochasticVolatility::new(0.3, 1.5, 1, driver()).is_err());
        assert!(StochasticVolatility::new(f64::NAN, 0.0, 1, driver()).is_err());
        assert!(matches!(
            StochasticVolatility::new(0.3, 0.0, 2, driver()),
            Err(ModelError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_process_is_lazy() {
        let sv = StochasticVolatility::new(0.3, 0.0, 1, driver()).unwrap();
        assert!(!sv.is_built());
        let model = Decorated::new(base(), sv, true).unwrap();
        model.factor_loading(2, 0, None).unwrap();
        assert!(model.decoration().is_built());
    }

    #[test]
    fn test_process_values() {
        let nu = 0.3;
        let rho = 0.6;
        let sv = StochasticVolatility::new(nu, rho, 1, driver()).unwrap();
        let process = sv.process();
        assert_eq!(process.len(), 5);
        assert_eq!(process[0].get(0), 1.0);

        // ΔB = 0.6 * 0.1 + 0.8 * 0.2 on path 0
        let db: f64 = 0.6 * 0.1 + 0.8 * 0.2;
        let step = (nu * db - 0.5 * nu * nu * 0.25).exp();
        assert_relative_eq!(process[2].get(0), step * step, epsilon = 1e-12);
        assert_eq!(process[2].filtration_time(), 0.5);
    }

    #[test]
    fn test_loading_is_scaled() {
        let sv = StochasticVolatility::new(0.3, -0.4, 1, driver()).unwrap();
        let lambda = sv.process()[3].clone();
        let model = Decorated::new(base(), sv, true).unwrap();
        let loading = model.factor_loading(3, 1, None).unwrap();
        assert_relative_eq!(loading[0].get(0), 0.2 * lambda.get(0), epsilon = 1e-12);
        assert_relative_eq!(loading[0].get(1), 0.2 * lambda.get(1), epsilon = 1e-12);
    }

    #[test]
    fn test_reparameterisation_starts_with_empty_cache() {
        let model = Arc::new(
            Decorated::new(base(), StochasticVolatility::new(0.3, 0.0, 1, driver()).unwrap(), true)
                .unwrap(),
        );
        let before = model.factor_loading(4, 0, None).unwrap();
        assert!(model.decoration().is_built());

        let modified = model
            .clone()
            .with_modified_parameters(&[0.2, 0.0, 0.5, 0.0])
            .unwrap();
        let after = modified.factor_loading(4, 0, None).unwrap();
        assert_ne!(before[0].get(0), after[0].get(0));
        assert_eq!(modified.parameters(), vec![0.2, 0.0, 0.5, 0.0]);
    }

    #[test]
    fn test_driver_grid_must_match() {
        let other = Arc::new(FixedDriver::new(
            TimeDiscretization::uniform(0.0, 2, 0.5).unwrap(),
            2,
        ));
        let sv = StochasticVolatility::new(0.3, 0.0, 1, other).unwrap();
        assert!(matches!(
            Decorated::new(base(), sv, true),
            Err(ModelError::InvalidDiscretization(_))
        ));
    }

    #[test]
    fn test_orthogonal_factor_must_be_free() {
        // The base model uses factor 0 only.
        let sv = StochasticVolatility::new(0.3, 0.0, 0, driver()).unwrap();
        assert!(matches!(
            Decorated::new(base(), sv, true),
            Err(ModelError::IncompatibleDriver(_))
        ));
    }

    #[test]
    fn test_reports_its_driver() {
        let shared = driver();
        let sv = StochasticVolatility::new(0.3, 0.0, 1, shared.clone()).unwrap();
        let model = Decorated::new(base(), sv, true).unwrap();
        let embedded = model.embedded_driver().unwrap();
        assert!(Arc::ptr_eq(embedded, &shared));
        assert!(base().embedded_driver().is_none());
    }

    #[test]
    fn test_nested_decorations_share_one_driver() {
        let inner: Arc<dyn ParametricModel> = Arc::new(
            Decorated::new(base(), StochasticVolatility::new(0.3, 0.0, 1, driver()).unwrap(), true)
                .unwrap(),
        );
        let other = StochasticVolatility::new(0.1, 0.0, 1, driver()).unwrap();
        assert!(matches!(
            Decorated::new(inner, other, true),
            Err(ModelError::IncompatibleDriver(_))
        ));
    }

    #[test]
    fn test_concurrent_first_use_builds_once() {
        let model = Arc::new(
            Decorated::new(base(), StochasticVolatility::new(0.3, 0.2, 1, driver()).unwrap(), true)
                .unwrap(),
        );
        let results: Vec<Vec<RandomVariable>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let model = &model;
                    scope.spawn(move || model.factor_loading(4, 1, None).unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for r in &results[1..] {
            assert_eq!(r, &results[0]);
        }
    }
}
