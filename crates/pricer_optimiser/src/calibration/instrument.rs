//! Calibration instruments: what "calibrated" means.

use super::error::CalibrationError;
use pricer_core::types::RandomVariable;
use pricer_pricing::mc::Simulation;
use pricer_pricing::products::{Product, ValuationError};
use std::sync::Arc;

/// A product, its target value and its weight in the least-squares problem.
///
/// `priority` only orders dispatch when valuations are scheduled; it never
/// changes a computed error.
#[derive(Debug, Clone)]
pub struct CalibrationInstrument {
    product: Arc<dyn Product>,
    target: RandomVariable,
    weight: f64,
    priority: i32,
}

impl CalibrationInstrument {
    /// Creates an instrument with priority 0.
    ///
    /// # Errors
    ///
    /// `Configuration` if the weight or the target is not finite.
    pub fn new(
        product: Arc<dyn Product>,
        target: impl Into<RandomVariable>,
        weight: f64,
    ) -> Result<Self, CalibrationError> {
        let target = target.into();
        if !weight.is_finite() {
            return Err(CalibrationError::configuration(format!(
                "weight {weight} of {} instrument is not finite",
                product.name()
            )));
        }
        if !target.is_finite() {
            return Err(CalibrationError::configuration(format!(
                "target of {} instrument is not finite",
                product.name()
            )));
        }
        Ok(Self {
            product,
            target,
            weight,
            priority: 0,
        })
    }

    /// Builds instruments from parallel vectors.
    ///
    /// # Errors
    ///
    /// `Configuration` if the vectors differ in length, or any instrument is
    /// rejected by [`CalibrationInstrument::new`].
    pub fn from_parts(
        products: Vec<Arc<dyn Product>>,
        targets: Vec<RandomVariable>,
        weights: Vec<f64>,
    ) -> Result<Vec<Self>, CalibrationError> {
        if targets.len() != products.len() || weights.len() != products.len() {
            return Err(CalibrationError::configuration(format!(
                "{} products, {} targets, {} weights",
                products.len(),
                targets.len(),
                weights.len()
            )));
        }
        products
            .into_iter()
            .zip(targets)
            .zip(weights)
            .map(|((product, target), weight)| Self::new(product, target, weight))
            .collect()
    }

    /// Sets the scheduling priority; higher runs first.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// The product.
    pub fn product(&self) -> &Arc<dyn Product> {
        &self.product
    }

    /// The target value.
    pub fn target(&self) -> &RandomVariable {
        &self.target
    }

    /// The weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// The scheduling priority.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Weighted error `(value - target) * weight` on `simulation`.
    pub fn error(&self, simulation: &dyn Simulation) -> Result<f64, ValuationError> {
        let value = self.product.value(0.0, simulation)?;
        let error = ((value - &self.target) * self.weight).average();
        if !error.is_finite() {
            return Err(ValuationError::NonFinite {
                product: self.product.name(),
            });
        }
        Ok(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_pricing::products::Caplet;

    fn caplet() -> Arc<dyn Product> {
        Arc::new(Caplet::new(1, 0.03))
    }

    #[test]
    fn test_from_parts() {
        let instruments = CalibrationInstrument::from_parts(
            vec![caplet(), caplet()],
            vec![RandomVariable::deterministic(0.01), RandomVariable::from(0.02)],
            vec![1.0, 2.0],
        )
        .unwrap();
        assert_eq!(instruments.len(), 2);
        assert_eq!(instruments[1].weight(), 2.0);
        assert_eq!(instruments[1].target().as_scalar(), Some(0.02));
        assert_eq!(instruments[0].priority(), 0);
    }

    #[test]
    fn test_from_parts_length_mismatch() {
        let err = CalibrationInstrument::from_parts(
            vec![caplet(), caplet()],
            vec![RandomVariable::from(0.01), RandomVariable::from(0.02)],
            vec![1.0],
        )
        .unwrap_err();
        assert!(matches!(err, CalibrationError::Configuration(_)));
    }

    #[test]
    fn test_from_parts_rejects_nan_weight() {
        let err = CalibrationInstrument::from_parts(vec![caplet()], vec![RandomVariable::from(0.01)], vec![f64::NAN])
            .unwrap_err();
        assert!(matches!(err, CalibrationError::Configuration(_)));
    }

    #[test]
    fn test_new_rejects_non_finite_weight() {
        for weight in [f64::NAN, f64::INFINITY] {
            let err = CalibrationInstrument::new(caplet(), 0.01, weight).unwrap_err();
            assert!(matches!(err, CalibrationError::Configuration(_)));
        }
    }

    #[test]
    fn test_new_rejects_non_finite_target() {
        let err = CalibrationInstrument::new(caplet(), f64::NAN, 1.0).unwrap_err();
        assert!(matches!(err, CalibrationError::Configuration(_)));
    }

    #[test]
    fn test_priority() {
        let instrument = CalibrationInstrument::new(caplet(), 0.01, 1.0)
            .unwrap()
            .with_priority(5);
        assert_eq!(instrument.priority(), 5);
    }
}
