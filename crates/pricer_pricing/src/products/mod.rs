//! Products valued against a forward rate simulation.
//!
//! Every product reports its value as a numeraire-relative expectation at
//! evaluation time 0. Failures are typed: [`ValuationError::is_fatal`]
//! separates errors that must abort a calibration from those that only
//! invalidate one instrument.

mod caplet;
mod swaption;

pub use caplet::{Cap, Caplet};
pub use swaption::Swaption;

use crate::mc::{Simulation, SimulationError};
use pricer_core::types::RandomVariable;
use std::fmt::Debug;
use thiserror::Error;

/// Errors raised while valuing a product.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValuationError {
    /// The simulation could not supply a value.
    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),

    /// The valuation produced NaN or infinity.
    #[error("Non-finite value for {product}")]
    NonFinite {
        /// Product kind.
        product: &'static str,
    },

    /// The product does not support the request.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// The product does not fit the simulated tenor.
    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    /// The valuation panicked; the payload message is kept.
    #[error("Valuation panicked: {0}")]
    Panicked(String),

    /// An unrecoverable failure; aborts the calling calibration.
    #[error("Valuation aborted: {0}")]
    Aborted(String),
}

impl ValuationError {
    /// Whether this error must propagate instead of being neutralised.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }

    /// Creates an `InvalidProduct` error.
    pub fn invalid_product(message: impl Into<String>) -> Self {
        Self::InvalidProduct(message.into())
    }
}

/// A product that can be valued on a simulation.
pub trait Product: Debug + Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Value at `evaluation_time`.
    ///
    /// # Errors
    ///
    /// Any [`ValuationError`]; only time 0 is supported by the supplied
    /// products.
    fn value(
        &self,
        evaluation_time: f64,
        simulation: &dyn Simulation,
    ) -> Result<RandomVariable, ValuationError>;
}

pub(crate) fn check_evaluation_time(evaluation_time: f64) -> Result<(), ValuationError> {
    if evaluation_time != 0.0 {
        return Err(ValuationError::Unsupported(format!(
            "evaluation time {evaluation_time}, only 0 is supported"
        )));
    }
    Ok(())
}

pub(crate) fn expectation(
    product: &'static str,
    deflated: &RandomVariable,
) -> Result<RandomVariable, ValuationError> {
    let value = deflated.average();
    if !value.is_finite() {
        return Err(ValuationError::NonFinite { product });
    }
    Ok(RandomVariable::deterministic(value))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_aborted_is_fatal() {
        assert!(ValuationError::Aborted("solver".into()).is_fatal());
        assert!(!ValuationError::NonFinite { product: "caplet" }.is_fatal());
        assert!(!ValuationError::invalid_product("x").is_fatal());
        assert!(!ValuationError::Panicked("index out of bounds".into()).is_fatal());
        assert!(!ValuationError::from(SimulationError::invalid_configuration("x")).is_fatal());
    }

    #[test]
    fn test_expectation_rejects_non_finite() {
        let rv = RandomVariable::from_values(0.0, vec![1.0, f64::NAN]);
        assert_eq!(
            expectation("caplet", &rv).unwrap_err(),
            ValuationError::NonFinite { product: "caplet" }
        );
        let rv = RandomVariable::from_values(0.0, vec![1.0, 3.0]);
        assert_eq!(expectation("caplet", &rv).unwrap().as_scalar(), Some(2.0));
    }

    #[test]
    fn test_evaluation_time() {
        assert!(check_evaluation_time(0.0).is_ok());
        assert!(matches!(
            check_evaluation_time(1.0),
            Err(ValuationError::Unsupported(_))
        ));
    }
}
