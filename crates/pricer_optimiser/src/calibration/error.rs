//! Calibration error types.

use pricer_core::types::SolverError;
use pricer_models::ModelError;
use pricer_pricing::mc::SimulationError;
use pricer_pricing::products::ValuationError;
use pricer_pricing::scheduler::SchedulerError;
use thiserror::Error;

/// Errors that terminate a calibration run.
///
/// Per-instrument valuation failures never appear here unless they are
/// fatal; recoverable ones are neutralised by the objective function.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Invalid options, instruments or bounds; raised before any simulation.
    #[error("Invalid calibration configuration: {0}")]
    Configuration(String),

    /// The model could not be re-parameterised.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// The simulation for a trial could not be built.
    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),

    /// The optimiser failed.
    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    /// A fatal valuation failure.
    #[error("Valuation aborted calibration: {0}")]
    Valuation(ValuationError),

    /// A worker pool could not be created.
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// The engine has already run.
    #[error("Calibration engine has already run")]
    AlreadyRun,

    /// No optimiser is registered under this name.
    #[error("Unsupported optimizer: {0}")]
    UnsupportedOptimizer(String),
}

impl CalibrationError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = CalibrationError::configuration("weights length 2, expected 3");
        assert_eq!(
            err.to_string(),
            "Invalid calibration configuration: weights length 2, expected 3"
        );
        assert_eq!(
            CalibrationError::UnsupportedOptimizer("simplex".into()).to_string(),
            "Unsupported optimizer: simplex"
        );
    }

    #[test]
    fn test_conversions() {
        let err: CalibrationError = ModelError::ParameterLengthMismatch {
            expected: 2,
            got: 3,
        }
        .into();
        assert!(matches!(err, CalibrationError::Model(_)));

        let err: CalibrationError = SolverError::EmptyProblem.into();
        assert!(matches!(err, CalibrationError::Solver(_)));
    }
}
