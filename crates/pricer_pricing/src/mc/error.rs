//! Error types for simulation construction and access.

use pricer_models::ModelError;
use thiserror::Error;

/// Errors raised while building or reading a simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// Invalid driver or simulation configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Time grids or tenor structures do not fit together.
    #[error("Incompatible discretization: {0}")]
    IncompatibleDiscretization(String),

    /// Index outside the simulated range.
    #[error("{what} index {index} out of range (size {size})")]
    IndexOutOfRange {
        /// What was indexed.
        what: &'static str,
        /// Requested index.
        index: usize,
        /// Valid size.
        size: usize,
    },

    /// The covariance model failed during evolution.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

impl SimulationError {
    /// Creates an `InvalidConfiguration` error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    /// Creates an `IncompatibleDiscretization` error.
    pub fn incompatible(message: impl Into<String>) -> Self {
        Self::IncompatibleDiscretization(message.into())
    }

    /// Creates an `IndexOutOfRange` error.
    pub fn index_out_of_range(what: &'static str, index: usize, size: usize) -> Self {
        Self::IndexOutOfRange { what, index, size }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = SimulationError::index_out_of_range("component", 5, 3);
        assert_eq!(err.to_string(), "component index 5 out of range (size 3)");

        let err = SimulationError::invalid_configuration("zero paths");
        assert!(err.to_string().contains("zero paths"));
    }

    #[test]
    fn test_from_model_error() {
        let err: SimulationError = ModelError::ParameterLengthMismatch {
            expected: 2,
            got: 1,
        }
        .into();
        assert!(matches!(err, SimulationError::Model(_)));
    }
}
