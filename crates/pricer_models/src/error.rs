//! Model error types.

use pricer_core::market_data::MarketDataError;
use pricer_core::types::DiscretizationError;
use thiserror::Error;

/// Errors raised by parametric models and model descriptions.
///
/// # Examples
///
/// ```
/// use pricer_models::ModelError;
///
/// let err = ModelError::ParameterLengthMismatch { expected: 4, got: 3 };
/// assert_eq!(format!("{}", err), "Parameter length mismatch: expected 4, got 3");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A parameter vector of the wrong length was supplied.
    #[error("Parameter length mismatch: expected {expected}, got {got}")]
    ParameterLengthMismatch {
        /// Length of the model's own parameter vector
        expected: usize,
        /// Length supplied
        got: usize,
    },

    /// A parameter value outside its admissible domain.
    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f64,
        /// Why the value is rejected
        reason: &'static str,
    },

    /// A time, component or factor index beyond the model's range.
    #[error("{what} index {index} out of range (size {size})")]
    IndexOutOfRange {
        /// Which index
        what: &'static str,
        /// Offending index
        index: usize,
        /// Valid size
        size: usize,
    },

    /// Inconsistent or malformed discretisations.
    #[error("Invalid discretisation: {0}")]
    InvalidDiscretization(String),

    /// A state dependent loading met a forward rate of exactly zero.
    #[error("Forward rate of component {component} is zero on path {path}")]
    ZeroForward {
        /// Forward rate component
        component: usize,
        /// First offending path
        path: usize,
    },

    /// A model and a stochastic driver that cannot be used together.
    #[error("Incompatible driver: {0}")]
    IncompatibleDriver(String),

    /// Market data lookup failed.
    #[error("Market data error: {0}")]
    MarketData(#[from] MarketDataError),
}

impl ModelError {
    /// Create an invalid parameter error.
    pub fn invalid_parameter(name: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value,
            reason,
        }
    }

    /// Create an index out of range error.
    pub fn index_out_of_range(what: &'static str, index: usize, size: usize) -> Self {
        Self::IndexOutOfRange { what, index, size }
    }

    /// Create an incompatible driver error.
    pub fn incompatible_driver(msg: impl Into<String>) -> Self {
        Self::IncompatibleDriver(msg.into())
    }

    /// Create an invalid discretisation error.
    pub fn invalid_discretization(msg: impl Into<String>) -> Self {
        Self::InvalidDiscretization(msg.into())
    }
}

impl From<DiscretizationError> for ModelError {
    fn from(err: DiscretizationError) -> Self {
        ModelError::InvalidDiscretization(err.to_string())
    }
}

/// Check a parameter slice has the expected length.
pub(crate) fn check_length(expected: usize, parameters: &[f64]) -> Result<(), ModelError> {
    if parameters.len() != expected {
        return Err(ModelError::ParameterLengthMismatch {
            expected,
            got: parameters.len(),
        });
    }
    Ok(())
}
