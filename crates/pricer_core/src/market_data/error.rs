//! Market data error types.

use thiserror::Error;

/// Market data operation errors.
///
/// # Examples
///
/// ```
/// use pricer_core::market_data::MarketDataError;
///
/// let err = MarketDataError::InvalidMaturity { t: -1.0 };
/// assert!(format!("{}", err).contains("-1"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// Invalid maturity (negative time, or an empty period).
    #[error("Invalid maturity: t = {t}")]
    InvalidMaturity {
        /// The invalid maturity value
        t: f64,
    },

    /// Discount factor that is not strictly positive and finite.
    #[error("Invalid discount factor {df} at t = {t}")]
    InvalidDiscountFactor {
        /// Pillar time
        t: f64,
        /// Offending discount factor
        df: f64,
    },

    /// Pillar times are not strictly increasing.
    #[error("Pillars not strictly increasing at index {index}")]
    UnsortedPillars {
        /// Index of the offending pillar
        index: usize,
    },

    /// Insufficient data for construction.
    #[error("Insufficient data: got {got}, need {need}")]
    InsufficientData {
        /// Number of points provided
        got: usize,
        /// Minimum number of points required
        need: usize,
    },
}
