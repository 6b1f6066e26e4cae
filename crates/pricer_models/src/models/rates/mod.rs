//! Interest rate model descriptions.
//!
//! - [`LiborMarketModel`]: tenor, initial forwards and covariance model
//! - [`ShortRateVolatilityModel`]: parametric volatility and mean reversion
//!   of a Hull-White type short rate

pub mod lmm;
pub mod short_rate;

pub use lmm::LiborMarketModel;
pub use short_rate::{PiecewiseConstantShortRateVolatility, ShortRateVolatilityModel};
