//! Yield curve abstractions.
//!
//! This module provides:
//! - [`YieldCurve`]: Generic trait for discount factor and rate calculations
//! - [`FlatCurve`]: Constant rate yield curve implementation
//! - [`DiscountCurve`]: Pillar-based curve, log-linear in discount factors

mod discount;
mod flat;
mod traits;

pub use discount::DiscountCurve;
pub use flat::FlatCurve;
pub use traits::YieldCurve;
