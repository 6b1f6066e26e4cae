//! Yield curve trait definition.

use crate::market_data::error::MarketDataError;
use num_traits::Float;

/// Generic yield curve trait for discount factor and rate calculations.
///
/// Implementations are generic over `T: Float`.
///
/// # Invariants
///
/// - D(0) = 1
/// - D(t) > 0 for all t >= 0
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{YieldCurve, FlatCurve};
///
/// let curve = FlatCurve::new(0.05_f64);
///
/// let df = curve.discount_factor(1.0).unwrap();
/// assert!((df - 0.951229).abs() < 1e-5);
///
/// let fwd = curve.forward_rate(1.0, 2.0).unwrap();
/// assert!((fwd - 0.05).abs() < 1e-10);
///
/// // Simply compounded forward used as an initial LIBOR
/// let libor = curve.simple_forward_rate(1.0, 1.5).unwrap();
/// assert!(((0.025_f64).exp() - 1.0 - 0.5 * libor).abs() < 1e-12);
/// ```
pub trait YieldCurve<T: Float> {
    /// Return the discount factor D(t) for maturity `t`.
    ///
    /// # Errors
    ///
    /// `MarketDataError::InvalidMaturity` if t < 0.
    fn discount_factor(&self, t: T) -> Result<T, MarketDataError>;

    /// Continuously compounded zero rate, `r(t) = -ln(D(t)) / t`.
    fn zero_rate(&self, t: T) -> Result<T, MarketDataError> {
        if t <= T::zero() {
            return Err(invalid_maturity(t));
        }
        let df = self.discount_factor(t)?;
        Ok(-df.ln() / t)
    }

    /// Continuously compounded forward rate between `t1` and `t2`.
    fn forward_rate(&self, t1: T, t2: T) -> Result<T, MarketDataError> {
        let dt = t2 - t1;
        if dt <= T::zero() {
            return Err(invalid_maturity(dt));
        }
        let df1 = self.discount_factor(t1)?;
        let df2 = self.discount_factor(t2)?;
        Ok(-(df2 / df1).ln() / dt)
    }

    /// Simply compounded forward rate between `t1` and `t2`.
    ///
    /// ```text
    /// L(t1, t2) = (D(t1) / D(t2) - 1) / (t2 - t1)
    /// ```
    fn simple_forward_rate(&self, t1: T, t2: T) -> Result<T, MarketDataError> {
        let dt = t2 - t1;
        if dt <= T::zero() {
            return Err(invalid_maturity(dt));
        }
        let df1 = self.discount_factor(t1)?;
        let df2 = self.discount_factor(t2)?;
        Ok((df1 / df2 - T::one()) / dt)
    }
}

fn invalid_maturity<T: Float>(t: T) -> MarketDataError {
    MarketDataError::InvalidMaturity {
        t: t.to_f64().unwrap_or(f64::NAN),
    }
}
