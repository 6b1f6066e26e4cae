//! Pillar-based discount curve.

use super::YieldCurve;
use crate::market_data::error::MarketDataError;

/// Discount curve interpolating log discount factors linearly between pillars.
///
/// An implicit pillar D(0) = 1 is added. Beyond the last pillar the curve
/// extrapolates with the last forward rate.
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{DiscountCurve, YieldCurve};
///
/// let curve = DiscountCurve::new(&[1.0, 2.0], &[0.97, 0.94]).unwrap();
/// assert!((curve.discount_factor(1.0).unwrap() - 0.97).abs() < 1e-12);
/// assert!(curve.discount_factor(1.5).unwrap() < 0.97);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountCurve {
    times: Vec<f64>,
    log_dfs: Vec<f64>,
}

impl DiscountCurve {
    /// Build a curve from pillar times and discount factors.
    ///
    /// # Errors
    ///
    /// - `InsufficientData` if no pillars are given or the lengths differ
    /// - `InvalidMaturity` for a non-positive pillar time
    /// - `UnsortedPillars` if pillar times are not strictly increasing
    /// - `InvalidDiscountFactor` for non-positive or non-finite discount factors
    pub fn new(times: &[f64], discount_factors: &[f64]) -> Result<Self, MarketDataError> {
        if times.is_empty() || times.len() != discount_factors.len() {
            return Err(MarketDataError::InsufficientData {
                got: times.len().min(discount_factors.len()),
                need: times.len().max(1),
            });
        }

        let mut pillar_times = Vec::with_capacity(times.len() + 1);
        let mut log_dfs = Vec::with_capacity(times.len() + 1);
        pillar_times.push(0.0);
        log_dfs.push(0.0);

        for (index, (&t, &df)) in times.iter().zip(discount_factors).enumerate() {
            if t <= 0.0 || !t.is_finite() {
                return Err(MarketDataError::InvalidMaturity { t });
            }
            if t <= pillar_times[pillar_times.len() - 1] {
                return Err(MarketDataError::UnsortedPillars { index });
            }
            if df <= 0.0 || !df.is_finite() {
                return Err(MarketDataError::InvalidDiscountFactor { t, df });
            }
            pillar_times.push(t);
            log_dfs.push(df.ln());
        }

        Ok(Self {
            times: pillar_times,
            log_dfs,
        })
    }

    /// Build a curve from continuously compounded zero rates.
    pub fn from_zero_rates(times: &[f64], rates: &[f64]) -> Result<Self, MarketDataError> {
        let dfs: Vec<f64> = times
            .iter()
            .zip(rates)
            .map(|(&t, &r)| (-r * t).exp())
            .collect();
        Self::new(times, &dfs)
    }

    /// Pillar times, including the implicit pillar at zero.
    pub fn pillars(&self) -> &[f64] {
        &self.times
    }
}

impl YieldCurve<f64> for DiscountCurve {
    fn discount_factor(&self, t: f64) -> Result<f64, MarketDataError> {
        if t < 0.0 || t.is_nan() {
            return Err(MarketDataError::InvalidMaturity { t });
        }
        let n = self.times.len();
        // Segment whose right end is the first pillar >= t, clamped to the last segment.
        let right = self.times.partition_point(|&p| p < t).clamp(1, n - 1);
        let left = right - 1;
        let (t0, t1) = (self.times[left], self.times[right]);
        let (y0, y1) = (self.log_dfs[left], self.log_dfs[right]);
        let log_df = y0 + (y1 - y0) * (t - t0) / (t1 - t0);
        Ok(log_df.exp())
    }
}
