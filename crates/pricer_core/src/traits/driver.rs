//! Stochastic driver contract.
//!
//! A driver supplies independent Brownian increments over a fixed time grid,
//! for a fixed number of factors and paths. Simulations and stochastic
//! volatility decorators read from it concurrently, so implementations must be
//! `Send + Sync` and must never change their increments once produced.

use crate::types::{RandomVariable, TimeDiscretization};
use std::fmt::Debug;

/// Source of independent increments driving Monte Carlo paths.
pub trait StochasticDriver: Debug + Send + Sync {
    /// Time grid of the increments.
    fn time_discretization(&self) -> &TimeDiscretization;

    /// Number of independent factors.
    fn factor_count(&self) -> usize;

    /// Number of Monte Carlo paths.
    fn path_count(&self) -> usize;

    /// Increment `W(t_{i+1}) - W(t_i)` of factor `factor` over interval `time_index`.
    ///
    /// Returns `None` if either index is out of range.
    fn increment(&self, time_index: usize, factor: usize) -> Option<&RandomVariable>;

    /// A deterministic random variable compatible with this driver's paths.
    fn random_variable_for_constant(&self, value: f64) -> RandomVariable {
        RandomVariable::deterministic(value)
    }
}
