//! Core numeric and discretisation types.
//!
//! This module provides:
//! - `random_variable`: Path-wise stochastic scalars used for simulated quantities
//! - `discretization`: Strictly increasing time grids (simulation times, tenor dates)
//! - `error`: Structured error types for solvers and discretisations
//!
//! # Re-exports
//!
//! For convenience, commonly used types are re-exported at this module level:
//! - [`RandomVariable`] from `random_variable`
//! - [`TimeDiscretization`] from `discretization`
//! - [`SolverError`], [`DiscretizationError`] from `error`

pub mod discretization;
pub mod error;
pub mod random_variable;

// Re-export commonly used types at module level
pub use discretization::TimeDiscretization;
pub use error::{DiscretizationError, SolverError};
pub use random_variable::RandomVariable;
