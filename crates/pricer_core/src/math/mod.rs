//! Numerical methods.
//!
//! - [`solvers`]: Bounded Levenberg-Marquardt nonlinear least squares

pub mod solvers;
