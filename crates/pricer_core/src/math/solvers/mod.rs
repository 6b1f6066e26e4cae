//! Optimisation solvers for model calibration.
//!
//! ## Available Solvers
//!
//! - [`LevenbergMarquardtSolver`]: Bounded nonlinear least squares with
//!   per-parameter finite-difference steps and batched candidate evaluation
//!
//! ## Examples
//!
//! ```
//! use pricer_core::math::solvers::LevenbergMarquardtSolver;
//!
//! // Minimise (p[0] - 2)² + (p[1] - 3)²
//! let residuals = |params: &[f64]| -> Vec<f64> {
//!     vec![params[0] - 2.0, params[1] - 3.0]
//! };
//!
//! let solver = LevenbergMarquardtSolver::with_defaults();
//! let result = solver.solve(residuals, vec![0.0, 0.0]).unwrap();
//!
//! assert!(result.converged);
//! assert!((result.params[0] - 2.0).abs() < 1e-6);
//! ```

mod levenberg_marquardt;

pub use levenberg_marquardt::{
    LMConfig, LMResult, LeastSquaresProblem, LevenbergMarquardtSolver, Termination,
    DEFAULT_PARAMETER_STEP,
};
