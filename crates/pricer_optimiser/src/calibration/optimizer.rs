//! Optimiser abstraction used by the calibration engine.
//!
//! An [`Optimizer`] drives a batched evaluation callback: every call hands
//! it a slice of candidate parameter vectors, and it expects one error
//! vector per candidate back. [`OptimizerFactory`] lets callers substitute
//! their own optimiser through the calibration options.

use super::error::CalibrationError;
use pricer_core::math::solvers::{
    LMConfig, LeastSquaresProblem, LevenbergMarquardtSolver, Termination,
};
use std::fmt::Debug;
use std::sync::Arc;

/// Batched evaluation callback handed to an optimiser.
pub type BatchEvaluator<'a> =
    dyn FnMut(&[Vec<f64>]) -> Result<Vec<Vec<f64>>, CalibrationError> + 'a;

/// Final state of an optimisation.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerOutcome {
    /// Best parameters found.
    pub parameters: Vec<f64>,
    /// Error vector at `parameters`.
    pub errors: Vec<f64>,
    /// Number of iterations.
    pub iterations: usize,
    /// Why the optimiser stopped.
    pub termination: Termination,
}

/// A least-squares optimiser.
pub trait Optimizer: Debug + Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Minimise the squared norm of the evaluated error vectors.
    ///
    /// # Errors
    ///
    /// Errors from `evaluate` propagate unchanged; optimiser failures are
    /// reported as `CalibrationError::Solver`.
    fn optimize(
        &self,
        problem: &LeastSquaresProblem,
        evaluate: &mut BatchEvaluator<'_>,
    ) -> Result<OptimizerOutcome, CalibrationError>;
}

/// Builds optimisers for a given accuracy and iteration budget.
pub trait OptimizerFactory: Debug + Send + Sync {
    /// Create an optimiser.
    fn create(
        &self,
        accuracy: f64,
        max_iterations: usize,
    ) -> Result<Box<dyn Optimizer>, CalibrationError>;
}

/// Levenberg-Marquardt adapter over the core solver.
#[derive(Debug, Clone)]
pub struct LevenbergMarquardtOptimizer {
    solver: LevenbergMarquardtSolver,
}

impl LevenbergMarquardtOptimizer {
    /// Wrap a solver configured with `config`.
    pub fn new(config: LMConfig) -> Self {
        Self {
            solver: LevenbergMarquardtSolver::new(config),
        }
    }

    /// The solver configuration.
    pub fn config(&self) -> &LMConfig {
        self.solver.config()
    }
}

impl Optimizer for LevenbergMarquardtOptimizer {
    fn name(&self) -> &'static str {
        "levenberg-marquardt"
    }

    fn optimize(
        &self,
        problem: &LeastSquaresProblem,
        evaluate: &mut BatchEvaluator<'_>,
    ) -> Result<OptimizerOutcome, CalibrationError> {
        let result = self.solver.solve_batched(problem, |candidates: &[Vec<f64>]| {
            evaluate(candidates)
        })?;
        Ok(OptimizerOutcome {
            parameters: result.params,
            errors: result.residuals,
            iterations: result.iterations,
            termination: result.termination,
        })
    }
}

/// Factory for [`LevenbergMarquardtOptimizer`].
///
/// `trials_per_round` damping candidates are evaluated together in each
/// round; the default of two gives the engine a pair of candidates to
/// evaluate concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevenbergMarquardtFactory {
    trials_per_round: usize,
}

impl LevenbergMarquardtFactory {
    /// Factory producing optimisers with `trials_per_round` candidates per round.
    pub fn new(trials_per_round: usize) -> Self {
        Self {
            trials_per_round: trials_per_round.max(1),
        }
    }
}

impl Default for LevenbergMarquardtFactory {
    fn default() -> Self {
        Self::new(2)
    }
}

impl OptimizerFactory for LevenbergMarquardtFactory {
    fn create(
        &self,
        accuracy: f64,
        max_iterations: usize,
    ) -> Result<Box<dyn Optimizer>, CalibrationError> {
        if !accuracy.is_finite() || accuracy <= 0.0 {
            return Err(CalibrationError::configuration(format!(
                "accuracy must be positive, got {accuracy}"
            )));
        }
        let config =
            LMConfig::new(accuracy, max_iterations).with_trials_per_round(self.trials_per_round);
        Ok(Box::new(LevenbergMarquardtOptimizer::new(config)))
    }
}

/// Look up an optimiser factory by name.
///
/// Recognised names: `"levenberg-marquardt"` and `"lm"`, case-insensitive.
///
/// # Errors
///
/// `UnsupportedOptimizer` for any other name.
pub fn optimizer_factory_by_name(name: &str) -> Result<Arc<dyn OptimizerFactory>, CalibrationError> {
    match name.to_ascii_lowercase().as_str() {
        "levenberg-marquardt" | "lm" => Ok(Arc::new(LevenbergMarquardtFactory::default())),
        _ => Err(CalibrationError::UnsupportedOptimizer(name.to_string())),
    }
}
