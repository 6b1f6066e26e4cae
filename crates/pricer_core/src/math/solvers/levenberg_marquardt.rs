//! Levenberg-Marquardt nonlinear least-squares solver.
//!
//! This module provides the [`LevenbergMarquardtSolver`] for the box
//! constrained least-squares problems met in model calibration, where every
//! residual evaluation may be a full Monte Carlo valuation.
//!
//! # Algorithm
//!
//! ```text
//! (J^T J + λI) δ = -J^T r
//! p_{n+1} = Π(p_n + δ)
//! ```
//!
//! where:
//! - `J` is the forward-difference Jacobian, one bump per parameter with a
//!   per-parameter absolute step
//! - `Π` projects onto the parameter bounds
//! - `λ` is the damping factor, decreased on accepted steps and increased on
//!   rejected ones
//!
//! All bumps of one Jacobian are handed to the caller as a single batch, as
//! are the trial points of one damping round. The caller decides how the
//! batch is evaluated (sequentially or concurrently); the solver's decisions
//! only depend on the returned residuals, so the iteration is deterministic.
//!
//! # Example
//!
//! ```
//! use pricer_core::math::solvers::{LeastSquaresProblem, LevenbergMarquardtSolver};
//! use pricer_core::traits::{BoxConstraints, ParameterBounds};
//! use pricer_core::types::SolverError;
//!
//! // Fit y = a * exp(-b * x) with b >= 0
//! let x_data = [0.0, 1.0, 2.0, 3.0];
//! let y_data: Vec<f64> = x_data.iter().map(|x: &f64| 2.0 * (-0.5 * x).exp()).collect();
//!
//! let problem = LeastSquaresProblem::new(vec![1.0, 1.0]).with_bounds(BoxConstraints::new(vec![
//!     ParameterBounds::unbounded(),
//!     ParameterBounds::non_negative(),
//! ]));
//!
//! let solver = LevenbergMarquardtSolver::with_defaults();
//! let result = solver
//!     .solve_batched(&problem, |candidates: &[Vec<f64>]| {
//!         Ok::<_, SolverError>(
//!             candidates
//!                 .iter()
//!                 .map(|p| {
//!                     x_data
//!                         .iter()
//!                         .zip(&y_data)
//!                         .map(|(&x, &y)| p[0] * (-p[1] * x).exp() - y)
//!                         .collect()
//!                 })
//!                 .collect(),
//!         )
//!     })
//!     .unwrap();
//!
//! assert!(result.converged);
//! assert!((result.params[0] - 2.0).abs() < 1e-4);
//! assert!((result.params[1] - 0.5).abs() < 1e-4);
//! ```

use crate::traits::BoxConstraints;
use crate::types::SolverError;

/// Default absolute finite-difference step for each parameter.
pub const DEFAULT_PARAMETER_STEP: f64 = 1e-4;

/// Configuration for Levenberg-Marquardt solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LMConfig {
    /// Convergence tolerance for the residual norm.
    pub tolerance: f64,
    /// Maximum number of iterations (Jacobian evaluations).
    pub max_iterations: usize,
    /// Initial damping factor.
    pub initial_lambda: f64,
    /// Factor to increase lambda on rejected step.
    pub lambda_up: f64,
    /// Factor to decrease lambda on accepted step.
    pub lambda_down: f64,
    /// Minimum damping factor.
    pub min_lambda: f64,
    /// Damping factor beyond which the iteration is considered stalled.
    pub max_lambda: f64,
    /// Relative parameter change below which the iteration stops.
    pub param_tolerance: f64,
    /// Number of damping factors tried per round, evaluated as one batch.
    pub trials_per_round: usize,
}

impl Default for LMConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-7,
            max_iterations: 400,
            initial_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            min_lambda: 1e-12,
            max_lambda: 1e12,
            param_tolerance: 1e-12,
            trials_per_round: 1,
        }
    }
}

impl LMConfig {
    /// Create a new LM configuration.
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
            ..Default::default()
        }
    }

    /// Set the number of damping factors tried per round.
    pub fn with_trials_per_round(mut self, trials: usize) -> Self {
        self.trials_per_round = trials.max(1);
        self
    }
}

/// Why the iteration stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Residual norm fell below the tolerance.
    ResidualTolerance,
    /// The projected step became negligible relative to the parameters.
    ParameterTolerance,
    /// Damping reached its maximum without finding an improving step.
    Stalled,
    /// The iteration limit was reached.
    MaxIterations,
}

impl Termination {
    /// Whether this termination counts as convergence.
    pub fn is_converged(&self) -> bool {
        !matches!(self, Termination::MaxIterations)
    }
}

/// A bounded least-squares problem.
#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquaresProblem {
    /// Initial parameter guess.
    pub initial: Vec<f64>,
    /// Box constraints; empty means unbounded.
    pub bounds: BoxConstraints,
    /// Absolute finite-difference step for each parameter; empty means default.
    pub steps: Vec<f64>,
}

impl LeastSquaresProblem {
    /// Unbounded problem with default steps.
    pub fn new(initial: Vec<f64>) -> Self {
        Self {
            initial,
            bounds: BoxConstraints::default(),
            steps: Vec::new(),
        }
    }

    /// Set box constraints.
    pub fn with_bounds(mut self, bounds: BoxConstraints) -> Self {
        self.bounds = bounds;
        self
    }

    /// Set per-parameter finite-difference steps.
    pub fn with_steps(mut self, steps: Vec<f64>) -> Self {
        self.steps = steps;
        self
    }

    /// Number of free parameters.
    pub fn dimension(&self) -> usize {
        self.initial.len()
    }

    /// Check dimensions, bounds and steps.
    pub fn validate(&self) -> Result<(), SolverError> {
        let n = self.initial.len();
        if n == 0 {
            return Err(SolverError::EmptyProblem);
        }
        if !self.bounds.is_empty() && self.bounds.len() != n {
            return Err(SolverError::dimension_mismatch("bounds", n, self.bounds.len()));
        }
        self.bounds.validate()?;
        if !self.steps.is_empty() && self.steps.len() != n {
            return Err(SolverError::dimension_mismatch("parameter steps", n, self.steps.len()));
        }
        if let Some(i) = self.steps.iter().position(|h| !h.is_finite() || *h <= 0.0) {
            return Err(SolverError::invalid_configuration(format!(
                "parameter step {} must be positive, got {}",
                i, self.steps[i]
            )));
        }
        if let Some(i) = self.initial.iter().position(|x| !x.is_finite()) {
            return Err(SolverError::invalid_configuration(format!(
                "initial parameter {} is not finite",
                i
            )));
        }
        Ok(())
    }

    fn step(&self, i: usize) -> f64 {
        self.steps.get(i).copied().unwrap_or(DEFAULT_PARAMETER_STEP)
    }

    fn project(&self, x: &mut [f64]) {
        if !self.bounds.is_empty() {
            self.bounds.project(x);
        }
    }
}

/// Result of Levenberg-Marquardt optimisation.
#[derive(Debug, Clone, PartialEq)]
pub struct LMResult {
    /// Final optimised parameters.
    pub params: Vec<f64>,
    /// Residuals at the final parameters.
    pub residuals: Vec<f64>,
    /// Final residual sum of squares.
    pub residual_ss: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether convergence was achieved.
    pub converged: bool,
    /// Final lambda value.
    pub final_lambda: f64,
    /// Why the iteration stopped.
    pub termination: Termination,
}

impl LMResult {
    /// Root mean square of the final residuals.
    pub fn rms(&self) -> f64 {
        if self.residuals.is_empty() {
            return 0.0;
        }
        (self.residual_ss / self.residuals.len() as f64).sqrt()
    }
}

/// Levenberg-Marquardt nonlinear least-squares solver.
///
/// Solves `min_p ||f(p)||^2` subject to `lower <= p <= upper`.
///
/// # Example
///
/// ```
/// use pricer_core::math::solvers::{LevenbergMarquardtSolver, LMConfig};
///
/// let solver = LevenbergMarquardtSolver::new(LMConfig::new(1e-10, 100));
///
/// let residuals = |params: &[f64]| -> Vec<f64> {
///     vec![params[0] - 2.0, params[1] - 3.0]
/// };
///
/// let result = solver.solve(residuals, vec![0.0, 0.0]).unwrap();
/// assert!(result.converged);
/// assert!((result.params[1] - 3.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct LevenbergMarquardtSolver {
    config: LMConfig,
}

impl LevenbergMarquardtSolver {
    /// Create a new LM solver with the given configuration.
    pub fn new(config: LMConfig) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: LMConfig::default(),
        }
    }

    /// Get the solver configuration.
    pub fn config(&self) -> &LMConfig {
        &self.config
    }

    /// Solve an unbounded problem with a plain residual function.
    ///
    /// # Arguments
    ///
    /// * `residuals` - Function that computes residuals given parameters
    /// * `initial_params` - Initial parameter guess
    pub fn solve<F>(&self, residuals: F, initial_params: Vec<f64>) -> Result<LMResult, SolverError>
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        let problem = LeastSquaresProblem::new(initial_params);
        self.solve_batched(&problem, |candidates: &[Vec<f64>]| {
            Ok(candidates.iter().map(|p| residuals(p)).collect())
        })
    }

    /// Solve a bounded problem, evaluating candidates in batches.
    ///
    /// `evaluate` receives a slice of candidate parameter vectors and must
    /// return one residual vector per candidate, in the same order. Every
    /// candidate handed out lies inside the bounds.
    ///
    /// # Errors
    ///
    /// Errors from `evaluate` are propagated unchanged. Solver failures
    /// (empty problem, inconsistent residual counts, non-finite residuals at
    /// an accepted point) are converted with `E: From<SolverError>`.
    pub fn solve_batched<F, E>(
        &self,
        problem: &LeastSquaresProblem,
        mut evaluate: F,
    ) -> Result<LMResult, E>
    where
        F: FnMut(&[Vec<f64>]) -> Result<Vec<Vec<f64>>, E>,
        E: From<SolverError>,
    {
        problem.validate()?;
        let n = problem.dimension();

        let mut params = problem.initial.clone();
        problem.project(&mut params);

        let mut r = evaluate_one(&mut evaluate, &params, None)?;
        let m = r.len();
        if m == 0 {
            return Err(SolverError::NumericalInstability("Empty residual vector".to_string()).into());
        }
        if r.iter().any(|x| !x.is_finite()) {
            return Err(SolverError::NumericalInstability(
                "Non-finite residual at initial parameters".to_string(),
            )
            .into());
        }
        let mut ss = sum_of_squares(&r);
        let mut lambda = self.config.initial_lambda;
        let mut iterations = 0;

        let termination = 'outer: loop {
            if ss.sqrt() < self.config.tolerance {
                break Termination::ResidualTolerance;
            }
            if iterations >= self.config.max_iterations {
                break Termination::MaxIterations;
            }
            iterations += 1;

            let (bumps, offsets) = jacobian_bumps(problem, &params);
            let bumped_residuals = evaluate_batch(&mut evaluate, &bumps, m)?;
            let jacobian = assemble_jacobian(&r, &bumped_residuals, &offsets, n)?;

            loop {
                let trials = self.config.trials_per_round.max(1);
                let mut lambdas = Vec::with_capacity(trials);
                let mut candidates = Vec::with_capacity(trials);
                let mut trial_lambda = lambda;
                for _ in 0..trials {
                    if let Some(delta) = solve_normal_equations(&jacobian, &r, trial_lambda) {
                        let mut trial: Vec<f64> =
                            params.iter().zip(&delta).map(|(p, d)| p + d).collect();
                        problem.project(&mut trial);
                        lambdas.push(trial_lambda);
                        candidates.push(trial);
                    }
                    trial_lambda *= self.config.lambda_up;
                }

                if candidates.is_empty() {
                    lambda = trial_lambda;
                    if lambda > self.config.max_lambda {
                        break 'outer Termination::Stalled;
                    }
                    continue;
                }

                // The least damped candidate is the largest step; if it does
                // not move the parameters, neither will the others.
                if relative_change(&params, &candidates[0]) < self.config.param_tolerance {
                    break 'outer Termination::ParameterTolerance;
                }

                let trial_residuals = evaluate_batch(&mut evaluate, &candidates, m)?;
                let accepted = trial_residuals
                    .iter()
                    .map(|res| sum_of_squares(res))
                    .position(|trial_ss| trial_ss.is_finite() && trial_ss < ss);

                match accepted {
                    Some(k) => {
                        ss = sum_of_squares(&trial_residuals[k]);
                        params = candidates.swap_remove(k);
                        r = trial_residuals.into_iter().nth(k).unwrap_or_default();
                        lambda = (lambdas[k] * self.config.lambda_down).max(self.config.min_lambda);
                        continue 'outer;
                    }
                    None => {
                        lambda = trial_lambda;
                        if lambda > self.config.max_lambda {
                            break 'outer Termination::Stalled;
                        }
                    }
                }
            }
        };

        Ok(LMResult {
            params,
            residuals: r,
            residual_ss: ss,
            iterations,
            converged: termination.is_converged(),
            final_lambda: lambda,
            termination,
        })
    }
}

fn evaluate_one<F, E>(evaluate: &mut F, params: &[f64], expected: Option<usize>) -> Result<Vec<f64>, E>
where
    F: FnMut(&[Vec<f64>]) -> Result<Vec<Vec<f64>>, E>,
    E: From<SolverError>,
{
    let mut batch = evaluate(&[params.to_vec()])?;
    if batch.len() != 1 {
        return Err(SolverError::dimension_mismatch("evaluated candidates", 1, batch.len()).into());
    }
    let r = batch.swap_remove(0);
    if let Some(expected) = expected {
        if r.len() != expected {
            return Err(SolverError::ResidualCountChanged {
                expected,
                actual: r.len(),
            }
            .into());
        }
    }
    Ok(r)
}

fn evaluate_batch<F, E>(evaluate: &mut F, candidates: &[Vec<f64>], m: usize) -> Result<Vec<Vec<f64>>, E>
where
    F: FnMut(&[Vec<f64>]) -> Result<Vec<Vec<f64>>, E>,
    E: From<SolverError>,
{
    if candidates.len() == 1 {
        return Ok(vec![evaluate_one(evaluate, &candidates[0], Some(m))?]);
    }
    let batch = evaluate(candidates)?;
    if batch.len() != candidates.len() {
        return Err(
            SolverError::dimension_mismatch("evaluated candidates", candidates.len(), batch.len())
                .into(),
        );
    }
    if let Some(bad) = batch.iter().find(|r| r.len() != m) {
        return Err(SolverError::ResidualCountChanged {
            expected: m,
            actual: bad.len(),
        }
        .into());
    }
    Ok(batch)
}

/// Forward-difference bump points, one per parameter.
///
/// A bump that would leave the box steps backwards instead. Returns the
/// bumps together with the signed offsets actually applied.
fn jacobian_bumps(problem: &LeastSquaresProblem, params: &[f64]) -> (Vec<Vec<f64>>, Vec<f64>) {
    let n = params.len();
    let mut bumps = Vec::with_capacity(n);
    let mut offsets = Vec::with_capacity(n);

    for j in 0..n {
        let mut h = problem.step(j);
        if let Some(b) = problem.bounds.get(j) {
            if params[j] + h > b.max {
                h = -h;
            }
            if params[j] + h < b.min {
                // Interval narrower than the step: use its larger side.
                let up = b.max - params[j];
                let down = b.min - params[j];
                h = if up >= -down { up } else { down };
            }
        }
        let mut bump = params.to_vec();
        bump[j] += h;
        bumps.push(bump);
        offsets.push(h);
    }

    (bumps, offsets)
}

fn assemble_jacobian(
    r0: &[f64],
    bumped_residuals: &[Vec<f64>],
    offsets: &[f64],
    n: usize,
) -> Result<Vec<Vec<f64>>, SolverError> {
    let m = r0.len();
    let mut jacobian = vec![vec![0.0; n]; m];
    for (j, (rp, &h)) in bumped_residuals.iter().zip(offsets).enumerate() {
        if h == 0.0 {
            continue;
        }
        for i in 0..m {
            let d = (rp[i] - r0[i]) / h;
            if !d.is_finite() {
                return Err(SolverError::NumericalInstability(format!(
                    "Non-finite Jacobian entry ({}, {})",
                    i, j
                )));
            }
            jacobian[i][j] = d;
        }
    }
    Ok(jacobian)
}

/// Solve the normal equations (J^T J + λI) δ = -J^T r
fn solve_normal_equations(jacobian: &[Vec<f64>], residuals: &[f64], lambda: f64) -> Option<Vec<f64>> {
    let n_params = jacobian.first().map_or(0, |row| row.len());
    let n_residuals = residuals.len();

    let mut jtj = vec![vec![0.0; n_params]; n_params];
    for i in 0..n_params {
        for j in 0..=i {
            let mut sum = 0.0;
            for row in jacobian.iter().take(n_residuals) {
                sum += row[i] * row[j];
            }
            jtj[i][j] = sum;
            jtj[j][i] = sum;
        }
    }

    for (i, row) in jtj.iter_mut().enumerate() {
        row[i] += lambda;
    }

    let mut jtr = vec![0.0; n_params];
    for (i, value) in jtr.iter_mut().enumerate() {
        let mut sum = 0.0;
        for (row, r) in jacobian.iter().zip(residuals) {
            sum += row[i] * r;
        }
        *value = -sum;
    }

    solve_cholesky(&jtj, &jtr)
}

fn relative_change(from: &[f64], to: &[f64]) -> f64 {
    let change = from
        .iter()
        .zip(to)
        .map(|(a, b)| (b - a) * (b - a))
        .sum::<f64>()
        .sqrt();
    let norm = from.iter().map(|p| p * p).sum::<f64>().sqrt().max(1.0);
    change / norm
}

/// Compute sum of squares of a vector.
#[inline]
fn sum_of_squares(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum()
}

/// Solve Ax = b using Cholesky decomposition.
fn solve_cholesky(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    // A = L L^T
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if !sum.is_finite() || sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // L y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // L^T x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ParameterBounds;
    use std::cell::RefCell;

    fn batch<F: Fn(&[f64]) -> Vec<f64>>(
        f: F,
    ) -> impl FnMut(&[Vec<f64>]) -> Result<Vec<Vec<f64>>, SolverError> {
        move |candidates: &[Vec<f64>]| Ok(candidates.iter().map(|p| f(p)).collect())
    }

    // ========================================
    // LMConfig Tests
    // ========================================

    #[test]
    fn test_config_default() {
        let config = LMConfig::default();
        assert_eq!(config.tolerance, 1e-7);
        assert_eq!(config.max_iterations, 400);
        assert_eq!(config.trials_per_round, 1);
    }

    #[test]
    fn test_config_trials_at_least_one() {
        assert_eq!(LMConfig::default().with_trials_per_round(0).trials_per_round, 1);
        assert_eq!(LMConfig::default().with_trials_per_round(2).trials_per_round, 2);
    }

    // ========================================
    // Problem validation
    // ========================================

    #[test]
    fn test_problem_rejects_empty() {
        assert_eq!(
            LeastSquaresProblem::new(vec![]).validate(),
            Err(SolverError::EmptyProblem)
        );
    }

    #[test]
    fn test_problem_rejects_bad_steps() {
        let p = LeastSquaresProblem::new(vec![1.0, 2.0]).with_steps(vec![1e-4]);
        assert!(matches!(p.validate(), Err(SolverError::DimensionMismatch { .. })));

        let p = LeastSquaresProblem::new(vec![1.0]).with_steps(vec![0.0]);
        assert!(matches!(p.validate(), Err(SolverError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_problem_rejects_bound_length() {
        let p = LeastSquaresProblem::new(vec![1.0, 2.0]).with_bounds(BoxConstraints::unbounded(3));
        assert!(matches!(p.validate(), Err(SolverError::DimensionMismatch { .. })));
    }

    // ========================================
    // Unbounded solves
    // ========================================

    #[test]
    fn test_solve_simple_linear() {
        let residuals = |params: &[f64]| -> Vec<f64> { vec![params[0] - 2.0, params[1] - 3.0] };

        let solver = LevenbergMarquardtSolver::with_defaults();
        let result = solver.solve(residuals, vec![0.0, 0.0]).unwrap();

        assert!(result.converged);
        assert!((result.params[0] - 2.0).abs() < 1e-6);
        assert!((result.params[1] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_solve_rosenbrock() {
        let residuals = |params: &[f64]| -> Vec<f64> {
            vec![10.0 * (params[1] - params[0] * params[0]), 1.0 - params[0]]
        };

        let solver = LevenbergMarquardtSolver::new(LMConfig::new(1e-10, 400));
        let result = solver.solve(residuals, vec![-1.2, 1.0]).unwrap();

        assert!(result.converged);
        assert!((result.params[0] - 1.0).abs() < 1e-3);
        assert!((result.params[1] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_solve_already_optimal() {
        let residuals = |params: &[f64]| -> Vec<f64> { vec![params[0] - 5.0] };

        let solver = LevenbergMarquardtSolver::with_defaults();
        let result = solver.solve(residuals, vec![5.0]).unwrap();

        assert!(result.converged);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.termination, Termination::ResidualTolerance);
    }

    #[test]
    fn test_solve_empty_params() {
        let solver = LevenbergMarquardtSolver::with_defaults();
        let result = solver.solve(|_: &[f64]| vec![1.0], vec![]);
        assert_eq!(result.unwrap_err(), SolverError::EmptyProblem);
    }

    #[test]
    fn test_non_zero_residual_minimum_terminates_converged() {
        // Best fit of a constant to {0, 1}: p = 0.5, residual norm sqrt(0.5).
        let residuals = |p: &[f64]| -> Vec<f64> { vec![p[0], p[0] - 1.0] };
        let solver = LevenbergMarquardtSolver::with_defaults();
        let result = solver.solve(residuals, vec![3.0]).unwrap();

        assert!(result.converged);
        assert!((result.params[0] - 0.5).abs() < 1e-6);
        assert!((result.rms() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_max_iterations() {
        let residuals = |p: &[f64]| -> Vec<f64> { vec![(p[0] - 3.0).powi(3)] };
        let solver = LevenbergMarquardtSolver::new(LMConfig::new(1e-30, 2));
        let result = solver.solve(residuals, vec![0.0]).unwrap();

        assert!(!result.converged);
        assert_eq!(result.iterations, 2);
        assert_eq!(result.termination, Termination::MaxIterations);
    }

    // ========================================
    // Bounded and batched solves
    // ========================================

    #[test]
    fn test_bounds_are_never_violated() {
        // Unconstrained minimum at p = -1, lower bound 0.
        let seen = RefCell::new(Vec::new());
        let problem = LeastSquaresProblem::new(vec![2.0])
            .with_bounds(BoxConstraints::new(vec![ParameterBounds::non_negative()]));

        let solver = LevenbergMarquardtSolver::with_defaults();
        let result = solver
            .solve_batched(&problem, |candidates: &[Vec<f64>]| {
                seen.borrow_mut().extend(candidates.iter().map(|c| c[0]));
                Ok::<_, SolverError>(candidates.iter().map(|c| vec![c[0] + 1.0]).collect())
            })
            .unwrap();

        assert!(seen.borrow().iter().all(|&x| x >= 0.0));
        assert!(result.params[0].abs() < 1e-8);
        assert!(result.converged);
    }

    #[test]
    fn test_bump_steps_backwards_at_upper_bound() {
        let problem = LeastSquaresProblem::new(vec![1.0, 0.0])
            .with_bounds(BoxConstraints::new(vec![
                ParameterBounds::new(0.0, 1.0),
                ParameterBounds::unbounded(),
            ]))
            .with_steps(vec![0.01, 0.02]);

        let (bumps, offsets) = jacobian_bumps(&problem, &[1.0, 0.0]);
        assert_eq!(offsets, vec![-0.01, 0.02]);
        assert_eq!(bumps[0], vec![0.99, 0.0]);
        assert_eq!(bumps[1], vec![1.0, 0.02]);
    }

    #[test]
    fn test_bump_in_narrow_interval() {
        let problem = LeastSquaresProblem::new(vec![0.5])
            .with_bounds(BoxConstraints::new(vec![ParameterBounds::new(0.4, 0.55)]))
            .with_steps(vec![1.0]);

        let (_, offsets) = jacobian_bumps(&problem, &[0.5]);
        assert!((offsets[0] + 0.1).abs() < 1e-15);
    }

    #[test]
    fn test_jacobian_is_one_batch() {
        let batch_sizes = RefCell::new(Vec::new());
        let problem = LeastSquaresProblem::new(vec![0.0, 0.0, 0.0]);
        let solver = LevenbergMarquardtSolver::with_defaults();
        solver
            .solve_batched(&problem, |candidates: &[Vec<f64>]| {
                batch_sizes.borrow_mut().push(candidates.len());
                Ok::<_, SolverError>(
                    candidates
                        .iter()
                        .map(|c| c.iter().enumerate().map(|(i, x)| x - i as f64).collect())
                        .collect(),
                )
            })
            .unwrap();

        let sizes = batch_sizes.borrow();
        assert_eq!(sizes[0], 1);
        assert_eq!(sizes[1], 3);
    }

    #[test]
    fn test_batched_trials_match_single_trial_solution() {
        let residuals = |p: &[f64]| -> Vec<f64> {
            vec![10.0 * (p[1] - p[0] * p[0]), 1.0 - p[0]]
        };
        let problem = LeastSquaresProblem::new(vec![-1.2, 1.0]);

        let single = LevenbergMarquardtSolver::new(LMConfig::new(1e-10, 400))
            .solve_batched(&problem, batch(residuals))
            .unwrap();
        let double = LevenbergMarquardtSolver::new(
            LMConfig::new(1e-10, 400).with_trials_per_round(2),
        )
        .solve_batched(&problem, batch(residuals))
        .unwrap();

        assert!(single.converged && double.converged);
        assert!((single.params[0] - double.params[0]).abs() < 1e-4);
        assert!((single.params[1] - double.params[1]).abs() < 1e-4);
    }

    #[test]
    fn test_caller_error_propagates() {
        #[derive(Debug, PartialEq)]
        enum Failure {
            Solver(SolverError),
            Aborted,
        }
        impl From<SolverError> for Failure {
            fn from(e: SolverError) -> Self {
                Failure::Solver(e)
            }
        }

        let calls = RefCell::new(0);
        let problem = LeastSquaresProblem::new(vec![1.0]);
        let result = LevenbergMarquardtSolver::with_defaults().solve_batched(
            &problem,
            |candidates: &[Vec<f64>]| {
                *calls.borrow_mut() += 1;
                if *calls.borrow() > 1 {
                    return Err(Failure::Aborted);
                }
                Ok(candidates.iter().map(|c| vec![c[0]]).collect())
            },
        );
        assert_eq!(result.unwrap_err(), Failure::Aborted);
    }

    #[test]
    fn test_residual_count_change_is_error() {
        let calls = RefCell::new(0usize);
        let problem = LeastSquaresProblem::new(vec![1.0]);
        let result = LevenbergMarquardtSolver::with_defaults().solve_batched(
            &problem,
            |candidates: &[Vec<f64>]| {
                *calls.borrow_mut() += 1;
                let len = if *calls.borrow() == 1 { 1 } else { 2 };
                Ok::<_, SolverError>(candidates.iter().map(|c| vec![c[0]; len]).collect())
            },
        );
        assert!(matches!(
            result,
            Err(SolverError::ResidualCountChanged {
                expected: 1,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_non_finite_initial_residual() {
        let solver = LevenbergMarquardtSolver::with_defaults();
        let result = solver.solve(|_: &[f64]| vec![f64::NAN], vec![1.0]);
        assert!(matches!(result, Err(SolverError::NumericalInstability(_))));
    }

    // ========================================
    // Cholesky Solver Tests
    // ========================================

    #[test]
    fn test_cholesky_simple() {
        let a = vec![vec![4.0, 2.0], vec![2.0, 2.0]];
        let b = vec![8.0, 5.0];

        let x = solve_cholesky(&a, &b).unwrap();
        assert!((x[0] - 1.5).abs() < 1e-10);
        assert!((x[1] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_cholesky_non_positive_definite() {
        let a = vec![vec![-1.0, 0.0], vec![0.0, 1.0]];
        assert!(solve_cholesky(&a, &[1.0, 1.0]).is_none());
    }

    #[test]
    fn test_jacobian_linear() {
        let f = |p: &[f64]| -> Vec<f64> { vec![2.0 * p[0] + 3.0 * p[1]] };
        let params = [1.0, 1.0];
        let problem = LeastSquaresProblem::new(params.to_vec());
        let (bumps, offsets) = jacobian_bumps(&problem, &params);
        let bumped_residuals: Vec<Vec<f64>> = bumps.iter().map(|p| f(p)).collect();
        let jacobian = assemble_jacobian(&f(&params), &bumped_residuals, &offsets, 2).unwrap();

        assert!((jacobian[0][0] - 2.0).abs() < 1e-8);
        assert!((jacobian[0][1] - 3.0).abs() < 1e-8);
    }
}
