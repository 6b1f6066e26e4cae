//! Calibration engine.
//!
//! The engine drives an [`Optimizer`] over an [`Objective`]. Every batch of
//! candidate parameter vectors requested by the optimiser is evaluated on the
//! candidate scheduler; each candidate in turn schedules its instruments on
//! the objective's own scheduler.
//!
//! ```text
//! Initialized -> Iterating -> Converged
//!                          -> MaxIterationsReached
//!                          -> Failed
//! ```
//!
//! An engine runs once. Worker pools are owned through [`TaskScheduler`]
//! handles and are released when the engine is dropped, whatever the
//! outcome.

use super::error::CalibrationError;
use super::objective::{rms, Objective};
use super::optimizer::Optimizer;
use super::options::CalibrationOptions;
use super::result::CalibrationResult;
use pricer_core::math::solvers::{LeastSquaresProblem, Termination};
use pricer_core::traits::BoxConstraints;
use pricer_pricing::scheduler::TaskScheduler;
use std::time::Instant;
use tracing::{error, info, info_span};

/// Lifecycle of a [`CalibrationEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Created, not yet run.
    Initialized,
    /// The optimiser is running.
    Iterating,
    /// The optimiser met its convergence criterion.
    Converged,
    /// The iteration budget was exhausted.
    MaxIterationsReached,
    /// The run was aborted by an error.
    Failed,
}

impl EngineState {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Converged | Self::MaxIterationsReached | Self::Failed
        )
    }
}

/// Single-use least-squares calibration driver.
#[derive(Debug)]
pub struct CalibrationEngine {
    optimizer: Box<dyn Optimizer>,
    bounds: BoxConstraints,
    steps: Vec<f64>,
    candidate_scheduler: TaskScheduler,
    state: EngineState,
}

impl CalibrationEngine {
    /// Create an engine.
    ///
    /// # Arguments
    ///
    /// * `options` - Accuracy, iteration budget, optimiser and candidate concurrency
    /// * `bounds` - Box constraints, empty for unbounded
    /// * `steps` - Finite-difference steps, empty for the solver default
    ///
    /// # Errors
    ///
    /// Optimiser construction or worker pool failures.
    pub fn new(
        options: &CalibrationOptions,
        bounds: BoxConstraints,
        steps: Vec<f64>,
    ) -> Result<Self, CalibrationError> {
        let optimizer = options
            .optimizer_factory()?
            .create(options.accuracy, options.max_iterations)?;
        Ok(Self {
            optimizer,
            bounds,
            steps,
            candidate_scheduler: options.candidate_scheduler()?,
            state: EngineState::Initialized,
        })
    }

    /// Current state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Minimise the objective starting from `initial`.
    ///
    /// An empty `initial` vector completes immediately with zero iterations
    /// and without evaluating the objective.
    ///
    /// # Errors
    ///
    /// - `AlreadyRun` if the engine has been run before
    /// - any error surfaced by the objective or the optimiser; the engine
    ///   is then `Failed`
    pub fn run(
        &mut self,
        objective: &dyn Objective,
        initial: Vec<f64>,
    ) -> Result<CalibrationResult, CalibrationError> {
        if self.state != EngineState::Initialized {
            return Err(CalibrationError::AlreadyRun);
        }
        let span = info_span!(
            "calibration",
            parameters = initial.len(),
            instruments = objective.instrument_count()
        );
        let _guard = span.enter();
        let started = Instant::now();

        if initial.is_empty() {
            self.state = EngineState::Converged;
            info!("no free parameters, calibration skipped");
            return Ok(CalibrationResult {
                parameters: initial,
                iterations: 0,
                errors: Vec::new(),
                rms: 0.0,
                state: self.state,
                termination: None,
                duration: started.elapsed(),
            });
        }

        self.state = EngineState::Iterating;
        info!(
            optimizer = self.optimizer.name(),
            candidate_threads = self.candidate_scheduler.thread_count(),
            "calibration started"
        );

        let problem = LeastSquaresProblem::new(initial)
            .with_bounds(self.bounds.clone())
            .with_steps(self.steps.clone());
        let scheduler = &self.candidate_scheduler;
        let mut evaluate = |candidates: &[Vec<f64>]| -> Result<Vec<Vec<f64>>, CalibrationError> {
            scheduler
                .map(candidates, |_, parameters| objective.evaluate(parameters))
                .into_iter()
                .collect()
        };

        match self.optimizer.optimize(&problem, &mut evaluate) {
            Ok(outcome) => {
                self.state = match outcome.termination {
                    Termination::MaxIterations => EngineState::MaxIterationsReached,
                    _ => EngineState::Converged,
                };
                let rms = rms(&outcome.errors);
                info!(
                    state = ?self.state,
                    iterations = outcome.iterations,
                    rms,
                    "calibration finished"
                );
                Ok(CalibrationResult {
                    parameters: outcome.parameters,
                    iterations: outcome.iterations,
                    errors: outcome.errors,
                    rms,
                    state: self.state,
                    termination: Some(outcome.termination),
                    duration: started.elapsed(),
                })
            }
            Err(err) => {
                self.state = EngineState::Failed;
                error!(error = %err, "calibration failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Errors `p_i - target_i`, counting evaluations.
    struct Shift {
        target: Vec<f64>,
        calls: AtomicUsize,
    }

    impl Shift {
        fn new(target: Vec<f64>) -> Self {
            Self {
                target,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Objective for Shift {
        fn instrument_count(&self) -> usize {
            self.target.len()
        }

        fn evaluate(&self, parameters: &[f64]) -> Result<Vec<f64>, CalibrationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(parameters
                .iter()
                .zip(&self.target)
                .map(|(p, t)| p - t)
                .collect())
        }
    }

    struct Broken;

    impl Objective for Broken {
        fn instrument_count(&self) -> usize {
            1
        }

        fn evaluate(&self, _parameters: &[f64]) -> Result<Vec<f64>, CalibrationError> {
            Err(CalibrationError::configuration("broken"))
        }
    }

    fn engine(options: &CalibrationOptions) -> CalibrationEngine {
        CalibrationEngine::new(options, BoxConstraints::default(), Vec::new()).unwrap()
    }

    #[test]
    fn test_converges_and_is_single_use() {
        let options = CalibrationOptions::default().with_number_of_threads(0);
        let mut engine = engine(&options);
        assert_eq!(engine.state(), EngineState::Initialized);

        let objective = Shift::new(vec![0.3, -0.7]);
        let result = engine.run(&objective, vec![1.0, 1.0]).unwrap();
        assert_eq!(engine.state(), EngineState::Converged);
        assert!(result.is_converged());
        assert_relative_eq!(result.parameters[0], 0.3, epsilon = 1e-6);
        assert_relative_eq!(result.parameters[1], -0.7, epsilon = 1e-6);
        assert!(result.rms < 1e-7);

        assert_eq!(
            engine.run(&objective, vec![1.0, 1.0]).unwrap_err(),
            CalibrationError::AlreadyRun
        );
        assert_eq!(engine.state(), EngineState::Converged);
    }

    #[test]
    fn test_empty_parameters_skip_evaluation() {
        let mut engine = engine(&CalibrationOptions::default());
        let objective = Shift::new(Vec::new());
        let result = engine.run(&objective, Vec::new()).unwrap();
        assert_eq!(result.iterations, 0);
        assert!(result.termination.is_none());
        assert_eq!(objective.calls.load(Ordering::SeqCst), 0);
        assert_eq!(engine.state(), EngineState::Converged);
    }

    #[test]
    fn test_objective_error_fails_engine() {
        let mut engine = engine(&CalibrationOptions::default().with_number_of_threads(2));
        let err = engine.run(&Broken, vec![1.0]).unwrap_err();
        assert!(matches!(err, CalibrationError::Configuration(_)));
        assert_eq!(engine.state(), EngineState::Failed);
        assert!(engine.state().is_terminal());
        assert_eq!(engine.run(&Broken, vec![1.0]).unwrap_err(), CalibrationError::AlreadyRun);
    }

    #[test]
    fn test_iteration_budget() {
        let options = CalibrationOptions::default()
            .with_number_of_threads(0)
            .with_max_iterations(1)
            .with_accuracy(1e-14);
        let mut engine = engine(&options);
        // nonlinear residual needs more than one step from far away
        struct Exp;
        impl Objective for Exp {
            fn instrument_count(&self) -> usize {
                1
            }
            fn evaluate(&self, p: &[f64]) -> Result<Vec<f64>, CalibrationError> {
                Ok(vec![p[0].exp() - 2.0])
            }
        }
        let result = engine.run(&Exp, vec![3.0]).unwrap();
        assert_eq!(result.state, EngineState::MaxIterationsReached);
        assert_eq!(engine.state(), EngineState::MaxIterationsReached);
    }

    #[test]
    fn test_bounds_respected() {
        let options = CalibrationOptions::default().with_number_of_threads(0);
        let bounds = BoxConstraints::from_vectors(1, Some(&[0.5][..]), None).unwrap();
        let mut engine = CalibrationEngine::new(&options, bounds, vec![1e-4]).unwrap();
        let result = engine.run(&Shift::new(vec![0.0]), vec![2.0]).unwrap();
        assert!(result.parameters[0] >= 0.5);
        assert_relative_eq!(result.parameters[0], 0.5, epsilon = 1e-8);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!EngineState::Initialized.is_terminal());
        assert!(!EngineState::Iterating.is_terminal());
        assert!(EngineState::MaxIterationsReached.is_terminal());
    }
}
