//! Calibration options.
//!
//! [`CalibrationOptions`] holds the recognised calibration settings with
//! their defaults. It can be read from TOML using camelCase keys; unknown
//! keys are ignored so that newer configuration files remain readable.
//!
//! ```toml
//! numberOfPaths = 5000
//! seed = 1234
//! maxIterations = 100
//! accuracy = 1e-8
//! numberOfThreads = 4
//! lowerBounds = [0.0, 0.0]
//! ```

use super::error::CalibrationError;
use super::optimizer::{optimizer_factory_by_name, OptimizerFactory};
use pricer_core::math::solvers::DEFAULT_PARAMETER_STEP;
use pricer_core::traits::{BoxConstraints, StochasticDriver};
use pricer_pricing::scheduler::TaskScheduler;
use serde::Deserialize;
use std::sync::Arc;

/// Settings of a calibration run.
///
/// # Examples
///
/// ```
/// use pricer_optimiser::calibration::CalibrationOptions;
///
/// let options = CalibrationOptions::from_toml_str(
///     "numberOfPaths = 500\naccuracy = 1e-6\nsomeFutureKey = true",
/// )
/// .unwrap();
/// assert_eq!(options.number_of_paths, 500);
/// assert_eq!(options.seed, 31415);
/// assert_eq!(options.max_iterations, 400);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalibrationOptions {
    /// Monte Carlo paths of the default driver.
    ///
    /// Default: 2000
    pub number_of_paths: usize,

    /// Seed of the default driver.
    ///
    /// Default: 31415
    pub seed: u64,

    /// Maximum optimiser iterations.
    ///
    /// Default: 400
    pub max_iterations: usize,

    /// Convergence accuracy on the error vector norm.
    ///
    /// Default: 1e-7
    pub accuracy: f64,

    /// Finite-difference step for every parameter without an explicit step.
    ///
    /// Default: 1e-4
    pub parameter_step: f64,

    /// Worker threads for instrument valuations; 0 runs everything inline.
    ///
    /// Default: available hardware parallelism
    pub number_of_threads: usize,

    /// Candidate parameter vectors evaluated concurrently.
    ///
    /// Default: 2
    pub candidate_threads: usize,

    /// Per-parameter lower bounds; unbounded below if absent.
    pub lower_bounds: Option<Vec<f64>>,

    /// Per-parameter upper bounds; unbounded above if absent.
    pub upper_bounds: Option<Vec<f64>>,

    /// Per-parameter finite-difference steps, overriding `parameter_step`.
    pub parameter_steps: Option<Vec<f64>>,

    /// Optimiser name, resolved by [`optimizer_factory_by_name`].
    ///
    /// Default: `"levenberg-marquardt"`
    pub optimizer: String,

    /// Driver override; replaces the default seeded Brownian motion.
    #[serde(skip)]
    pub brownian_motion: Option<Arc<dyn StochasticDriver>>,

    /// Optimiser override; takes precedence over `optimizer`.
    #[serde(skip)]
    pub optimizer_factory: Option<Arc<dyn OptimizerFactory>>,
}

impl Default for CalibrationOptions {
    fn default() -> Self {
        Self {
            number_of_paths: 2000,
            seed: 31415,
            max_iterations: 400,
            accuracy: 1e-7,
            parameter_step: DEFAULT_PARAMETER_STEP,
            number_of_threads: num_cpus::get(),
            candidate_threads: 2,
            lower_bounds: None,
            upper_bounds: None,
            parameter_steps: None,
            optimizer: "levenberg-marquardt".to_string(),
            brownian_motion: None,
            optimizer_factory: None,
        }
    }
}

impl CalibrationOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a TOML document.
    ///
    /// # Errors
    ///
    /// `Configuration` if the document is malformed or a recognised key has
    /// the wrong type.
    pub fn from_toml_str(content: &str) -> Result<Self, CalibrationError> {
        toml::from_str(content).map_err(|e| CalibrationError::configuration(e.to_string()))
    }

    /// Set the number of paths.
    pub fn with_number_of_paths(mut self, paths: usize) -> Self {
        self.number_of_paths = paths;
        self
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the iteration budget.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the accuracy.
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Set the default finite-difference step.
    pub fn with_parameter_step(mut self, step: f64) -> Self {
        self.parameter_step = step;
        self
    }

    /// Set the instrument worker count; 0 runs inline.
    pub fn with_number_of_threads(mut self, threads: usize) -> Self {
        self.number_of_threads = threads;
        self
    }

    /// Set the candidate concurrency.
    pub fn with_candidate_threads(mut self, threads: usize) -> Self {
        self.candidate_threads = threads;
        self
    }

    /// Set lower bounds.
    pub fn with_lower_bounds(mut self, bounds: Vec<f64>) -> Self {
        self.lower_bounds = Some(bounds);
        self
    }

    /// Set upper bounds.
    pub fn with_upper_bounds(mut self, bounds: Vec<f64>) -> Self {
        self.upper_bounds = Some(bounds);
        self
    }

    /// Set per-parameter steps.
    pub fn with_parameter_steps(mut self, steps: Vec<f64>) -> Self {
        self.parameter_steps = Some(steps);
        self
    }

    /// Select an optimiser by name.
    pub fn with_optimizer(mut self, name: impl Into<String>) -> Self {
        self.optimizer = name.into();
        self
    }

    /// Override the stochastic driver.
    pub fn with_brownian_motion(mut self, driver: Arc<dyn StochasticDriver>) -> Self {
        self.brownian_motion = Some(driver);
        self
    }

    /// Override the optimiser factory.
    pub fn with_optimizer_factory(mut self, factory: Arc<dyn OptimizerFactory>) -> Self {
        self.optimizer_factory = Some(factory);
        self
    }

    /// Check the options against a parameter vector of length `parameter_count`.
    ///
    /// # Errors
    ///
    /// - `Configuration` for a non-positive accuracy or step, zero paths,
    ///   zero candidate threads, or vectors of the wrong length
    /// - `UnsupportedOptimizer` for an unknown optimiser name without a
    ///   factory override
    pub fn validate(&self, parameter_count: usize) -> Result<(), CalibrationError> {
        if !self.accuracy.is_finite() || self.accuracy <= 0.0 {
            return Err(CalibrationError::configuration(format!(
                "accuracy must be positive, got {}",
                self.accuracy
            )));
        }
        if !self.parameter_step.is_finite() || self.parameter_step <= 0.0 {
            return Err(CalibrationError::configuration(format!(
                "parameter step must be positive, got {}",
                self.parameter_step
            )));
        }
        if self.number_of_paths == 0 {
            return Err(CalibrationError::configuration("number of paths must be positive"));
        }
        if self.candidate_threads == 0 {
            return Err(CalibrationError::configuration(
                "candidate threads must be positive",
            ));
        }
        self.optimizer_factory()?;

        for (name, vector) in [
            ("lower bounds", &self.lower_bounds),
            ("upper bounds", &self.upper_bounds),
            ("parameter steps", &self.parameter_steps),
        ] {
            if let Some(v) = vector {
                if v.len() != parameter_count {
                    return Err(CalibrationError::configuration(format!(
                        "{name} have length {}, expected {parameter_count}",
                        v.len()
                    )));
                }
            }
        }
        Ok(())
    }

    /// The optimiser factory: the override if set, otherwise looked up by name.
    pub fn optimizer_factory(&self) -> Result<Arc<dyn OptimizerFactory>, CalibrationError> {
        match &self.optimizer_factory {
            Some(factory) => Ok(factory.clone()),
            None => optimizer_factory_by_name(&self.optimizer),
        }
    }

    /// Box constraints for `parameter_count` parameters.
    pub fn bounds(&self, parameter_count: usize) -> Result<BoxConstraints, CalibrationError> {
        Ok(BoxConstraints::from_vectors(
            parameter_count,
            self.lower_bounds.as_deref(),
            self.upper_bounds.as_deref(),
        )?)
    }

    /// Finite-difference steps for `parameter_count` parameters.
    pub fn steps(&self, parameter_count: usize) -> Vec<f64> {
        match &self.parameter_steps {
            Some(steps) => steps.clone(),
            None => vec![self.parameter_step; parameter_count],
        }
    }

    /// Scheduler for per-instrument valuations.
    pub fn instrument_scheduler(&self) -> Result<TaskScheduler, CalibrationError> {
        Ok(TaskScheduler::with_threads(self.number_of_threads)?)
    }

    /// Scheduler for candidate evaluations; inline when `number_of_threads` is 0.
    pub fn candidate_scheduler(&self) -> Result<TaskScheduler, CalibrationError> {
        if self.number_of_threads == 0 || self.candidate_threads <= 1 {
            return Ok(TaskScheduler::inline());
        }
        Ok(TaskScheduler::with_threads(self.candidate_threads)?)
    }
}
