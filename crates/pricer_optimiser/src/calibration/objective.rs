//! Per-trial objective function.
//!
//! One evaluation maps a trial parameter vector to one weighted error per
//! calibration instrument:
//!
//! 1. re-parameterise the covariance model (the base model is untouched)
//! 2. bind it to a fresh LIBOR market model and a fresh simulation on the
//!    shared driver
//! 3. value every instrument on the instrument scheduler
//! 4. neutralise recoverable valuation failures to zero
//!
//! A panic inside one instrument's valuation is caught on the worker and
//! treated like any other recoverable failure of that instrument.

use super::error::CalibrationError;
use super::instrument::CalibrationInstrument;
use pricer_core::traits::StochasticDriver;
use pricer_models::models::rates::LiborMarketModel;
use pricer_pricing::mc::LmmSimulation;
use pricer_pricing::products::ValuationError;
use pricer_pricing::scheduler::TaskScheduler;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Maps a parameter vector to an error vector.
///
/// Implementations are evaluated concurrently for different candidates.
pub trait Objective: Sync {
    /// Number of instruments, i.e. the length of every error vector.
    fn instrument_count(&self) -> usize;

    /// Error vector at `parameters`.
    ///
    /// # Errors
    ///
    /// Any error that must abort the calibration.
    fn evaluate(&self, parameters: &[f64]) -> Result<Vec<f64>, CalibrationError>;
}

/// Replaces recoverable failures with zero, keeping instrument order.
///
/// Returns the error vector and the number of neutralised instruments.
///
/// # Errors
///
/// The first fatal [`ValuationError`], in instrument order.
///
/// # Examples
///
/// ```
/// use pricer_optimiser::calibration::neutralise_failures;
/// use pricer_pricing::products::ValuationError;
///
/// let results = vec![
///     Ok(0.5),
///     Err(ValuationError::Unsupported("barrier".into())),
///     Ok(-0.25),
/// ];
/// let (errors, neutralised) = neutralise_failures(results).unwrap();
/// assert_eq!(errors, vec![0.5, 0.0, -0.25]);
/// assert_eq!(neutralised, 1);
/// ```
pub fn neutralise_failures(
    results: Vec<Result<f64, ValuationError>>,
) -> Result<(Vec<f64>, usize), CalibrationError> {
    let mut neutralised = 0;
    let mut errors = Vec::with_capacity(results.len());
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(error) => errors.push(error),
            Err(err) if err.is_fatal() => return Err(CalibrationError::Valuation(err)),
            Err(err) => {
                warn!(instrument = index, error = %err, "valuation failed, contribution set to zero");
                neutralised += 1;
                errors.push(0.0);
            }
        }
    }
    Ok((errors, neutralised))
}

/// Objective function of a LIBOR market model calibration.
#[derive(Debug, Clone)]
pub struct ObjectiveFunction {
    model: LiborMarketModel,
    instruments: Arc<[CalibrationInstrument]>,
    driver: Arc<dyn StochasticDriver>,
    scheduler: TaskScheduler,
}

impl ObjectiveFunction {
    /// Creates the objective.
    ///
    /// # Arguments
    ///
    /// * `model` - Base model; its covariance parameters are the free parameters
    /// * `instruments` - Calibration instruments, in error vector order
    /// * `driver` - Shared stochastic driver, reused by every trial
    /// * `scheduler` - Scheduler for per-instrument valuations
    pub fn new(
        model: LiborMarketModel,
        instruments: Vec<CalibrationInstrument>,
        driver: Arc<dyn StochasticDriver>,
        scheduler: TaskScheduler,
    ) -> Self {
        Self {
            model,
            instruments: instruments.into(),
            driver,
            scheduler,
        }
    }

    /// The base model.
    pub fn model(&self) -> &LiborMarketModel {
        &self.model
    }

    /// The calibration instruments.
    pub fn instruments(&self) -> &[CalibrationInstrument] {
        &self.instruments
    }

    /// The shared driver.
    pub fn driver(&self) -> &Arc<dyn StochasticDriver> {
        &self.driver
    }

    /// The instrument scheduler.
    pub fn scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    /// Initial parameter vector.
    pub fn initial_parameters(&self) -> Vec<f64> {
        self.model.parameters()
    }

    /// The base model re-parameterised with `parameters`.
    pub fn model_with_parameters(
        &self,
        parameters: &[f64],
    ) -> Result<LiborMarketModel, CalibrationError> {
        let covariance = self
            .model
            .covariance_model()
            .clone()
            .with_modified_parameters(parameters)?;
        Ok(self.model.with_covariance_model(covariance)?)
    }

    /// Per-instrument results at `parameters`, before neutralisation.
    ///
    /// # Errors
    ///
    /// Model or simulation construction failures.
    pub fn valuations(
        &self,
        parameters: &[f64],
    ) -> Result<Vec<Result<f64, ValuationError>>, CalibrationError> {
        let model = self.model_with_parameters(parameters)?;
        let simulation = LmmSimulation::new(model, self.driver.clone())?;
        Ok(self.scheduler.map_prioritised(
            &self.instruments[..],
            |instrument| instrument.priority(),
            |_, instrument| value_isolated(instrument, &simulation),
        ))
    }
}

/// Weighted error of one instrument, with a panic mapped to
/// [`ValuationError::Panicked`].
fn value_isolated(
    instrument: &CalibrationInstrument,
    simulation: &LmmSimulation,
) -> Result<f64, ValuationError> {
    catch_unwind(AssertUnwindSafe(|| instrument.error(simulation)))
        .unwrap_or_else(|payload| Err(ValuationError::Panicked(panic_message(&*payload))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl Objective for ObjectiveFunction {
    fn instrument_count(&self) -> usize {
        self.instruments.len()
    }

    fn evaluate(&self, parameters: &[f64]) -> Result<Vec<f64>, CalibrationError> {
        let (errors, neutralised) = neutralise_failures(self.valuations(parameters)?)?;
        debug!(
            parameters = ?parameters,
            rms = rms(&errors),
            neutralised,
            "objective evaluated"
        );
        Ok(errors)
    }
}

pub(crate) fn rms(errors: &[f64]) -> f64 {
    if errors.is_empty() {
        return 0.0;
    }
    (errors.iter().map(|e| e * e).sum::<f64>() / errors.len() as f64).sqrt()
}
