//! LIBOR market model calibration.
//!
//! The free parameters are the covariance model's parameter vector. Each
//! trial re-parameterises the covariance model, simulates on a shared
//! stochastic driver and values every [`CalibrationInstrument`]; the
//! [`CalibrationEngine`] minimises the weighted errors with a bounded
//! Levenberg-Marquardt optimiser.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use pricer_core::types::TimeDiscretization;
//! use pricer_models::models::covariance::{
//!     ExponentialDecayCorrelation, FlatVolatility, ParametricModel, VolatilityCorrelationModel,
//! };
//! use pricer_models::models::rates::LiborMarketModel;
//! use pricer_optimiser::calibration::{calibrate, CalibrationInstrument, CalibrationOptions};
//! use pricer_pricing::products::Caplet;
//!
//! let covariance: Arc<dyn ParametricModel> = Arc::new(
//!     VolatilityCorrelationModel::new(
//!         TimeDiscretization::uniform(0.0, 4, 0.5).unwrap(),
//!         TimeDiscretization::uniform(0.0, 2, 1.0).unwrap(),
//!         FlatVolatility::new(0.2),
//!         ExponentialDecayCorrelation::new(0.1, 1).unwrap(),
//!         false,
//!     )
//!     .unwrap(),
//! );
//! let model = LiborMarketModel::from_forwards(covariance, vec![0.03, 0.03]).unwrap();
//! let instruments =
//!     vec![CalibrationInstrument::new(Arc::new(Caplet::new(1, 0.03)), 0.004, 1.0).unwrap()];
//!
//! // Nothing is calibrateable, so the model comes back unchanged.
//! let options = CalibrationOptions::default().with_number_of_paths(100);
//! let (calibrated, result) = calibrate(&model, instruments, &options).unwrap();
//! assert_eq!(result.iterations, 0);
//! assert!(Arc::ptr_eq(calibrated.covariance_model(), model.covariance_model()));
//! ```

mod engine;
mod error;
mod instrument;
mod objective;
mod optimizer;
mod options;
mod result;

pub use engine::{CalibrationEngine, EngineState};
pub use error::CalibrationError;
pub use instrument::CalibrationInstrument;
pub use objective::{neutralise_failures, Objective, ObjectiveFunction};
pub use optimizer::{
    optimizer_factory_by_name, BatchEvaluator, LevenbergMarquardtFactory,
    LevenbergMarquardtOptimizer, Optimizer, OptimizerFactory, OptimizerOutcome,
};
pub use options::CalibrationOptions;
pub use result::CalibrationResult;

use pricer_core::traits::StochasticDriver;
use pricer_models::models::covariance::FactorLoadingModel;
use pricer_models::models::rates::LiborMarketModel;
use pricer_pricing::mc::BrownianMotion;
use std::sync::Arc;

/// Calibrate the covariance model of `model` to `instruments`.
///
/// Returns the calibrated model, a new instance sharing nothing mutable
/// with `model`, together with the run diagnostics. A model without free
/// parameters is returned unchanged after zero iterations.
///
/// The simulation driver is the override in `options`, else the driver a
/// covariance model draws its own randomness from (stochastic volatility),
/// else a fresh [`BrownianMotion`] with `number_of_paths` paths and `seed`.
///
/// # Arguments
///
/// * `model` - Base model; its covariance parameters are the starting point
/// * `instruments` - Calibration instruments
/// * `options` - Calibration options
///
/// # Errors
///
/// - `Configuration` for invalid options, no instruments with free
///   parameters, or a driver override that is not the covariance model's driver
/// - any error that terminates the run, see [`CalibrationError`]
pub fn calibrate(
    model: &LiborMarketModel,
    instruments: Vec<CalibrationInstrument>,
    options: &CalibrationOptions,
) -> Result<(LiborMarketModel, CalibrationResult), CalibrationError> {
    let initial = model.parameters();
    let parameter_count = initial.len();
    options.validate(parameter_count)?;
    if parameter_count > 0 && instruments.is_empty() {
        return Err(CalibrationError::configuration(
            "no calibration instruments for a model with free parameters",
        ));
    }

    let bounds = options.bounds(parameter_count)?;
    let steps = options.steps(parameter_count);
    let mut engine = CalibrationEngine::new(options, bounds, steps)?;

    let embedded = model.covariance_model().embedded_driver();
    let driver: Arc<dyn StochasticDriver> = match (&options.brownian_motion, embedded) {
        (Some(driver), Some(embedded)) if !Arc::ptr_eq(driver, embedded) => {
            return Err(CalibrationError::configuration(
                "driver override differs from the driver of the covariance model",
            ));
        }
        (Some(driver), _) => driver.clone(),
        (None, Some(embedded)) => embedded.clone(),
        (None, None) => Arc::new(BrownianMotion::new(
            model.time_discretization().clone(),
            model.covariance_model().factor_count(),
            options.number_of_paths,
            options.seed,
        )?),
    };
    let objective = ObjectiveFunction::new(
        model.clone(),
        instruments,
        driver,
        options.instrument_scheduler()?,
    );

    let result = engine.run(&objective, initial)?;
    let calibrated = model.with_modified_parameters(&result.parameters)?;
    Ok((calibrated, result))
}
