//! # pricer_optimiser
//!
//! Calibration of parametric covariance models for the LIBOR market model.
//!
//! ## Architecture Position
//!
//! Layer 2.5 of the workspace. Depends on `pricer_core` (L1) for the
//! bounded Levenberg-Marquardt solver, `pricer_models` (L2) for the
//! parametric covariance models and `pricer_pricing` (L3) for the Monte
//! Carlo simulation, products and task scheduling.
//!
//! ## Modules
//!
//! - `calibration`: instruments, objective function, optimiser abstraction,
//!   options, the single-use calibration engine and the `calibrate` entry point
//!
//! ## Logging
//!
//! Structured `tracing` events are emitted under a `calibration` span; no
//! subscriber is installed by this crate.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod calibration;

pub use calibration::{calibrate, CalibrationError, CalibrationOptions, CalibrationResult};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::calibration::*;
}
