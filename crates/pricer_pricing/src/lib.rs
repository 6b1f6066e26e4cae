//! # Pricer Pricing (Layer 3: Monte Carlo Engine)
//!
//! Monte Carlo simulation of forward rate models and the products valued on
//! them.
//!
//! ## Modules
//!
//! - [`rng`]: seeded normal variates
//! - [`mc`]: Brownian driver, the [`Simulation`](mc::Simulation) trait and the
//!   LIBOR market model simulation
//! - [`products`]: caplets, caps and swaptions with typed valuation errors
//! - [`scheduler`]: inline or thread pool execution of independent valuations
//!
//! ## Usage Example
//!
//! ```rust
//! use std::sync::Arc;
//! use pricer_core::traits::StochasticDriver;
//! use pricer_core::types::TimeDiscretization;
//! use pricer_models::models::covariance::{
//!     ExponentialDecayCorrelation, FlatVolatility, VolatilityCorrelationModel,
//! };
//! use pricer_models::models::rates::LiborMarketModel;
//! use pricer_pricing::mc::{BrownianMotion, LmmSimulation};
//! use pricer_pricing::products::{Caplet, Product};
//!
//! let grid = TimeDiscretization::uniform(0.0, 4, 0.5).unwrap();
//! let covariance = Arc::new(
//!     VolatilityCorrelationModel::new(
//!         grid.clone(),
//!         TimeDiscretization::uniform(0.0, 4, 0.5).unwrap(),
//!         FlatVolatility::new(0.2),
//!         ExponentialDecayCorrelation::new(0.1, 1).unwrap(),
//!         true,
//!     )
//!     .unwrap(),
//! );
//! let model = LiborMarketModel::from_forwards(covariance, vec![0.03; 4]).unwrap();
//! let driver: Arc<dyn StochasticDriver> =
//!     Arc::new(BrownianMotion::new(grid, 1, 1000, 31415).unwrap());
//!
//! let simulation = LmmSimulation::new(model, driver).unwrap();
//! let value = Caplet::new(2, 0.03).value(0.0, &simulation).unwrap();
//! assert!(value.get(0) > 0.0);
//! ```

#![deny(missing_docs)]

pub mod mc;
pub mod products;
pub mod rng;
pub mod scheduler;
