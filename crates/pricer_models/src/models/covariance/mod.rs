//! Parametric covariance models for forward rate curves.
//!
//! Models form a tree: leaves combine a [`VolatilityModel`] with a
//! [`CorrelationModel`] in a [`VolatilityCorrelationModel`], and
//! [`Decorated`] nodes wrap an inner model with a [`Decoration`] strategy
//! ([`Displaced`], [`ExponentialDecay`], [`Blended`], [`StochasticVolatility`]).
//!
//! Every node implements [`ParametricModel`]; re-parameterising a tree
//! always builds new nodes and never mutates existing ones.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use pricer_core::types::TimeDiscretization;
//! use pricer_models::models::covariance::{
//!     AbcdVolatility, Decorated, Displaced, ExponentialDecayCorrelation, ParametricModel,
//!     VolatilityCorrelationModel,
//! };
//!
//! let times = TimeDiscretization::uniform(0.0, 10, 0.5).unwrap();
//! let tenor = TimeDiscretization::uniform(0.0, 5, 1.0).unwrap();
//!
//! let base: Arc<dyn ParametricModel> = Arc::new(
//!     VolatilityCorrelationModel::new(
//!         times,
//!         tenor,
//!         AbcdVolatility::new(0.1, 0.1, 0.5, 0.05),
//!         ExponentialDecayCorrelation::new(0.1, 3).unwrap(),
//!         true,
//!     )
//!     .unwrap(),
//! );
//! let model: Arc<dyn ParametricModel> =
//!     Arc::new(Decorated::new(base, Displaced::new(0.02), true).unwrap());
//!
//! // abcd, correlation decay, displacement
//! assert_eq!(model.parameter_count(), 6);
//! ```

mod composite;
mod correlation;
mod decorated;
mod decorations;
mod stochastic_volatility;
mod traits;
mod volatility;

pub use composite::VolatilityCorrelationModel;
pub use correlation::{reduce_factors, CorrelationModel, ExponentialDecayCorrelation};
pub use decorated::{Decorated, Decoration, LoadingContext};
pub use decorations::{Blended, Displaced, ExponentialDecay};
pub use stochastic_volatility::StochasticVolatility;
pub use traits::{FactorLoadingModel, ParametricModel};
pub use volatility::{AbcdVolatility, FlatVolatility, PiecewiseConstantVolatility, VolatilityModel};
