//! Interest rate models and their parametric covariance structures.
//!
//! - [`covariance`]: Parametric factor loading models and their composition
//! - [`rates`]: LIBOR market model description and short-rate volatility models

pub mod covariance;
pub mod rates;
