//! # Monte Carlo Simulation
//!
//! - [`BrownianMotion`]: seeded, lazily generated stochastic driver
//! - [`Simulation`]: read access to simulated forwards and numeraire
//! - [`LmmSimulation`]: log-Euler LIBOR market model under the spot measure

mod brownian;
mod error;
mod lmm;
mod simulation;

pub use brownian::BrownianMotion;
pub use error::SimulationError;
pub use lmm::LmmSimulation;
pub use simulation::Simulation;
