//! Read access to a simulated forward rate curve.

use super::error::SimulationError;
use pricer_core::types::{RandomVariable, TimeDiscretization};
use pricer_models::models::covariance::ParametricModel;
use std::fmt::Debug;
use std::sync::Arc;

/// A built, read-only simulation of forward rates and numeraire.
///
/// Products value against this trait; it is shared across valuation
/// threads.
pub trait Simulation: Debug + Send + Sync {
    /// Simulation times.
    fn time_discretization(&self) -> &TimeDiscretization;

    /// Tenor dates of the forward rates.
    fn tenor_discretization(&self) -> &TimeDiscretization;

    /// Number of Monte Carlo paths.
    fn path_count(&self) -> usize;

    /// Forward rate `component` at simulation time index `time_index`.
    fn forward_rate(
        &self,
        time_index: usize,
        component: usize,
    ) -> Result<&RandomVariable, SimulationError>;

    /// Numeraire at tenor date `tenor_index`.
    fn numeraire(&self, tenor_index: usize) -> Result<&RandomVariable, SimulationError>;

    /// Covariance model the simulation was built from.
    fn covariance_model(&self) -> &Arc<dyn ParametricModel>;

    /// Number of forward rates.
    fn component_count(&self) -> usize {
        self.tenor_discretization().number_of_steps()
    }

    /// Simulation time index of `time`.
    fn time_index(&self, time: f64) -> Result<usize, SimulationError> {
        self.time_discretization().index_of(time).ok_or_else(|| {
            SimulationError::incompatible(format!("{time} is not a simulation time"))
        })
    }

    /// Accrual period of forward rate `component`.
    fn period_length(&self, component: usize) -> Result<f64, SimulationError> {
        let tenor = self.tenor_discretization();
        if component >= tenor.number_of_steps() {
            return Err(SimulationError::index_out_of_range(
                "component",
                component,
                tenor.number_of_steps(),
            ));
        }
        Ok(tenor.step(component))
    }
}
