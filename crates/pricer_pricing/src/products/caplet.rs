//! Caplets and caps on simulated forward rates.

use super::{check_evaluation_time, expectation, Product, ValuationError};
use crate::mc::Simulation;
use pricer_core::types::RandomVariable;

/// Caplet on forward rate `component`, paying `δ max(L(T_i) - K, 0)` at
/// `T_{i+1}` on unit notional.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Caplet {
    component: usize,
    strike: f64,
}

impl Caplet {
    /// Creates a caplet on `component` struck at `strike`.
    pub fn new(component: usize, strike: f64) -> Self {
        Self { component, strike }
    }

    /// Forward rate index.
    pub fn component(&self) -> usize {
        self.component
    }

    /// Strike rate.
    pub fn strike(&self) -> f64 {
        self.strike
    }

    fn deflated_payoff(
        &self,
        simulation: &dyn Simulation,
    ) -> Result<RandomVariable, ValuationError> {
        let tenor = simulation.tenor_discretization();
        if self.component >= simulation.component_count() {
            return Err(ValuationError::invalid_product(format!(
                "caplet component {} outside tenor with {} periods",
                self.component,
                simulation.component_count()
            )));
        }
        let fixing = tenor.times()[self.component];
        let time_index = simulation.time_index(fixing)?;
        let delta = simulation.period_length(self.component)?;
        let forward = simulation.forward_rate(time_index, self.component)?;
        let payoff = (forward - self.strike).floor(0.0) * delta;
        Ok(&payoff / simulation.numeraire(self.component + 1)?)
    }
}

impl Product for Caplet {
    fn name(&self) -> &'static str {
        "caplet"
    }

    fn value(
        &self,
        evaluation_time: f64,
        simulation: &dyn Simulation,
    ) -> Result<RandomVariable, ValuationError> {
        check_evaluation_time(evaluation_time)?;
        expectation(self.name(), &self.deflated_payoff(simulation)?)
    }
}

/// A strip of caplets on consecutive forward rates with a common strike.
#[derive(Debug, Clone, PartialEq)]
pub struct Cap {
    caplets: Vec<Caplet>,
}

impl Cap {
    /// Cap on forward rates `first..last`.
    ///
    /// # Errors
    ///
    /// `InvalidProduct` if the range is empty.
    pub fn new(first: usize, last: usize, strike: f64) -> Result<Self, ValuationError> {
        if first >= last {
            return Err(ValuationError::invalid_product(format!(
                "cap needs at least one caplet, got range {first}..{last}"
            )));
        }
        Ok(Self {
            caplets: (first..last).map(|i| Caplet::new(i, strike)).collect(),
        })
    }

    /// The caplets of the cap.
    pub fn caplets(&self) -> &[Caplet] {
        &self.caplets
    }
}

impl Product for Cap {
    fn name(&self) -> &'static str {
        "cap"
    }

    fn value(
        &self,
        evaluation_time: f64,
        simulation: &dyn Simulation,
    ) -> Result<RandomVariable, ValuationError> {
        check_evaluation_time(evaluation_time)?;
        let mut deflated = RandomVariable::deterministic(0.0);
        for caplet in &self.caplets {
            deflated = deflated + caplet.deflated_payoff(simulation)?;
        }
        expectation(self.name(), &deflated)
    }
}
