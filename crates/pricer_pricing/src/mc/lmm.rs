//! Log-Euler simulation of a LIBOR market model under the spot measure.
//!
//! For every alive forward (fixing date after the current time):
//!
//! ```text
//! L_i(t+Δt) = L_i(t) exp((μ_i - |λ_i|²/2) Δt + λ_i · ΔW)
//! μ_i       = λ_i · Σ_{k=q(t)}^{i} δ_k L_k λ_k / (1 + δ_k L_k)
//! ```
//!
//! where `q(t)` is the first forward not yet fixed. Fixed forwards are frozen
//! at their fixing value. The numeraire is the discretely rolled bank
//! account `N(T_m) = Π_{k<m} (1 + δ_k L_k(T_k))`.

use super::error::SimulationError;
use super::simulation::Simulation;
use pricer_core::traits::StochasticDriver;
use pricer_core::types::{RandomVariable, TimeDiscretization};
use pricer_models::models::covariance::{FactorLoadingModel, ParametricModel};
use pricer_models::models::rates::LiborMarketModel;
use std::sync::Arc;
use tracing::debug;

const FIXING_TOLERANCE: f64 = 1e-10;

/// A fully evolved LIBOR market model simulation.
///
/// Built eagerly by [`LmmSimulation::new`]; afterwards read-only.
#[derive(Debug)]
pub struct LmmSimulation {
    model: LiborMarketModel,
    driver: Arc<dyn StochasticDriver>,
    path_count: usize,
    forwards: Vec<Vec<RandomVariable>>,
    numeraires: Vec<RandomVariable>,
}

impl LmmSimulation {
    /// Evolve `model` with the increments of `driver`.
    ///
    /// # Errors
    ///
    /// - `IncompatibleDiscretization` if the driver's time grid differs from
    ///   the covariance model's, or a fixing date is not a simulation time
    /// - `InvalidConfiguration` if the driver has fewer factors than the model,
    ///   or the covariance model draws from a different driver instance
    /// - `Model` if a factor loading cannot be evaluated
    pub fn new(
        model: LiborMarketModel,
        driver: Arc<dyn StochasticDriver>,
    ) -> Result<Self, SimulationError> {
        let times = model.time_discretization();
        let tenor = model.tenor_discretization();
        let factors = model.covariance_model().factor_count();

        if driver.time_discretization() != times {
            return Err(SimulationError::incompatible(
                "driver time grid differs from the covariance model time grid",
            ));
        }
        if driver.factor_count() < factors {
            return Err(SimulationError::invalid_configuration(format!(
                "driver has {} factors, model needs {}",
                driver.factor_count(),
                factors
            )));
        }
        if let Some(embedded) = model.covariance_model().embedded_driver() {
            if embedded.path_count() != driver.path_count() {
                return Err(SimulationError::invalid_configuration(format!(
                    "covariance model driver has {} paths, simulation driver has {}",
                    embedded.path_count(),
                    driver.path_count()
                )));
            }
            if !Arc::ptr_eq(embedded, &driver) {
                return Err(SimulationError::invalid_configuration(
                    "covariance model draws from a different driver than the simulation",
                ));
            }
        }
        let fixing_indices = tenor.times()[..tenor.number_of_steps()]
            .iter()
            .map(|&fixing| {
                times.index_of(fixing).ok_or_else(|| {
                    SimulationError::incompatible(format!(
                        "fixing date {fixing} is not a simulation time"
                    ))
                })
            })
            .collect::<Result<Vec<usize>, _>>()?;

        let forwards = evolve(&model, driver.as_ref())?;

        let mut numeraires = Vec::with_capacity(fixing_indices.len() + 1);
        let mut numeraire = driver.random_variable_for_constant(1.0);
        numeraires.push(numeraire.clone());
        for (component, &time_index) in fixing_indices.iter().enumerate() {
            let delta = tenor.step(component);
            let growth = &forwards[time_index][component] * delta + 1.0;
            numeraire = (&numeraire * &growth).with_filtration_time(tenor.times()[component]);
            numeraires.push(numeraire.clone());
        }

        debug!(
            steps = times.number_of_steps(),
            components = model.component_count(),
            factors,
            paths = driver.path_count(),
            "LMM simulation built"
        );

        Ok(Self {
            path_count: driver.path_count(),
            model,
            driver,
            forwards,
            numeraires,
        })
    }

    /// The simulated model.
    pub fn model(&self) -> &LiborMarketModel {
        &self.model
    }

    /// The driver supplying the increments.
    pub fn driver(&self) -> &Arc<dyn StochasticDriver> {
        &self.driver
    }
}

fn evolve(
    model: &LiborMarketModel,
    driver: &dyn StochasticDriver,
) -> Result<Vec<Vec<RandomVariable>>, SimulationError> {
    let times = model.time_discretization();
    let tenor = model.tenor_discretization().times();
    let covariance = model.covariance_model();
    let components = model.component_count();
    let factors = covariance.factor_count();

    let mut current: Vec<RandomVariable> = model
        .initial_forwards()
        .iter()
        .map(|&forward| driver.random_variable_for_constant(forward))
        .collect();
    let mut forwards = Vec::with_capacity(times.len());
    forwards.push(current.clone());

    for j in 0..times.number_of_steps() {
        let t = times.times()[j];
        let dt = times.step(j);
        let increments = (0..factors)
            .map(|f| {
                driver
                    .increment(j, f)
                    .ok_or_else(|| SimulationError::index_out_of_range("driver factor", f, factors))
            })
            .collect::<Result<Vec<&RandomVariable>, _>>()?;

        let first_alive = tenor[..components].partition_point(|&fixing| fixing <= t + FIXING_TOLERANCE);
        let mut drift_sum = vec![RandomVariable::deterministic(0.0); factors];
        let mut next = current.clone();

        for i in first_alive..components {
            let loading = covariance.factor_loading(j, i, Some(current.as_slice()))?;
            let delta = tenor[i + 1] - tenor[i];
            let forward = &current[i];
            let weight = forward.map(|l| delta * l / (1.0 + delta * l));

            let mut drift = RandomVariable::deterministic(0.0);
            let mut variance = RandomVariable::deterministic(0.0);
            let mut diffusion = RandomVariable::deterministic(0.0);
            for (f, lambda) in loading.iter().enumerate() {
                drift_sum[f] = &drift_sum[f] + &(&weight * lambda);
                drift = drift + &(lambda * &drift_sum[f]);
                variance = variance + &(lambda * lambda);
                diffusion = diffusion + &(lambda * increments[f]);
            }

            let exponent = (drift - variance * 0.5) * dt + diffusion;
            next[i] = (forward * &exponent.exp()).with_filtration_time(times.times()[j + 1]);
        }

        forwards.push(next.clone());
        current = next;
    }

    Ok(forwards)
}

impl Simulation for LmmSimulation {
    fn time_discretization(&self) -> &TimeDiscretization {
        self.model.time_discretization()
    }

    fn tenor_discretization(&self) -> &TimeDiscretization {
        self.model.tenor_discretization()
    }

    fn path_count(&self) -> usize {
        self.path_count
    }

    fn forward_rate(
        &self,
        time_index: usize,
        component: usize,
    ) -> Result<&RandomVariable, SimulationError> {
        let row = self.forwards.get(time_index).ok_or_else(|| {
            SimulationError::index_out_of_range("time", time_index, self.forwards.len())
        })?;
        row.get(component)
            .ok_or_else(|| SimulationError::index_out_of_range("component", component, row.len()))
    }

    fn numeraire(&self, tenor_index: usize) -> Result<&RandomVariable, SimulationError> {
        self.numeraires.get(tenor_index).ok_or_else(|| {
            SimulationError::index_out_of_range("tenor", tenor_index, self.numeraires.len())
        })
    }

    fn covariance_model(&self) -> &Arc<dyn ParametricModel> {
        self.model.covariance_model()
    }
}
