//! Seeded multi-factor Brownian motion.

use super::error::SimulationError;
use crate::rng::PricerRng;
use pricer_core::traits::StochasticDriver;
use pricer_core::types::{RandomVariable, TimeDiscretization};
use std::fmt;
use std::sync::OnceLock;

/// Brownian increments `ΔW_{j,f}` for every time step `j` and factor `f`.
///
/// Increments are generated on first access, once, from a single seeded
/// generator in the order time step, factor, path. The same
/// `(time_discretization, factors, paths, seed)` therefore always yields the
/// same increments, and a shared instance can be read concurrently.
///
/// # Examples
///
/// ```rust
/// use pricer_core::traits::StochasticDriver;
/// use pricer_core::types::TimeDiscretization;
/// use pricer_pricing::mc::BrownianMotion;
///
/// let times = TimeDiscretization::uniform(0.0, 4, 0.25).unwrap();
/// let bm = BrownianMotion::new(times, 2, 1000, 31415).unwrap();
///
/// let dw = bm.increment(0, 1).unwrap();
/// assert_eq!(dw.size(), 1000);
/// assert_eq!(dw.filtration_time(), 0.25);
/// ```
pub struct BrownianMotion {
    time_discretization: TimeDiscretization,
    factor_count: usize,
    path_count: usize,
    seed: u64,
    increments: OnceLock<Vec<Vec<RandomVariable>>>,
}

impl BrownianMotion {
    /// Creates the driver; nothing is generated until first use.
    ///
    /// # Errors
    ///
    /// `SimulationError::InvalidConfiguration` if `factor_count` or
    /// `path_count` is zero.
    pub fn new(
        time_discretization: TimeDiscretization,
        factor_count: usize,
        path_count: usize,
        seed: u64,
    ) -> Result<Self, SimulationError> {
        if factor_count == 0 {
            return Err(SimulationError::invalid_configuration(
                "number of factors must be positive",
            ));
        }
        if path_count == 0 {
            return Err(SimulationError::invalid_configuration(
                "number of paths must be positive",
            ));
        }
        Ok(Self {
            time_discretization,
            factor_count,
            path_count,
            seed,
            increments: OnceLock::new(),
        })
    }

    /// The generator seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Whether the increments have been generated.
    pub fn is_generated(&self) -> bool {
        self.increments.get().is_some()
    }

    fn increments(&self) -> &[Vec<RandomVariable>] {
        self.increments.get_or_init(|| self.generate())
    }

    fn generate(&self) -> Vec<Vec<RandomVariable>> {
        let mut rng = PricerRng::from_seed(self.seed);
        let times = self.time_discretization.times();
        (0..self.time_discretization.number_of_steps())
            .map(|j| {
                let scale = self.time_discretization.step(j).sqrt();
                (0..self.factor_count)
                    .map(|_| {
                        let mut values = vec![0.0; self.path_count];
                        rng.fill_scaled_normal(&mut values, scale);
                        RandomVariable::from_values(times[j + 1], values)
                    })
                    .collect()
            })
            .collect()
    }
}

impl fmt::Debug for BrownianMotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrownianMotion")
            .field("steps", &self.time_discretization.number_of_steps())
            .field("factor_count", &self.factor_count)
            .field("path_count", &self.path_count)
            .field("seed", &self.seed)
            .field("generated", &self.is_generated())
            .finish()
    }
}

impl StochasticDriver for BrownianMotion {
    fn time_discretization(&self) -> &TimeDiscretization {
        &self.time_discretization
    }

    fn factor_count(&self) -> usize {
        self.factor_count
    }

    fn path_count(&self) -> usize {
        self.path_count
    }

    fn increment(&self, time_index: usize, factor: usize) -> Option<&RandomVariable> {
        self.increments().get(time_index)?.get(factor)
    }
}
