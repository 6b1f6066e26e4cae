//! Physically settled payer swaptions.

use super::{check_evaluation_time, expectation, Product, ValuationError};
use crate::mc::Simulation;
use pricer_core::types::RandomVariable;

/// Payer swaption exercised at tenor date `T_e` into the swap paying fixed
/// `K` over periods `e..end`.
///
/// Exercise value at `T_e`:
///
/// ```text
/// max(Σ_{k=e}^{end-1} δ_k (L_k(T_e) - K) P(T_e, T_{k+1}), 0)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Swaption {
    exercise: usize,
    end: usize,
    strike: f64,
}

impl Swaption {
    /// Creates the swaption.
    ///
    /// # Errors
    ///
    /// `InvalidProduct` if the underlying swap has no periods.
    pub fn new(exercise: usize, end: usize, strike: f64) -> Result<Self, ValuationError> {
        if exercise >= end {
            return Err(ValuationError::invalid_product(format!(
                "swaption exercise index {exercise} must precede swap end {end}"
            )));
        }
        Ok(Self {
            exercise,
            end,
            strike,
        })
    }

    /// Tenor index of the exercise date.
    pub fn exercise(&self) -> usize {
        self.exercise
    }

    /// Tenor index of the swap end date.
    pub fn end(&self) -> usize {
        self.end
    }
}

impl Product for Swaption {
    fn name(&self) -> &'static str {
        "swaption"
    }

    fn value(
        &self,
        evaluation_time: f64,
        simulation: &dyn Simulation,
    ) -> Result<RandomVariable, ValuationError> {
        check_evaluation_time(evaluation_time)?;
        if self.end > simulation.component_count() {
            return Err(ValuationError::invalid_product(format!(
                "swap end {} beyond tenor with {} periods",
                self.end,
                simulation.component_count()
            )));
        }
        let exercise_time = simulation.tenor_discretization().times()[self.exercise];
        let time_index = simulation.time_index(exercise_time)?;

        let mut discount = RandomVariable::deterministic(1.0);
        let mut swap = RandomVariable::deterministic(0.0);
        for k in self.exercise..self.end {
            let delta = simulation.period_length(k)?;
            let forward = simulation.forward_rate(time_index, k)?;
            discount = &discount / &(forward * delta + 1.0);
            swap = swap + (forward - self.strike) * delta * &discount;
        }

        let payoff = swap.floor(0.0);
        expectation(self.name(), &(&payoff / simulation.numeraire(self.exercise)?))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{bond, simulation, FORWARDS};
    use super::super::Caplet;
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_single_period_equals_caplet() {
        let sim = simulation(0.2, 2000);
        let swaption = Swaption::new(2, 3, 0.033).unwrap();
        let caplet = Caplet::new(2, 0.033);
        assert_relative_eq!(
            swaption.value(0.0, &sim).unwrap().get(0),
            caplet.value(0.0, &sim).unwrap().get(0),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_zero_volatility_in_the_money() {
        let sim = simulation(0.0, 10);
        let strike = 0.02;
        let swaption = Swaption::new(1, 4, strike).unwrap();
        let expected: f64 = (1..4)
            .map(|k| 0.5 * (FORWARDS[k] - strike) * bond(k + 1))
            .sum();
        assert_relative_eq!(
            swaption.value(0.0, &sim).unwrap().get(0),
            expected,
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_zero_volatility_out_of_the_money() {
        let sim = simulation(0.0, 10);
        let swaption = Swaption::new(1, 4, 0.05).unwrap();
        assert_eq!(swaption.value(0.0, &sim).unwrap().get(0), 0.0);
    }

    #[test]
    fn test_invalid() {
        assert!(Swaption::new(2, 2, 0.03).is_err());
        let sim = simulation(0.2, 10);
        let swaption = Swaption::new(2, 5, 0.03).unwrap();
        assert!(matches!(
            swaption.value(0.0, &sim),
            Err(ValuationError::InvalidProduct(_))
        ));
    }
}
