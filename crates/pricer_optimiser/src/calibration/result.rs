//! Calibration results.

use super::engine::EngineState;
use pricer_core::math::solvers::Termination;
use std::time::Duration;

/// Outcome of a calibration run.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationResult {
    /// Best-fit parameters.
    pub parameters: Vec<f64>,
    /// Optimiser iterations; 0 when there was nothing to optimise.
    pub iterations: usize,
    /// Weighted error per instrument at `parameters`.
    pub errors: Vec<f64>,
    /// Root mean square of `errors`.
    pub rms: f64,
    /// Terminal engine state.
    pub state: EngineState,
    /// Optimiser termination reason, if the optimiser ran.
    pub termination: Option<Termination>,
    /// Wall-clock duration of the run.
    pub duration: Duration,
}

impl CalibrationResult {
    /// Whether the run converged.
    pub fn is_converged(&self) -> bool {
        self.state == EngineState::Converged
    }

    /// Largest absolute error, 0 for an empty error vector.
    pub fn max_error(&self) -> f64 {
        self.errors.iter().fold(0.0, |m, e| m.max(e.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_error_and_convergence() {
        let result = CalibrationResult {
            parameters: vec![0.2],
            iterations: 5,
            errors: vec![0.1, -0.3, 0.2],
            rms: 0.0,
            state: EngineState::Converged,
            termination: Some(Termination::ResidualTolerance),
            duration: Duration::ZERO,
        };
        assert_eq!(result.max_error(), 0.3);
        assert!(result.is_converged());

        let stopped = CalibrationResult {
            state: EngineState::MaxIterationsReached,
            errors: Vec::new(),
            ..result
        };
        assert!(!stopped.is_converged());
        assert_eq!(stopped.max_error(), 0.0);
    }
}
