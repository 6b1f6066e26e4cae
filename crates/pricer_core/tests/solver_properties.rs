//! Property tests for the bounded least-squares solver and its constraints.

use pricer_core::math::solvers::{LMConfig, LeastSquaresProblem, LevenbergMarquardtSolver};
use pricer_core::traits::BoxConstraints;
use pricer_core::types::{SolverError, TimeDiscretization};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn projection_lands_inside_bounds(
        lower in prop::collection::vec(-10.0..0.0f64, 3),
        width in prop::collection::vec(0.0..10.0f64, 3),
        x in prop::collection::vec(-50.0..50.0f64, 3),
    ) {
        let upper: Vec<f64> = lower.iter().zip(&width).map(|(l, w)| l + w).collect();
        let bounds = BoxConstraints::from_vectors(3, Some(lower.as_slice()), Some(upper.as_slice())).unwrap();
        let mut projected = x.clone();
        bounds.project(&mut projected);
        prop_assert!(bounds.contains(&projected));
        if bounds.contains(&x) {
            prop_assert_eq!(projected, x);
        }
    }

    #[test]
    fn linear_problem_solved_exactly(
        target in prop::collection::vec(-5.0..5.0f64, 1..4),
        start in -5.0..5.0f64,
    ) {
        let n = target.len();
        let solver = LevenbergMarquardtSolver::new(LMConfig::new(1e-10, 200));
        let problem = LeastSquaresProblem::new(vec![start; n]);
        let result = solver
            .solve_batched(&problem, |candidates: &[Vec<f64>]| -> Result<Vec<Vec<f64>>, SolverError> {
                Ok(candidates
                    .iter()
                    .map(|p| p.iter().zip(&target).map(|(x, t)| 2.0 * (x - t)).collect())
                    .collect())
            })
            .unwrap();
        prop_assert!(result.converged);
        for (p, t) in result.params.iter().zip(&target) {
            prop_assert!((p - t).abs() < 1e-8);
        }
    }

    #[test]
    fn uniform_grid_indices_round_trip(steps in 1usize..50, step in 0.01..2.0f64) {
        let grid = TimeDiscretization::uniform(0.0, steps, step).unwrap();
        prop_assert_eq!(grid.len(), steps + 1);
        for (i, &t) in grid.times().iter().enumerate() {
            prop_assert_eq!(grid.index_of(t), Some(i));
        }
    }
}
