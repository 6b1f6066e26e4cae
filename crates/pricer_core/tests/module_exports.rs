//! Integration tests for module exports.
//!
//! Verify that all public modules and types are reachable via absolute paths
//! and work together.

/// Types module: random variables and discretisations.
#[test]
fn test_types_module_exports() {
    use pricer_core::types::discretization::TimeDiscretization;
    use pricer_core::types::error::{DiscretizationError, SolverError};
    use pricer_core::types::random_variable::RandomVariable;

    let grid = TimeDiscretization::uniform(0.0, 2, 0.5).unwrap();
    assert_eq!(grid.times(), &[0.0, 0.5, 1.0]);

    let x = RandomVariable::from_values(grid.last(), vec![1.0, 3.0]);
    assert_eq!(x.average(), 2.0);

    let _: Option<SolverError> = None;
    let _: Option<DiscretizationError> = None;
}

/// Market data module: curves feeding initial forwards.
#[test]
fn test_market_data_module_exports() {
    use pricer_core::market_data::{DiscountCurve, FlatCurve, MarketDataError, YieldCurve};

    let flat = FlatCurve::new(0.02_f64);
    let pillars = DiscountCurve::from_zero_rates(&[1.0, 5.0], &[0.02, 0.02]).unwrap();

    for t in [0.5, 1.0, 2.5, 5.0, 7.0] {
        let a = flat.discount_factor(t).unwrap();
        let b = pillars.discount_factor(t).unwrap();
        assert!((a - b).abs() < 1e-12, "t = {}", t);
    }

    let err: MarketDataError = flat.discount_factor(-1.0).unwrap_err();
    assert!(format!("{}", err).contains("-1"));
}

/// Traits and solvers: a bounded least-squares fit.
#[test]
fn test_solver_with_constraints() {
    use pricer_core::math::solvers::{LeastSquaresProblem, LevenbergMarquardtSolver, LMConfig};
    use pricer_core::traits::{BoxConstraints, ParameterBounds};
    use pricer_core::types::SolverError;

    // Minimise (a - 2)² + (b + 1)² with b in [0, 1]
    let problem = LeastSquaresProblem::new(vec![0.5, 0.5])
        .with_bounds(BoxConstraints::new(vec![
            ParameterBounds::unbounded(),
            ParameterBounds::new(0.0, 1.0),
        ]))
        .with_steps(vec![1e-4, 1e-4]);

    let solver = LevenbergMarquardtSolver::new(LMConfig::default().with_trials_per_round(2));
    let result = solver
        .solve_batched(&problem, |candidates: &[Vec<f64>]| {
            Ok::<_, SolverError>(
                candidates
                    .iter()
                    .map(|p| vec![p[0] - 2.0, p[1] + 1.0])
                    .collect(),
            )
        })
        .unwrap();

    assert!(result.converged);
    assert!((result.params[0] - 2.0).abs() < 1e-6);
    assert_eq!(result.params[1], 0.0);
}
