//! Correlation models and factor reduction.
//!
//! A correlation model produces a `components × factors` matrix whose rows
//! have unit length, so that row inner products approximate the correlation
//! between two forward rates.

use crate::error::{check_length, ModelError};
use nalgebra::{DMatrix, SymmetricEigen};
use pricer_core::types::TimeDiscretization;
use std::fmt::Debug;

/// Correlation structure between forward rate components.
pub trait CorrelationModel: Debug + Clone + Send + Sync + 'static {
    /// Own parameters, in a fixed order.
    fn parameters(&self) -> Vec<f64>;

    /// A copy with new parameters; `parameters` has exactly the current length.
    fn with_parameters(&self, parameters: &[f64]) -> Result<Self, ModelError>;

    /// Number of factors of the reduced matrix.
    fn factor_count(&self) -> usize;

    /// Reduced factor matrix, one row per component of `tenor`.
    fn factor_matrix(&self, tenor: &TimeDiscretization) -> Result<Vec<Vec<f64>>, ModelError>;
}

/// ρ_ij = exp(-decay |T_i - T_j|), reduced to the leading factors.
///
/// # Example
///
/// ```
/// use pricer_core::types::TimeDiscretization;
/// use pricer_models::models::covariance::{CorrelationModel, ExponentialDecayCorrelation};
///
/// let tenor = TimeDiscretization::uniform(0.0, 5, 1.0).unwrap();
/// let corr = ExponentialDecayCorrelation::new(0.1, 2).unwrap();
/// let f = corr.factor_matrix(&tenor).unwrap();
///
/// assert_eq!(f.len(), 5);
/// assert_eq!(f[0].len(), 2);
/// let norm: f64 = f[3].iter().map(|x| x * x).sum();
/// assert!((norm - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialDecayCorrelation {
    decay: f64,
    factors: usize,
}

impl ExponentialDecayCorrelation {
    /// Create with a non-negative decay and at least one factor.
    pub fn new(decay: f64, factors: usize) -> Result<Self, ModelError> {
        if !decay.is_finite() || decay < 0.0 {
            return Err(ModelError::invalid_parameter(
                "correlation decay",
                decay,
                "must be finite and non-negative",
            ));
        }
        if factors == 0 {
            return Err(ModelError::invalid_parameter(
                "factor count",
                0.0,
                "must be at least one",
            ));
        }
        Ok(Self { decay, factors })
    }

    /// The decay parameter.
    pub fn decay(&self) -> f64 {
        self.decay
    }
}

impl CorrelationModel for ExponentialDecayCorrelation {
    fn parameters(&self) -> Vec<f64> {
        vec![self.decay]
    }

    fn with_parameters(&self, parameters: &[f64]) -> Result<Self, ModelError> {
        check_length(1, parameters)?;
        Self::new(parameters[0], self.factors)
    }

    fn factor_count(&self) -> usize {
        self.factors
    }

    fn factor_matrix(&self, tenor: &TimeDiscretization) -> Result<Vec<Vec<f64>>, ModelError> {
        let fixings = &tenor.times()[..tenor.number_of_steps()];
        let n = fixings.len();
        let correlation =
            DMatrix::from_fn(n, n, |i, j| (-self.decay * (fixings[i] - fixings[j]).abs()).exp());
        reduce_factors(correlation, self.factors)
    }
}

/// Reduce a correlation matrix to its `factors` leading principal components.
///
/// Rows are renormalised to unit length and each factor's sign is fixed so
/// that its first non-zero entry is positive.
pub fn reduce_factors(
    correlation: DMatrix<f64>,
    factors: usize,
) -> Result<Vec<Vec<f64>>, ModelError> {
    let n = correlation.nrows();
    if n == 0 || correlation.ncols() != n {
        return Err(ModelError::invalid_discretization(
            "correlation matrix must be square and non-empty",
        ));
    }
    if factors == 0 {
        return Err(ModelError::invalid_parameter(
            "factor count",
            0.0,
            "must be at least one",
        ));
    }
    let factors = factors.min(n);

    let eigen = SymmetricEigen::new(correlation);
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| {
        eigen.eigenvalues[j]
            .partial_cmp(&eigen.eigenvalues[i])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(i.cmp(&j))
    });

    let mut matrix = vec![vec![0.0; factors]; n];
    for (k, &column) in order.iter().take(factors).enumerate() {
        let scale = eigen.eigenvalues[column].max(0.0).sqrt();
        let vector = eigen.eigenvectors.column(column);
        let sign = match vector.iter().find(|v| v.abs() > 1e-12) {
            Some(v) if *v < 0.0 => -1.0,
            _ => 1.0,
        };
        for (i, row) in matrix.iter_mut().enumerate() {
            row[k] = sign * scale * vector[i];
        }
    }

    for row in matrix.iter_mut() {
        let norm = row.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            for x in row.iter_mut() {
                *x /= norm;
            }
        }
    }

    Ok(matrix)
}
