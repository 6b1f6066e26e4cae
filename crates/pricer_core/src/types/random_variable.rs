//! Path-wise stochastic scalars.
//!
//! A [`RandomVariable`] is either deterministic (a single value valid on every
//! path) or stochastic (one value per Monte Carlo path). It carries the
//! filtration time at which it is known.
//!
//! Binary operations between two stochastic operands require equal path
//! counts; a mismatch is a programming error and panics, in the same way that
//! out-of-bounds indexing does.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
enum Values {
    Deterministic(f64),
    Stochastic(Arc<[f64]>),
}

/// A deterministic or path-wise stochastic scalar.
///
/// Path values are stored behind an `Arc`, so clones are cheap and instances
/// can be shared across threads.
///
/// # Example
///
/// ```
/// use pricer_core::types::RandomVariable;
///
/// let x = RandomVariable::from_values(0.5, vec![1.0, 2.0, 3.0, 4.0]);
/// let y = &x * 2.0 + 1.0;
///
/// assert_eq!(y.get(3), 9.0);
/// assert!((y.average() - 6.0).abs() < 1e-15);
/// assert_eq!(y.filtration_time(), 0.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RandomVariable {
    filtration_time: f64,
    values: Values,
}

impl RandomVariable {
    /// Create a deterministic random variable known at time zero.
    pub fn deterministic(value: f64) -> Self {
        Self::constant(0.0, value)
    }

    /// Create a deterministic random variable known at `filtration_time`.
    pub fn constant(filtration_time: f64, value: f64) -> Self {
        Self {
            filtration_time,
            values: Values::Deterministic(value),
        }
    }

    /// Create a stochastic random variable from path values.
    ///
    /// A single path value is stored as a deterministic random variable.
    pub fn from_values(filtration_time: f64, values: Vec<f64>) -> Self {
        if values.len() == 1 {
            return Self::constant(filtration_time, values[0]);
        }
        Self {
            filtration_time,
            values: Values::Stochastic(values.into()),
        }
    }

    /// Time at which the value is known.
    #[inline]
    pub fn filtration_time(&self) -> f64 {
        self.filtration_time
    }

    /// Return a copy with a different filtration time.
    pub fn with_filtration_time(&self, filtration_time: f64) -> Self {
        Self {
            filtration_time,
            values: self.values.clone(),
        }
    }

    /// Whether the value is the same on every path.
    #[inline]
    pub fn is_deterministic(&self) -> bool {
        matches!(self.values, Values::Deterministic(_))
    }

    /// Number of stored values: one for deterministic, the path count otherwise.
    #[inline]
    pub fn size(&self) -> usize {
        match &self.values {
            Values::Deterministic(_) => 1,
            Values::Stochastic(v) => v.len(),
        }
    }

    /// Value on path `path`. Deterministic values are returned for any path.
    ///
    /// # Panics
    ///
    /// Panics if the variable is stochastic and `path` is out of bounds.
    #[inline]
    pub fn get(&self, path: usize) -> f64 {
        match &self.values {
            Values::Deterministic(x) => *x,
            Values::Stochastic(v) => v[path],
        }
    }

    /// The deterministic value, if this random variable is deterministic.
    pub fn as_scalar(&self) -> Option<f64> {
        match self.values {
            Values::Deterministic(x) => Some(x),
            Values::Stochastic(_) => None,
        }
    }

    /// Path values materialised as a vector of length `size()`.
    pub fn to_vec(&self) -> Vec<f64> {
        match &self.values {
            Values::Deterministic(x) => vec![*x],
            Values::Stochastic(v) => v.to_vec(),
        }
    }

    /// Apply `f` to every path value.
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        let values = match &self.values {
            Values::Deterministic(x) => Values::Deterministic(f(*x)),
            Values::Stochastic(v) => Values::Stochastic(v.iter().map(|&x| f(x)).collect()),
        };
        Self {
            filtration_time: self.filtration_time,
            values,
        }
    }

    /// Combine two random variables path by path.
    ///
    /// The filtration time of the result is the later of the two.
    ///
    /// # Panics
    ///
    /// Panics if both operands are stochastic with different path counts.
    pub fn zip_with<F: Fn(f64, f64) -> f64>(&self, other: &Self, f: F) -> Self {
        let filtration_time = self.filtration_time.max(other.filtration_time);
        let values = match (&self.values, &other.values) {
            (Values::Deterministic(a), Values::Deterministic(b)) => Values::Deterministic(f(*a, *b)),
            (Values::Deterministic(a), Values::Stochastic(b)) => {
                Values::Stochastic(b.iter().map(|&y| f(*a, y)).collect())
            }
            (Values::Stochastic(a), Values::Deterministic(b)) => {
                Values::Stochastic(a.iter().map(|&x| f(x, *b)).collect())
            }
            (Values::Stochastic(a), Values::Stochastic(b)) => {
                assert_eq!(
                    a.len(),
                    b.len(),
                    "random variables have different path counts"
                );
                Values::Stochastic(a.iter().zip(b.iter()).map(|(&x, &y)| f(x, y)).collect())
            }
        };
        Self {
            filtration_time,
            values,
        }
    }

    /// Path-wise exponential.
    pub fn exp(&self) -> Self {
        self.map(f64::exp)
    }

    /// Path-wise natural logarithm.
    pub fn log(&self) -> Self {
        self.map(f64::ln)
    }

    /// Path-wise square root.
    pub fn sqrt(&self) -> Self {
        self.map(f64::sqrt)
    }

    /// Path-wise absolute value.
    pub fn abs(&self) -> Self {
        self.map(f64::abs)
    }

    /// Path-wise `max(x, floor)`.
    pub fn floor(&self, floor: f64) -> Self {
        self.map(|x| x.max(floor))
    }

    /// Path-wise `min(x, cap)`.
    pub fn cap(&self, cap: f64) -> Self {
        self.map(|x| x.min(cap))
    }

    /// Path-wise `max(x, y)`.
    pub fn max(&self, other: &Self) -> Self {
        self.zip_with(other, f64::max)
    }

    /// Mean over paths.
    pub fn average(&self) -> f64 {
        match &self.values {
            Values::Deterministic(x) => *x,
            Values::Stochastic(v) => v.iter().sum::<f64>() / v.len() as f64,
        }
    }

    /// Population variance over paths (zero for deterministic values).
    pub fn variance(&self) -> f64 {
        match &self.values {
            Values::Deterministic(_) => 0.0,
            Values::Stochastic(v) => {
                let mean = self.average();
                v.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / v.len() as f64
            }
        }
    }

    /// Whether every path value is finite.
    pub fn is_finite(&self) -> bool {
        match &self.values {
            Values::Deterministic(x) => x.is_finite(),
            Values::Stochastic(v) => v.iter().all(|x| x.is_finite()),
        }
    }
}

impl From<f64> for RandomVariable {
    fn from(value: f64) -> Self {
        Self::deterministic(value)
    }
}

impl fmt::Display for RandomVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.values {
            Values::Deterministic(x) => write!(f, "{} (t={})", x, self.filtration_time),
            Values::Stochastic(v) => write!(
                f,
                "mean {} over {} paths (t={})",
                self.average(),
                v.len(),
                self.filtration_time
            ),
        }
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $op:tt) => {
        impl $trait<&RandomVariable> for &RandomVariable {
            type Output = RandomVariable;
            fn $method(self, rhs: &RandomVariable) -> RandomVariable {
                self.zip_with(rhs, |a, b| a $op b)
            }
        }

        impl $trait<RandomVariable> for RandomVariable {
            type Output = RandomVariable;
            fn $method(self, rhs: RandomVariable) -> RandomVariable {
                (&self).$method(&rhs)
            }
        }

        impl $trait<&RandomVariable> for RandomVariable {
            type Output = RandomVariable;
            fn $method(self, rhs: &RandomVariable) -> RandomVariable {
                (&self).$method(rhs)
            }
        }

        impl $trait<f64> for &RandomVariable {
            type Output = RandomVariable;
            fn $method(self, rhs: f64) -> RandomVariable {
                self.map(|a| a $op rhs)
            }
        }

        impl $trait<f64> for RandomVariable {
            type Output = RandomVariable;
            fn $method(self, rhs: f64) -> RandomVariable {
                (&self).$method(rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, +);
impl_binary_op!(Sub, sub, -);
impl_binary_op!(Mul, mul, *);
impl_binary_op!(Div, div, /);

impl Neg for &RandomVariable {
    type Output = RandomVariable;
    fn neg(self) -> RandomVariable {
        self.map(|x| -x)
    }
}

impl Neg for RandomVariable {
    type Output = RandomVariable;
    fn neg(self) -> RandomVariable {
        -&self
    }
}
