//! # pricer_core: Numeric Foundation for Model Calibration
//!
//! ## Layer 1 (Foundation) Role
//!
//! pricer_core serves as the bottom layer of the workspace, providing:
//! - Path-wise stochastic scalars (`types::random_variable`)
//! - Time and tenor grids (`types::discretization`)
//! - Yield curves for initial forward rates (`market_data::curves`)
//! - The stochastic driver contract and parameter bounds (`traits`)
//! - A bounded Levenberg-Marquardt least-squares solver (`math::solvers`)
//! - Error types: `SolverError`, `DiscretizationError` (`types::error`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other pricer_* crates, with minimal external dependencies:
//! - num-traits: Traits for generic numerical computation
//! - thiserror: Structured error types
//! - serde: Serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use pricer_core::types::{RandomVariable, TimeDiscretization};
//! use pricer_core::market_data::curves::{FlatCurve, YieldCurve};
//!
//! let grid = TimeDiscretization::uniform(0.0, 4, 0.5).unwrap();
//! assert_eq!(grid.len(), 5);
//!
//! let curve = FlatCurve::new(0.03_f64);
//! let forward = curve.simple_forward_rate(0.5, 1.0).unwrap();
//! assert!(forward > 0.03);
//!
//! let x = RandomVariable::from_values(1.0, vec![1.0, 2.0, 3.0]);
//! assert!((x.average() - 2.0).abs() < 1e-15);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod market_data;
pub mod math;
pub mod traits;
pub mod types;
