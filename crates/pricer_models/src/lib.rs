//! # Pricer Models (L2: Business Logic)
//!
//! Parametric covariance models for forward rate simulation and the interest
//! rate model descriptions that consume them.
//!
//! This crate provides:
//! - Factor loading and covariance models built from a volatility and a
//!   correlation model
//! - Decorators (displaced, exponentially damped, blended, stochastic
//!   volatility) composable into calibrateable trees
//! - The LIBOR market model description and a short rate volatility model
//!
//! ## Design Principles
//!
//! - **Immutable models**: re-parameterisation returns a new model, sharing
//!   every unchanged subtree with the original
//! - **Inner-first parameter order** across decorator chains
//! - **Trait objects at the tree seams**, generics inside a node

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod error;
pub mod models;

pub use error::ModelError;
