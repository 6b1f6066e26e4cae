//! # Random Number Generation
//!
//! Seeded pseudo-random numbers for the Monte Carlo drivers. All generators
//! are reproducible from a 64-bit seed.

mod prng;

pub use prng::PricerRng;
