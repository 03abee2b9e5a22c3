//! Shared helpers: activation math and deterministic random numbers.

pub mod activations;
pub mod rng;

pub use rng::SimpleRng;
