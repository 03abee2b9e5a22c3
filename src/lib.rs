//! Layered neural network engine with graph-scheduled backpropagation
//!
//! A network is a directed acyclic graph of layers joined by weight matrices.
//! The forward pass evaluates it into per-layer activations; the backward pass
//! walks a schedule fixed at build time and updates every weight by gradient
//! descent with momentum.
//!
//! # Modules
//!
//! - `matrix`: flat buffers with row-major and column-major addressing
//! - `network`: layers, connections, graph validation and scheduling
//! - `kernels`: the weighted-sum kernel and its dispatch backends
//! - `forward`: activation maps for a batch
//! - `training`: backpropagation engine, derivative kernels and the trainer
//! - `optimizers`: the momentum update rule
//! - `config` / `architecture`: JSON hyperparameters and topologies
//! - `utils`: RNG and activation functions

pub mod architecture;
pub mod buffers;
pub mod config;
pub mod error;
pub mod forward;
pub mod kernels;
pub mod matrix;
pub mod network;
pub mod optimizers;
pub mod training;
pub mod utils;

pub use error::{NetworkError, Result};
pub use forward::FeedForward;
pub use matrix::Matrix;
pub use network::{Network, NetworkBuilder};
pub use training::{BackPropagation, Trainer};
