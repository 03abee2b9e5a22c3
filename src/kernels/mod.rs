//! Data-parallel kernels over flat matrix buffers
//!
//! The elementary kernel is the weighted sum over one connection. It visits every
//! `(row, column)` cell of its output matrix; cells are independent of each other,
//! so a backend may process them in any order. Two backends implement that
//! contract:
//!
//! - [`Dispatch::Sequential`]: a plain loop on the calling thread
//! - [`Dispatch::Parallel`]: output rows spread over the rayon thread pool
//!
//! Both produce bit-identical results because every cell is computed by exactly
//! one worker, in the same summation order.

pub mod weighted_sum;

pub use weighted_sum::{Accumulate, CellHooks, Traversal, WeightedSum};

use serde::Deserialize;

/// Execution backend for kernel invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dispatch {
    #[default]
    Sequential,
    Parallel,
}
