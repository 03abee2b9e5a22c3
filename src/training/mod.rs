//! Backward pass and training loop
//!
//! - [`derivative`]: sigmoid-derivative hook, momentum weight updates and the
//!   output-error seed
//! - [`BackPropagation`]: the engine running a network's backward schedule
//! - [`Trainer`]: forward pass, seed error and backward pass as one step

mod backprop;
pub mod derivative;
mod trainer;

pub use backprop::BackPropagation;
pub use derivative::{apply_weight_updates, output_error_derivative, SigmoidDerivative};
pub use trainer::Trainer;
