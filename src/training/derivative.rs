//! Sigmoid-derivative kernels of the backward pass
//!
//! A backward visit of one connection runs in two data-parallel phases:
//!
//! 1. the weighted sum of the source error into the target error buffer, with an
//!    `after` hook that scales the fully accumulated sum by `a * (1 - a)` of the
//!    target activation;
//! 2. the momentum-weighted update of every weight, partitioned by weight row.
//!
//! Phase 2 only reads the source error and the target activation, so every
//! summation sees the weights as they were before the visit.

use rayon::prelude::*;

use crate::error::{NetworkError, Result};
use crate::kernels::{CellHooks, Dispatch, Traversal};
use crate::matrix::Matrix;
use crate::optimizers::Momentum;
use crate::utils::activations::sigmoid_derivative;

/// `after` hook scaling the accumulated error by the sigmoid derivative.
///
/// Scaling is switched off for every contribution but the last one into a
/// layer, so the derivative multiplies the complete sum exactly once.
#[derive(Debug, Clone, Copy)]
pub struct SigmoidDerivative<'a> {
    activation: &'a Matrix,
    scale: bool,
}

impl<'a> SigmoidDerivative<'a> {
    pub fn new(activation: &'a Matrix, scale: bool) -> Self {
        Self { activation, scale }
    }
}

impl CellHooks for SigmoidDerivative<'_> {
    fn after(&self, row: usize, column: usize, sum: f32) -> f32 {
        if self.scale {
            sum * sigmoid_derivative(self.activation.get(row, column))
        } else {
            sum
        }
    }
}

/// Applies the momentum update to every weight of one connection.
///
/// For weight `W[p, q]` the source unit `s` and target unit `t` are `(q, p)` by
/// rows and `(p, q)` by columns; the update signal for batch column `c` is
/// `source[s, c] * activation[t, c]`. Columns are applied in order, each one
/// chaining onto the previous update through `velocity`.
///
/// # Errors
///
/// [`NetworkError::ShapeMismatch`] if `velocity` is not shaped like `weights`, or
/// if `source` / `activation` do not match the traversal.
pub fn apply_weight_updates(
    traversal: Traversal,
    weights: &mut Matrix,
    velocity: &mut Matrix,
    source: &Matrix,
    activation: &Matrix,
    rule: Momentum,
    dispatch: Dispatch,
) -> Result<()> {
    velocity.ensure_shape("momentum binding", weights.shape())?;
    let batch = source.columns();
    let (source_rows, target_rows) = match traversal {
        Traversal::ByRows => (weights.columns(), weights.rows()),
        Traversal::ByColumns => (weights.rows(), weights.columns()),
    };
    source.ensure_shape("weight update source", (source_rows, batch))?;
    activation.ensure_shape("weight update activation", (target_rows, batch))?;

    let columns = weights.columns();
    if weights.is_empty() || batch == 0 {
        return Ok(());
    }

    let update_row = |(p, (row, velocities)): (usize, (&mut [f32], &mut [f32]))| {
        for (q, (weight, previous)) in row.iter_mut().zip(velocities.iter_mut()).enumerate() {
            let (s, t) = match traversal {
                Traversal::ByRows => (q, p),
                Traversal::ByColumns => (p, q),
            };
            for column in 0..batch {
                let signal = source.get(s, column) * activation.get(t, column);
                rule.apply(weight, previous, signal);
            }
        }
    };

    match dispatch {
        Dispatch::Sequential => weights
            .elements_mut()
            .chunks_mut(columns)
            .zip(velocity.elements_mut().chunks_mut(columns))
            .enumerate()
            .for_each(&update_row),
        Dispatch::Parallel => weights
            .elements_mut()
            .par_chunks_mut(columns)
            .zip(velocity.elements_mut().par_chunks_mut(columns))
            .enumerate()
            .for_each(&update_row),
    }

    Ok(())
}

/// Seed error of the output layer: `(target - a) * a * (1 - a)` per cell.
///
/// # Errors
///
/// [`NetworkError::ShapeMismatch`] if the element counts or the column counts of
/// `activation` and `target` differ.
///
/// # Example
///
/// ```
/// use rust_neural_backprop::matrix::Matrix;
/// use rust_neural_backprop::training::output_error_derivative;
///
/// let error = output_error_derivative(&Matrix::column(&[0.5]), &Matrix::column(&[1.0])).unwrap();
/// assert_eq!(error.elements(), &[0.125]);
/// ```
pub fn output_error_derivative(activation: &Matrix, target: &Matrix) -> Result<Matrix> {
    if activation.len() != target.len() || activation.columns() != target.columns() {
        return Err(NetworkError::shape(
            "output error derivative",
            activation.shape(),
            target.shape(),
        ));
    }

    let mut result = Matrix::like(activation);
    for ((out, &a), &t) in result
        .elements_mut()
        .iter_mut()
        .zip(activation.elements())
        .zip(target.elements())
    {
        *out = (t - a) * sigmoid_derivative(a);
    }
    Ok(result)
}
