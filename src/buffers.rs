//! Per-layer matrices: activation maps and error maps
//!
//! Slots are indexed by [`LayerId`], so lookups never hash and a map built for
//! one network lines up with its layer arena.

use crate::error::{NetworkError, Result};
use crate::matrix::Matrix;
use crate::network::LayerId;

/// One optional matrix per layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerMatrices {
    slots: Vec<Option<Matrix>>,
}

impl LayerMatrices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `matrix` for `layer`, returning the previous one.
    pub fn insert(&mut self, layer: LayerId, matrix: Matrix) -> Option<Matrix> {
        if self.slots.len() <= layer.index() {
            self.slots.resize(layer.index() + 1, None);
        }
        self.slots[layer.index()].replace(matrix)
    }

    pub fn get(&self, layer: LayerId) -> Option<&Matrix> {
        self.slots.get(layer.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, layer: LayerId) -> Option<&mut Matrix> {
        self.slots.get_mut(layer.index()).and_then(Option::as_mut)
    }

    pub fn take(&mut self, layer: LayerId) -> Option<Matrix> {
        self.slots.get_mut(layer.index()).and_then(Option::take)
    }

    pub fn contains(&self, layer: LayerId) -> bool {
        self.get(layer).is_some()
    }

    /// Activation of `layer`, or [`NetworkError::MissingActivation`].
    pub fn activation(&self, layer: LayerId) -> Result<&Matrix> {
        self.get(layer).ok_or(NetworkError::MissingActivation(layer))
    }

    /// Zero-filled `shape` buffer for `layer`, reusing the existing allocation
    /// when its shape already matches.
    pub fn reset(&mut self, layer: LayerId, shape: (usize, usize)) -> &mut Matrix {
        let reusable = self.get(layer).map(Matrix::shape) == Some(shape);
        if !reusable {
            self.insert(layer, Matrix::zeros(shape.0, shape.1));
        }
        let index = layer.index();
        let matrix = self.slots[index].get_or_insert_with(|| Matrix::zeros(shape.0, shape.1));
        matrix.fill(0.0);
        matrix
    }

    /// `(layer, matrix)` pairs for occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = (LayerId, &Matrix)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|m| (LayerId(i), m)))
    }
}
