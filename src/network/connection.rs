//! Connections: weighted edges between two layers

use std::fmt;

use super::LayerId;
use crate::matrix::Matrix;

/// Index of a connection inside its [`Network`](super::Network).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub(crate) usize);

impl ConnectionId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "connection#{}", self.0)
    }
}

/// Weighted edge `input -> output`.
///
/// The weight matrix has one row per unit of the output layer and one column
/// per unit of the input layer, so the forward contribution is
/// `output += weights * input`.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    input: LayerId,
    output: LayerId,
    weights: Matrix,
}

impl Connection {
    pub(crate) fn new(id: ConnectionId, input: LayerId, output: LayerId, weights: Matrix) -> Self {
        Self {
            id,
            input,
            output,
            weights,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn input_layer(&self) -> LayerId {
        self.input
    }

    pub fn output_layer(&self) -> LayerId {
        self.output
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    /// Mutable weights, for training and persistence collaborators.
    ///
    /// The shape cannot change through this handle.
    pub fn weights_mut(&mut self) -> &mut [f32] {
        self.weights.elements_mut()
    }

    pub(crate) fn weights_matrix_mut(&mut self) -> &mut Matrix {
        &mut self.weights
    }

    /// The endpoint opposite to `layer`, if `layer` is an endpoint.
    pub fn opposite(&self, layer: LayerId) -> Option<LayerId> {
        if layer == self.input {
            Some(self.output)
        } else if layer == self.output {
            Some(self.input)
        } else {
            None
        }
    }
}
