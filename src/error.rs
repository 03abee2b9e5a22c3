//! Error types for network construction and training
//!
//! Every fallible operation in the crate returns [`Result`], whose error side is
//! [`NetworkError`]. Errors are local to a single build or training step and are
//! never retried internally.

use thiserror::Error;

use crate::network::{ConnectionId, LayerId};

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Errors raised while building a network, configuring the engine or running a
/// training step.
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Two matrices that must share a shape do not.
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: String,
        actual: String,
    },

    /// A connection matched none of the backward routing rules for the given target.
    #[error("connection {connection} cannot be routed towards layer {target}")]
    UnroutedConnection {
        connection: ConnectionId,
        target: LayerId,
    },

    /// Momentum state was requested for a connection the engine was never bound to.
    #[error("no momentum state bound for connection {connection}")]
    MissingMomentumState { connection: ConnectionId },

    /// A layer id or name does not exist in the network.
    #[error("unknown layer: {0}")]
    UnknownLayer(String),

    /// Two layers were registered under the same name.
    #[error("duplicate layer name: {0}")]
    DuplicateLayer(String),

    /// The connection graph contains a cycle.
    #[error("connection graph contains a cycle through layer {0}")]
    CyclicGraph(LayerId),

    /// A trainable layer is not connected to the output layer.
    #[error("layer {0} is not connected to the output layer")]
    UnreachableLayer(LayerId),

    /// A connection is structurally invalid (self loop, constant-to-constant, ...).
    #[error("invalid connection: {0}")]
    InvalidConnection(String),

    /// An architecture description is incomplete or names an unknown layer kind.
    #[error("invalid architecture: {0}")]
    InvalidArchitecture(String),

    /// The activation map has no entry for a layer the step needs.
    #[error("missing activation for layer {0}")]
    MissingActivation(LayerId),

    /// A connection was visited before its source layer received an error signal.
    #[error("missing error signal for layer {0}")]
    MissingErrorSignal(LayerId),

    /// A hyperparameter is outside its valid range.
    #[error("invalid hyperparameter {name} = {value}: {constraint}")]
    InvalidHyperparameter {
        name: &'static str,
        value: String,
        constraint: &'static str,
    },

    /// IO errors while reading configuration files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NetworkError {
    /// Shape mismatch between two `rows x columns` shapes.
    pub fn shape(context: &'static str, expected: (usize, usize), actual: (usize, usize)) -> Self {
        Self::ShapeMismatch {
            context,
            expected: format!("{}x{}", expected.0, expected.1),
            actual: format!("{}x{}", actual.0, actual.1),
        }
    }

    /// Hyperparameter outside its valid range.
    pub fn hyperparameter(name: &'static str, value: f32, constraint: &'static str) -> Self {
        Self::InvalidHyperparameter {
            name,
            value: value.to_string(),
            constraint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_error_message() {
        let err = NetworkError::shape("weighted sum", (2, 3), (3, 2));
        assert_eq!(
            err.to_string(),
            "shape mismatch in weighted sum: expected 2x3, got 3x2"
        );
    }

    #[test]
    fn test_hyperparameter_error_message() {
        let err = NetworkError::hyperparameter("momentum", 1.5, "must be in [0, 1)");
        assert!(err.to_string().contains("momentum = 1.5"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: NetworkError = io.into();
        assert!(matches!(err, NetworkError::Io(_)));
    }
}
