//! Layers: named nodes of the connection graph

use std::fmt;

/// Index of a layer inside its [`Network`](super::Network).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub(crate) usize);

impl LayerId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// How a layer produces its activation.
///
/// Resolved once when the layer is declared; the backward pass routes each
/// connection by matching on this tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActivationStrategy {
    /// Weighted sum of incoming connections followed by the logistic sigmoid.
    Trainable,
    /// Fixed activation, e.g. a bias unit that always emits `1.0`.
    Constant { value: f32 },
}

impl ActivationStrategy {
    /// Bias unit emitting `1.0`.
    pub fn bias() -> Self {
        ActivationStrategy::Constant { value: 1.0 }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, ActivationStrategy::Constant { .. })
    }
}

/// A node of the network graph.
#[derive(Debug, Clone)]
pub struct Layer {
    id: LayerId,
    name: String,
    units: usize,
    strategy: ActivationStrategy,
}

impl Layer {
    pub(crate) fn new(id: LayerId, name: String, units: usize, strategy: ActivationStrategy) -> Self {
        Self {
            id,
            name,
            units,
            strategy,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of units (rows of this layer's activation matrix).
    pub fn units(&self) -> usize {
        self.units
    }

    pub fn strategy(&self) -> ActivationStrategy {
        self.strategy
    }

    pub fn is_constant(&self) -> bool {
        self.strategy.is_constant()
    }
}
