//! Network graph: layers, connections and the schedule derived from them
//!
//! A [`Network`] is assembled with a [`NetworkBuilder`]. Building validates the
//! graph (acyclic, every trainable layer reaches the output, no unroutable
//! connection) and fixes the forward order and backward passes once, so a
//! training step never inspects the graph shape again.
//!
//! # Example
//!
//! ```
//! use rust_neural_backprop::matrix::Matrix;
//! use rust_neural_backprop::network::{ActivationStrategy, NetworkBuilder};
//!
//! let mut builder = NetworkBuilder::new();
//! let input = builder.add_layer("input", 2, ActivationStrategy::Trainable).unwrap();
//! let output = builder.add_layer("output", 1, ActivationStrategy::Trainable).unwrap();
//! let weights = Matrix::from_vec(1, 2, vec![0.5, -0.5]).unwrap();
//! builder.connect(input, output, weights).unwrap();
//!
//! let network = builder.build(input, output).unwrap();
//! assert_eq!(network.connections().len(), 1);
//! ```

mod connection;
mod layer;
pub mod topology;

use std::collections::HashMap;

use tracing::debug;

pub use connection::{Connection, ConnectionId};
pub use layer::{ActivationStrategy, Layer, LayerId};
pub use topology::{Contribution, LayerPass, Route, Schedule};

use crate::error::{NetworkError, Result};
use crate::matrix::Matrix;
use crate::utils::SimpleRng;

/// Layers and connections with a designated input and output layer.
#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<Layer>,
    connections: Vec<Connection>,
    input: LayerId,
    output: LayerId,
    schedule: Schedule,
}

impl Network {
    pub fn input_layer(&self) -> LayerId {
        self.input
    }

    pub fn output_layer(&self) -> LayerId {
        self.output
    }

    /// Layers in declaration order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Connections in declaration order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// # Panics
    ///
    /// Panics if `id` was issued by a different network.
    pub fn layer(&self, id: LayerId) -> &Layer {
        &self.layers[id.index()]
    }

    /// # Panics
    ///
    /// Panics if `id` was issued by a different network.
    pub fn connection(&self, id: ConnectionId) -> &Connection {
        &self.connections[id.index()]
    }

    /// # Panics
    ///
    /// Panics if `id` was issued by a different network.
    pub fn connection_mut(&mut self, id: ConnectionId) -> &mut Connection {
        &mut self.connections[id.index()]
    }

    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name() == name)
    }

    /// Connections whose output is `layer`, in declaration order.
    pub fn incoming(&self, layer: LayerId) -> impl Iterator<Item = &Connection> {
        self.connections
            .iter()
            .filter(move |c| c.output_layer() == layer)
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Moves the schedule out so it can be walked while the network is mutated.
    /// Must be paired with [`restore_schedule`](Self::restore_schedule).
    pub(crate) fn take_schedule(&mut self) -> Schedule {
        std::mem::take(&mut self.schedule)
    }

    pub(crate) fn restore_schedule(&mut self, schedule: Schedule) {
        self.schedule = schedule;
    }

    /// Total number of weights over all connections.
    pub fn parameter_count(&self) -> usize {
        self.connections.iter().map(|c| c.weights().len()).sum()
    }
}

/// Incremental construction of a [`Network`].
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    layers: Vec<Layer>,
    connections: Vec<Connection>,
    names: HashMap<String, LayerId>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a layer.
    ///
    /// # Errors
    ///
    /// [`NetworkError::DuplicateLayer`] if `name` is taken,
    /// [`NetworkError::InvalidConnection`] if `units` is zero.
    pub fn add_layer(
        &mut self,
        name: impl Into<String>,
        units: usize,
        strategy: ActivationStrategy,
    ) -> Result<LayerId> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(NetworkError::DuplicateLayer(name));
        }
        if units == 0 {
            return Err(NetworkError::InvalidConnection(format!(
                "layer '{}' must have at least one unit",
                name
            )));
        }

        let id = LayerId(self.layers.len());
        self.names.insert(name.clone(), id);
        self.layers.push(Layer::new(id, name, units, strategy));
        Ok(id)
    }

    /// Looks up a declared layer by name.
    pub fn layer_id(&self, name: &str) -> Result<LayerId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| NetworkError::UnknownLayer(name.to_string()))
    }

    /// Connects `input -> output` with explicit weights of shape
    /// `units(output) x units(input)`.
    ///
    /// # Errors
    ///
    /// [`NetworkError::UnknownLayer`] for foreign ids, [`NetworkError::ShapeMismatch`]
    /// for wrongly shaped weights, [`NetworkError::InvalidConnection`] for self loops
    /// and connections between two constant layers.
    pub fn connect(&mut self, input: LayerId, output: LayerId, weights: Matrix) -> Result<ConnectionId> {
        let (input_units, output_units) = (self.units(input)?, self.units(output)?);
        weights.ensure_shape("connection weights", (output_units, input_units))?;

        if input == output {
            return Err(NetworkError::InvalidConnection(format!(
                "self loop on {}",
                input
            )));
        }
        if self.layers[input.index()].is_constant() && self.layers[output.index()].is_constant() {
            return Err(NetworkError::InvalidConnection(format!(
                "{} and {} are both constant",
                input, output
            )));
        }

        let id = ConnectionId(self.connections.len());
        self.connections.push(Connection::new(id, input, output, weights));
        Ok(id)
    }

    /// Connects `input -> output` with Xavier-uniform weights drawn from `rng`.
    pub fn connect_xavier(&mut self, input: LayerId, output: LayerId, rng: &mut SimpleRng) -> Result<ConnectionId> {
        let (input_units, output_units) = (self.units(input)?, self.units(output)?);
        let weights = Matrix::from_vec(
            output_units,
            input_units,
            rng.xavier_uniform(input_units, output_units, input_units * output_units),
        )?;
        self.connect(input, output, weights)
    }

    /// Validates the graph and fixes its schedule.
    ///
    /// # Errors
    ///
    /// [`NetworkError::CyclicGraph`], [`NetworkError::UnreachableLayer`],
    /// [`NetworkError::UnroutedConnection`] or [`NetworkError::InvalidConnection`]
    /// when the graph cannot be trained.
    pub fn build(self, input: LayerId, output: LayerId) -> Result<Network> {
        self.units(input)?;
        self.units(output)?;
        if self.layers[output.index()].is_constant() {
            return Err(NetworkError::InvalidConnection(format!(
                "output {} cannot be a constant layer",
                output
            )));
        }

        let schedule = Schedule::plan(&self.layers, &self.connections, input, output)?;
        debug!(
            layers = self.layers.len(),
            connections = self.connections.len(),
            "built network"
        );

        Ok(Network {
            layers: self.layers,
            connections: self.connections,
            input,
            output,
            schedule,
        })
    }

    fn units(&self, id: LayerId) -> Result<usize> {
        self.layers
            .get(id.index())
            .map(Layer::units)
            .ok_or_else(|| NetworkError::UnknownLayer(id.to_string()))
    }
}
