//! Build-time scheduling of forward and backward traversals
//!
//! The forward order is a topological order of the whole connection graph. The
//! backward schedule walks trainable layers in reverse topological order; every
//! layer pass lists the connections whose error contributions are summed into
//! that layer before its sigmoid-derivative scaling. Connections touching a
//! constant layer are scheduled last, once every trainable error is final.

use std::collections::VecDeque;

use tracing::debug;

use super::{Connection, ConnectionId, Layer, LayerId};
use crate::error::{NetworkError, Result};
use crate::kernels::Traversal;

/// How one connection is processed by a backward visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Input layer is constant: identity calculation, then the column-wise kernel.
    ConstantInput,
    /// Output layer is constant: identity calculation, then the row-wise kernel.
    ConstantOutput,
    /// Target is the connection's output layer: row-wise kernel.
    ByRows,
    /// Target is the connection's input layer: column-wise kernel.
    ByColumns,
}

impl Route {
    pub fn traversal(self) -> Traversal {
        match self {
            Route::ConstantInput | Route::ByColumns => Traversal::ByColumns,
            Route::ConstantOutput | Route::ByRows => Traversal::ByRows,
        }
    }

    /// Whether the visit materialises a constant layer's activation first.
    pub fn runs_identity(self) -> bool {
        matches!(self, Route::ConstantInput | Route::ConstantOutput)
    }

    /// Layer whose error buffer the kernel writes.
    pub fn kernel_target(self, connection: &Connection) -> LayerId {
        match self.traversal() {
            Traversal::ByColumns => connection.input_layer(),
            Traversal::ByRows => connection.output_layer(),
        }
    }

    /// Layer whose error signal the kernel reads.
    pub fn kernel_source(self, connection: &Connection) -> LayerId {
        match self.traversal() {
            Traversal::ByColumns => connection.output_layer(),
            Traversal::ByRows => connection.input_layer(),
        }
    }
}

/// Picks the route of `connection` when the traversal is calculating `target`.
///
/// Rules are tried in order: constant input layer, constant output layer,
/// target is the output layer, target is the input layer.
///
/// # Errors
///
/// [`NetworkError::UnroutedConnection`] when no rule applies, i.e. neither
/// endpoint is constant and `target` is not an endpoint.
pub fn route(connection: &Connection, layers: &[Layer], target: LayerId) -> Result<Route> {
    let input = &layers[connection.input_layer().index()];
    let output = &layers[connection.output_layer().index()];

    if input.is_constant() {
        Ok(Route::ConstantInput)
    } else if output.is_constant() {
        Ok(Route::ConstantOutput)
    } else if target == connection.output_layer() {
        Ok(Route::ByRows)
    } else if target == connection.input_layer() {
        Ok(Route::ByColumns)
    } else {
        Err(NetworkError::UnroutedConnection {
            connection: connection.id(),
            target,
        })
    }
}

/// One connection contributing to a layer pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contribution {
    pub connection: ConnectionId,
    pub source: LayerId,
    pub route: Route,
}

/// All contributions summed into `target` before it is scaled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerPass {
    pub target: LayerId,
    pub contributions: Vec<Contribution>,
}

/// Forward order and backward passes of a network, fixed at build time.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    forward: Vec<LayerId>,
    backward: Vec<LayerPass>,
}

impl Schedule {
    /// Every layer, each after all layers feeding it.
    pub fn forward_order(&self) -> &[LayerId] {
        &self.forward
    }

    /// Layer passes in the order the backward pass runs them.
    pub fn backward_passes(&self) -> &[LayerPass] {
        &self.backward
    }

    pub(crate) fn plan(
        layers: &[Layer],
        connections: &[Connection],
        input: LayerId,
        output: LayerId,
    ) -> Result<Self> {
        let forward = topological_order(layers.len(), connections)?;
        let trainable = |c: &Connection| {
            !layers[c.input_layer().index()].is_constant()
                && !layers[c.output_layer().index()].is_constant()
        };

        ensure_reaches_output(layers, connections, output, &trainable)?;
        if layers[input.index()].is_constant() {
            return Err(NetworkError::InvalidConnection(format!(
                "input {} cannot be a constant layer",
                input
            )));
        }

        let mut backward = Vec::new();
        for &layer in forward.iter().rev() {
            if layer == output || layers[layer.index()].is_constant() {
                continue;
            }
            let contributions = connections
                .iter()
                .filter(|&c| trainable(c) && c.input_layer() == layer)
                .map(|c| contribution(c, layers, layer))
                .collect::<Result<Vec<_>>>()?;
            if !contributions.is_empty() {
                backward.push(LayerPass {
                    target: layer,
                    contributions,
                });
            }
        }

        // Constant layers act as sinks: their passes read finished trainable errors.
        for layer in layers.iter().filter(|l| l.is_constant()) {
            let contributions = connections
                .iter()
                .filter(|c| c.opposite(layer.id()).is_some())
                .map(|c| contribution(c, layers, layer.id()))
                .collect::<Result<Vec<_>>>()?;
            if !contributions.is_empty() {
                backward.push(LayerPass {
                    target: layer.id(),
                    contributions,
                });
            }
        }

        debug!(
            layers = layers.len(),
            connections = connections.len(),
            passes = backward.len(),
            "planned network schedule"
        );

        Ok(Self { forward, backward })
    }
}

fn contribution(connection: &Connection, layers: &[Layer], target: LayerId) -> Result<Contribution> {
    let route = route(connection, layers, target)?;
    Ok(Contribution {
        connection: connection.id(),
        source: route.kernel_source(connection),
        route,
    })
}

/// Kahn's algorithm, ties broken by layer id.
fn topological_order(layer_count: usize, connections: &[Connection]) -> Result<Vec<LayerId>> {
    let mut in_degree = vec![0usize; layer_count];
    let mut successors = vec![Vec::new(); layer_count];
    for connection in connections {
        in_degree[connection.output_layer().index()] += 1;
        successors[connection.input_layer().index()].push(connection.output_layer());
    }

    let mut ready: VecDeque<LayerId> = (0..layer_count)
        .filter(|&i| in_degree[i] == 0)
        .map(LayerId)
        .collect();
    let mut order = Vec::with_capacity(layer_count);

    while let Some(layer) = ready.pop_front() {
        order.push(layer);
        for &next in &successors[layer.index()] {
            in_degree[next.index()] -= 1;
            if in_degree[next.index()] == 0 {
                ready.push_back(next);
            }
        }
    }

    if order.len() != layer_count {
        let stuck = (0..layer_count)
            .find(|&i| in_degree[i] > 0)
            .map(LayerId)
            .unwrap_or(LayerId(0));
        return Err(NetworkError::CyclicGraph(stuck));
    }
    Ok(order)
}

/// Every trainable layer must reach the output through trainable connections,
/// otherwise its error would never be computed.
fn ensure_reaches_output<F>(
    layers: &[Layer],
    connections: &[Connection],
    output: LayerId,
    trainable: &F,
) -> Result<()>
where
    F: Fn(&Connection) -> bool,
{
    let mut reached = vec![false; layers.len()];
    let mut queue = VecDeque::from([output]);
    reached[output.index()] = true;

    while let Some(layer) = queue.pop_front() {
        for connection in connections
            .iter()
            .filter(|&c| trainable(c) && c.output_layer() == layer)
        {
            let upstream = connection.input_layer();
            if !reached[upstream.index()] {
                reached[upstream.index()] = true;
                queue.push_back(upstream);
            }
        }
    }

    match layers
        .iter()
        .find(|l| !l.is_constant() && !reached[l.id().index()])
    {
        Some(layer) => Err(NetworkError::UnreachableLayer(layer.id())),
        None => Ok(()),
    }
}
