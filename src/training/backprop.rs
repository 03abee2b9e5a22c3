//! Backpropagation engine
//!
//! [`BackPropagation`] runs a network's backward schedule. It owns the state that
//! must survive between steps:
//!
//! - one momentum (velocity) buffer per connection, indexed by [`ConnectionId`]
//! - one error buffer per layer, zeroed at the start of every pass and only
//!   reallocated when the batch width changes
//! - one activation buffer per constant layer, filled by the identity calculation

use std::mem;

use tracing::{debug, trace};

use super::derivative::{apply_weight_updates, SigmoidDerivative};
use crate::buffers::LayerMatrices;
use crate::config::TrainingConfig;
use crate::error::{NetworkError, Result};
use crate::kernels::{Dispatch, WeightedSum};
use crate::matrix::Matrix;
use crate::network::{topology, ActivationStrategy, ConnectionId, LayerId, LayerPass, Network, Route};
use crate::optimizers::Momentum;

/// Gradient-descent backpropagation with momentum over a layer graph.
///
/// # Example
///
/// ```
/// use rust_neural_backprop::buffers::LayerMatrices;
/// use rust_neural_backprop::matrix::Matrix;
/// use rust_neural_backprop::network::{ActivationStrategy, NetworkBuilder};
/// use rust_neural_backprop::training::BackPropagation;
///
/// let mut builder = NetworkBuilder::new();
/// let input = builder.add_layer("input", 2, ActivationStrategy::Trainable).unwrap();
/// let output = builder.add_layer("output", 1, ActivationStrategy::Trainable).unwrap();
/// let link = builder
///     .connect(input, output, Matrix::from_vec(1, 2, vec![0.5, -0.5]).unwrap())
///     .unwrap();
/// let mut network = builder.build(input, output).unwrap();
///
/// let mut activations = LayerMatrices::new();
/// activations.insert(input, Matrix::column(&[1.0, 1.0]));
/// activations.insert(output, Matrix::column(&[0.5]));
///
/// let mut engine = BackPropagation::new(&network, 0.1, 0.0).unwrap();
/// engine
///     .backward_pass(&mut network, &activations, &Matrix::column(&[0.125]))
///     .unwrap();
///
/// let w = network.connection(link).weights().get(0, 0);
/// assert!((w - 0.5125).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct BackPropagation {
    rule: Momentum,
    dispatch: Dispatch,
    velocities: Vec<Matrix>,
    errors: LayerMatrices,
    constants: LayerMatrices,
}

impl BackPropagation {
    /// Engine bound to `network`'s connections, running sequentially.
    ///
    /// # Errors
    ///
    /// [`NetworkError::InvalidHyperparameter`] unless `learning_rate > 0` and
    /// `0 <= momentum < 1`.
    pub fn new(network: &Network, learning_rate: f32, momentum: f32) -> Result<Self> {
        let velocities = network
            .connections()
            .iter()
            .map(|c| Matrix::like(c.weights()))
            .collect();

        Ok(Self {
            rule: Momentum::new(learning_rate, momentum)?,
            dispatch: Dispatch::Sequential,
            velocities,
            errors: LayerMatrices::new(),
            constants: LayerMatrices::new(),
        })
    }

    /// Engine configured from a validated [`TrainingConfig`].
    pub fn from_config(network: &Network, config: &TrainingConfig) -> Result<Self> {
        Ok(Self::new(network, config.learning_rate, config.momentum)?.with_dispatch(config.dispatch))
    }

    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn dispatch(&self) -> Dispatch {
        self.dispatch
    }

    /// Previous weight updates of `connection`.
    ///
    /// # Errors
    ///
    /// [`NetworkError::MissingMomentumState`] if the engine was not created for the
    /// network owning `connection`.
    pub fn momentum_state(&self, connection: ConnectionId) -> Result<&Matrix> {
        self.velocities
            .get(connection.index())
            .ok_or(NetworkError::MissingMomentumState { connection })
    }

    /// Forgets every previous update.
    pub fn reset_momentum(&mut self) {
        for velocity in &mut self.velocities {
            velocity.fill(0.0);
        }
    }

    /// Error signal computed for `layer` by the last backward pass.
    pub fn layer_error(&self, layer: LayerId) -> Option<&Matrix> {
        self.errors.get(layer)
    }

    /// One backward step: seeds the output layer with `output_error`, runs every
    /// scheduled layer pass and updates all weights in place.
    ///
    /// `activations` must hold the forward activation of every trainable layer,
    /// shaped `units x batch` where `batch = output_error.columns()`.
    ///
    /// # Errors
    ///
    /// [`NetworkError::ShapeMismatch`] for wrongly shaped inputs,
    /// [`NetworkError::MissingActivation`] for incomplete activation maps,
    /// [`NetworkError::MissingMomentumState`] if `network` is not the network the
    /// engine was created for.
    pub fn backward_pass(
        &mut self,
        network: &mut Network,
        activations: &LayerMatrices,
        output_error: &Matrix,
    ) -> Result<()> {
        let output = network.output_layer();
        let batch = output_error.columns();
        output_error.ensure_shape("output error", (network.layer(output).units(), batch))?;

        for layer in network.layers() {
            self.errors.reset(layer.id(), (layer.units(), batch));
        }
        if let Some(seed) = self.errors.get_mut(output) {
            seed.elements_mut().copy_from_slice(output_error.elements());
        }

        let schedule = network.take_schedule();
        let mut errors = mem::take(&mut self.errors);
        let result = self.run_passes(network, activations, &mut errors, schedule.backward_passes());
        self.errors = errors;
        let passes = schedule.backward_passes().len();
        network.restore_schedule(schedule);
        result?;

        debug!(passes, batch, "backward pass complete");
        Ok(())
    }

    fn run_passes(
        &mut self,
        network: &mut Network,
        activations: &LayerMatrices,
        errors: &mut LayerMatrices,
        passes: &[LayerPass],
    ) -> Result<()> {
        for pass in passes {
            let last = pass.contributions.len().saturating_sub(1);
            for (i, contribution) in pass.contributions.iter().enumerate() {
                self.propagate_connection(
                    network,
                    activations,
                    errors,
                    contribution.connection,
                    pass.target,
                    i == last,
                )?;
            }
        }
        Ok(())
    }

    /// Backward visit of a single connection towards `target`.
    ///
    /// Routes the connection, runs the identity calculation for constant layers,
    /// accumulates the source error into the kernel target's buffer in `errors`
    /// (scaling by the sigmoid derivative when `finalize` is set and the target is
    /// trainable) and applies the momentum update to the connection's weights.
    /// The source error must already be in `errors`; a missing target buffer is
    /// created zero-filled.
    ///
    /// # Errors
    ///
    /// [`NetworkError::UnroutedConnection`] if no routing rule applies,
    /// [`NetworkError::MissingMomentumState`] if `connection` does not belong to
    /// `network` or the engine was not created for it, plus the errors of
    /// [`backward_pass`](Self::backward_pass).
    pub fn propagate_connection(
        &mut self,
        network: &mut Network,
        activations: &LayerMatrices,
        errors: &mut LayerMatrices,
        connection: ConnectionId,
        target: LayerId,
        finalize: bool,
    ) -> Result<Route> {
        let link = network
            .connections()
            .get(connection.index())
            .filter(|_| connection.index() < self.velocities.len())
            .ok_or(NetworkError::MissingMomentumState { connection })?;
        let route = topology::route(link, network.layers(), target)?;
        let kernel_target = route.kernel_target(link);
        let kernel_source = route.kernel_source(link);

        let source_error = errors
            .take(kernel_source)
            .ok_or(NetworkError::MissingErrorSignal(kernel_source))?;
        let target_units = network.layer(kernel_target).units();
        if !errors.contains(kernel_target) {
            errors.insert(kernel_target, Matrix::zeros(target_units, source_error.columns()));
        }

        let result = self.visit(
            network,
            activations,
            errors,
            &source_error,
            connection,
            route,
            finalize,
        );
        errors.insert(kernel_source, source_error);
        result?;

        trace!(%connection, target = %kernel_target, ?route, "propagated connection");
        Ok(route)
    }

    #[allow(clippy::too_many_arguments)]
    fn visit(
        &mut self,
        network: &mut Network,
        activations: &LayerMatrices,
        errors: &mut LayerMatrices,
        source_error: &Matrix,
        connection: ConnectionId,
        route: Route,
        finalize: bool,
    ) -> Result<()> {
        let kernel_target = route.kernel_target(network.connection(connection));
        let (units, strategy) = {
            let layer = network.layer(kernel_target);
            (layer.units(), layer.strategy())
        };
        let shape = (units, source_error.columns());

        let activation = match strategy {
            ActivationStrategy::Constant { value } => identity(&mut self.constants, kernel_target, shape, value),
            ActivationStrategy::Trainable => {
                let activation = activations.activation(kernel_target)?;
                activation.ensure_shape("target activation", shape)?;
                activation
            }
        };
        // Constant layers are sinks; their error is never scaled.
        let scale = finalize && !strategy.is_constant();

        let target_error = errors
            .get_mut(kernel_target)
            .ok_or(NetworkError::MissingErrorSignal(kernel_target))?;
        let traversal = route.traversal();
        WeightedSum::init(traversal, network.connection(connection).weights(), source_error, target_error)?
            .run(&SigmoidDerivative::new(activation, scale), target_error, self.dispatch)?;

        let velocity = self
            .velocities
            .get_mut(connection.index())
            .ok_or(NetworkError::MissingMomentumState { connection })?;
        apply_weight_updates(
            traversal,
            network.connection_mut(connection).weights_matrix_mut(),
            velocity,
            source_error,
            activation,
            self.rule,
            self.dispatch,
        )
    }
}

/// Identity calculation of a constant layer: its activation is its fixed value.
fn identity(constants: &mut LayerMatrices, layer: LayerId, shape: (usize, usize), value: f32) -> &Matrix {
    let activation = constants.reset(layer, shape);
    activation.fill(value);
    activation
}
