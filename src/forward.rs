//! Forward pass
//!
//! Layers are visited in the network's forward order. A trainable layer sums
//! every incoming connection with the by-rows weighted-sum kernel and applies
//! the logistic sigmoid once the last contribution is in. Constant layers are
//! filled with their value.

use tracing::trace;

use crate::buffers::LayerMatrices;
use crate::error::{NetworkError, Result};
use crate::kernels::{CellHooks, Dispatch, Traversal, WeightedSum};
use crate::matrix::Matrix;
use crate::network::{ActivationStrategy, Network};
use crate::utils::activations::{sigmoid, sigmoid_inplace};

/// `after` hook applying the sigmoid on the final contribution into a layer.
struct Activate {
    last: bool,
}

impl CellHooks for Activate {
    fn after(&self, _row: usize, _column: usize, sum: f32) -> f32 {
        if self.last {
            sigmoid(sum)
        } else {
            sum
        }
    }
}

/// Computes activation maps for a batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedForward {
    dispatch: Dispatch,
}

impl FeedForward {
    pub fn new(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }

    pub fn dispatch(&self) -> Dispatch {
        self.dispatch
    }

    /// Activation of every layer for `input`, shaped `units(input) x batch`.
    ///
    /// # Errors
    ///
    /// [`NetworkError::ShapeMismatch`] if `input` does not have one row per input
    /// unit.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_neural_backprop::forward::FeedForward;
    /// use rust_neural_backprop::matrix::Matrix;
    /// use rust_neural_backprop::network::{ActivationStrategy, NetworkBuilder};
    ///
    /// let mut builder = NetworkBuilder::new();
    /// let input = builder.add_layer("input", 2, ActivationStrategy::Trainable).unwrap();
    /// let output = builder.add_layer("output", 1, ActivationStrategy::Trainable).unwrap();
    /// builder
    ///     .connect(input, output, Matrix::from_vec(1, 2, vec![0.5, -0.5]).unwrap())
    ///     .unwrap();
    /// let network = builder.build(input, output).unwrap();
    ///
    /// let activations = FeedForward::default()
    ///     .propagate(&network, &Matrix::column(&[1.0, 1.0]))
    ///     .unwrap();
    /// assert_eq!(activations.get(output).unwrap().elements(), &[0.5]);
    /// ```
    pub fn propagate(&self, network: &Network, input: &Matrix) -> Result<LayerMatrices> {
        let batch = input.columns();
        let input_layer = network.input_layer();
        input.ensure_shape("network input", (network.layer(input_layer).units(), batch))?;

        let mut activations = LayerMatrices::new();
        for &id in network.schedule().forward_order() {
            let layer = network.layer(id);
            let activation = if id == input_layer {
                input.clone()
            } else {
                match layer.strategy() {
                    ActivationStrategy::Constant { value } => Matrix::filled(layer.units(), batch, value),
                    ActivationStrategy::Trainable => {
                        let mut sums = Matrix::zeros(layer.units(), batch);
                        let incoming: Vec<_> = network.incoming(id).collect();
                        if incoming.is_empty() {
                            sigmoid_inplace(sums.elements_mut());
                        }
                        for (i, connection) in incoming.iter().enumerate() {
                            let source = activations.activation(connection.input_layer())?;
                            WeightedSum::init(Traversal::ByRows, connection.weights(), source, &sums)?.run(
                                &Activate {
                                    last: i + 1 == incoming.len(),
                                },
                                &mut sums,
                                self.dispatch,
                            )?;
                        }
                        sums
                    }
                }
            };
            trace!(layer = %id, units = layer.units(), batch, "activated layer");
            activations.insert(id, activation);
        }

        Ok(activations)
    }

    /// Output-layer activation for `input`.
    pub fn predict(&self, network: &Network, input: &Matrix) -> Result<Matrix> {
        let mut activations = self.propagate(network, input)?;
        activations
            .take(network.output_layer())
            .ok_or(NetworkError::MissingActivation(network.output_layer()))
    }
}
