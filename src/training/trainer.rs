//! Training loop
//!
//! [`Trainer`] pairs a [`FeedForward`] pass with a [`BackPropagation`] engine and
//! reports the mean squared error of every step.

use tracing::debug;

use super::{output_error_derivative, BackPropagation};
use crate::config::TrainingConfig;
use crate::error::Result;
use crate::forward::FeedForward;
use crate::matrix::Matrix;
use crate::network::Network;
use crate::utils::activations::mean_squared_error;

/// One training step is a forward pass, the output-error seed and a backward
/// pass that updates the weights in place.
#[derive(Debug, Clone)]
pub struct Trainer {
    forward: FeedForward,
    engine: BackPropagation,
}

impl Trainer {
    /// # Errors
    ///
    /// [`NetworkError::InvalidHyperparameter`](crate::error::NetworkError::InvalidHyperparameter)
    /// for an invalid learning rate or momentum.
    pub fn new(network: &Network, config: &TrainingConfig) -> Result<Self> {
        Ok(Self {
            forward: FeedForward::new(config.dispatch),
            engine: BackPropagation::from_config(network, config)?,
        })
    }

    pub fn engine(&self) -> &BackPropagation {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut BackPropagation {
        &mut self.engine
    }

    /// Trains on one batch (`units x batch` column matrices) and returns the mean
    /// squared error of the prediction made before the update.
    pub fn step(&mut self, network: &mut Network, input: &Matrix, target: &Matrix) -> Result<f32> {
        let activations = self.forward.propagate(network, input)?;
        let prediction = activations.activation(network.output_layer())?;
        let seed = output_error_derivative(prediction, target)?;
        let loss = mean_squared_error(prediction.elements(), target.elements());

        self.engine.backward_pass(network, &activations, &seed)?;
        debug!(loss, batch = input.columns(), "training step");
        Ok(loss)
    }

    /// Runs `epochs` passes over `samples`, one step per `(input, target)` pair,
    /// returning the mean loss of every epoch.
    pub fn fit(
        &mut self,
        network: &mut Network,
        samples: &[(Matrix, Matrix)],
        epochs: usize,
    ) -> Result<Vec<f32>> {
        let mut history = Vec::with_capacity(epochs);
        for _ in 0..epochs {
            let mut total = 0.0;
            for (input, target) in samples {
                total += self.step(network, input, target)?;
            }
            history.push(if samples.is_empty() {
                0.0
            } else {
                total / samples.len() as f32
            });
        }
        Ok(history)
    }

    /// Output-layer activation for `input`.
    pub fn predict(&self, network: &Network, input: &Matrix) -> Result<Matrix> {
        self.forward.predict(network, input)
    }
}
