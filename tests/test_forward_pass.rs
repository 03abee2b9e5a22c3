//! Tests for the forward pass
//!
//! Covers:
//! - Sigmoid of the weighted sum for single and multiple incoming connections
//! - Constant layers and layers without inputs
//! - Weights written through the connection handle
//! - Batch shapes and input validation

use approx::assert_relative_eq;
use rust_neural_backprop::forward::FeedForward;
use rust_neural_backprop::kernels::Dispatch;
use rust_neural_backprop::matrix::Matrix;
use rust_neural_backprop::network::{ActivationStrategy, NetworkBuilder};
use rust_neural_backprop::utils::activations::sigmoid;
use rust_neural_backprop::NetworkError;

fn weights(rows: usize, columns: usize, values: &[f32]) -> Matrix {
    Matrix::from_vec(rows, columns, values.to_vec()).unwrap()
}

// ============================================================================
// Activation values
// ============================================================================

mod activation_tests {
    use super::*;

    #[test]
    fn test_zero_sum_gives_half() {
        let mut builder = NetworkBuilder::new();
        let input = builder.add_layer("input", 2, ActivationStrategy::Trainable).unwrap();
        let output = builder.add_layer("output", 1, ActivationStrategy::Trainable).unwrap();
        builder.connect(input, output, weights(1, 2, &[0.5, -0.5])).unwrap();
        let network = builder.build(input, output).unwrap();

        let activations = FeedForward::default()
            .propagate(&network, &Matrix::column(&[1.0, 1.0]))
            .unwrap();
        assert_eq!(activations.get(input).unwrap().elements(), &[1.0, 1.0]);
        assert_relative_eq!(activations.get(output).unwrap().get(0, 0), 0.5);
    }

    #[test]
    fn test_bias_and_input_are_summed_before_sigmoid() {
        let mut builder = NetworkBuilder::new();
        let input = builder.add_layer("input", 1, ActivationStrategy::Trainable).unwrap();
        let output = builder.add_layer("output", 1, ActivationStrategy::Trainable).unwrap();
        let bias = builder.add_layer("bias", 1, ActivationStrategy::bias()).unwrap();
        builder.connect(input, output, weights(1, 1, &[0.5])).unwrap();
        builder.connect(bias, output, weights(1, 1, &[0.2])).unwrap();
        let network = builder.build(input, output).unwrap();

        let activations = FeedForward::default()
            .propagate(&network, &Matrix::column(&[1.0]))
            .unwrap();
        assert_eq!(activations.get(bias).unwrap().elements(), &[1.0]);
        assert_relative_eq!(
            activations.get(output).unwrap().get(0, 0),
            sigmoid(0.7),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_hidden_layer_chain() {
        let mut builder = NetworkBuilder::new();
        let input = builder.add_layer("input", 1, ActivationStrategy::Trainable).unwrap();
        let hidden = builder.add_layer("hidden", 2, ActivationStrategy::Trainable).unwrap();
        let output = builder.add_layer("output", 1, ActivationStrategy::Trainable).unwrap();
        builder.connect(input, hidden, weights(2, 1, &[1.0, -1.0])).unwrap();
        builder.connect(hidden, output, weights(1, 2, &[1.0, 1.0])).unwrap();
        let network = builder.build(input, output).unwrap();

        let prediction = FeedForward::default()
            .predict(&network, &Matrix::column(&[2.0]))
            .unwrap();
        // sigmoid(2) + sigmoid(-2) = 1
        assert_relative_eq!(prediction.get(0, 0), sigmoid(1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_layer_without_inputs_emits_half() {
        let mut builder = NetworkBuilder::new();
        let input = builder.add_layer("input", 1, ActivationStrategy::Trainable).unwrap();
        let orphan = builder.add_layer("orphan", 2, ActivationStrategy::Trainable).unwrap();
        let output = builder.add_layer("output", 1, ActivationStrategy::Trainable).unwrap();
        builder.connect(input, output, weights(1, 1, &[0.0])).unwrap();
        builder.connect(orphan, output, weights(1, 2, &[0.0, 0.0])).unwrap();
        let network = builder.build(input, output).unwrap();

        let activations = FeedForward::default()
            .propagate(&network, &Matrix::column(&[1.0]))
            .unwrap();
        assert_eq!(activations.get(orphan).unwrap().elements(), &[0.5, 0.5]);
    }
}

// ============================================================================
// Shapes
// ============================================================================

mod shape_tests {
    use super::*;

    #[test]
    fn test_batch_columns() {
        let mut builder = NetworkBuilder::new();
        let input = builder.add_layer("input", 2, ActivationStrategy::Trainable).unwrap();
        let bias = builder.add_layer("bias", 1, ActivationStrategy::bias()).unwrap();
        let output = builder.add_layer("output", 3, ActivationStrategy::Trainable).unwrap();
        builder.connect(input, output, weights(3, 2, &[0.1; 6])).unwrap();
        builder.connect(bias, output, weights(3, 1, &[0.0; 3])).unwrap();
        let network = builder.build(input, output).unwrap();

        let batch = Matrix::from_vec(2, 4, vec![0.0; 8]).unwrap();
        let forward = FeedForward::new(Dispatch::Parallel);
        let activations = forward.propagate(&network, &batch).unwrap();

        assert_eq!(activations.get(bias).unwrap().shape(), (1, 4));
        assert_eq!(activations.get(output).unwrap().shape(), (3, 4));
        assert!(activations
            .get(output)
            .unwrap()
            .elements()
            .iter()
            .all(|&a| (a - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_input_rows_checked() {
        let mut builder = NetworkBuilder::new();
        let input = builder.add_layer("input", 2, ActivationStrategy::Trainable).unwrap();
        let output = builder.add_layer("output", 1, ActivationStrategy::Trainable).unwrap();
        builder.connect(input, output, weights(1, 2, &[1.0, 1.0])).unwrap();
        let network = builder.build(input, output).unwrap();

        let err = FeedForward::default()
            .propagate(&network, &Matrix::column(&[1.0, 2.0, 3.0]))
            .unwrap_err();
        assert!(matches!(err, NetworkError::ShapeMismatch { .. }));
    }
}

// ============================================================================
// Weight persistence
// ============================================================================

mod weight_tests {
    use super::*;

    #[test]
    fn test_written_weights_seen_by_next_pass() {
        let mut builder = NetworkBuilder::new();
        let input = builder.add_layer("input", 2, ActivationStrategy::Trainable).unwrap();
        let output = builder.add_layer("output", 1, ActivationStrategy::Trainable).unwrap();
        let link = builder.connect(input, output, weights(1, 2, &[0.5, -0.5])).unwrap();
        let mut network = builder.build(input, output).unwrap();
        let forward = FeedForward::default();
        let sample = Matrix::column(&[1.0, 1.0]);

        let before = forward.predict(&network, &sample).unwrap();
        assert_relative_eq!(before.get(0, 0), 0.5);

        network
            .connection_mut(link)
            .weights_mut()
            .copy_from_slice(&[1.0, 0.5]);
        assert_eq!(network.connection(link).weights().elements(), &[1.0, 0.5]);
        assert_eq!(network.connection(link).weights().shape(), (1, 2));

        let after = forward.predict(&network, &sample).unwrap();
        assert_relative_eq!(after.get(0, 0), sigmoid(1.5), epsilon = 1e-6);
    }
}
