//! Tests for the weighted-sum kernel
//!
//! Covers:
//! - By-rows and by-columns results on small hand-computed inputs
//! - Duality: by-columns over `W` equals by-rows over `W^T`
//! - Hook ordering and accumulation semantics
//! - Sequential and parallel dispatch agree

use approx::assert_relative_eq;
use proptest::prelude::*;
use rust_neural_backprop::kernels::{Accumulate, CellHooks, Dispatch, Traversal, WeightedSum};
use rust_neural_backprop::matrix::Matrix;
use rust_neural_backprop::NetworkError;

fn run(traversal: Traversal, weights: &Matrix, input: &Matrix, dispatch: Dispatch) -> Matrix {
    let rows = traversal.output_rows(weights);
    let mut output = Matrix::zeros(rows, input.columns());
    WeightedSum::init(traversal, weights, input, &output)
        .unwrap()
        .run(&Accumulate, &mut output, dispatch)
        .unwrap();
    output
}

fn matrix(rows: usize, columns: usize, seed: &[f32]) -> Matrix {
    let elements = (0..rows * columns).map(|i| seed[i % seed.len()]).collect();
    Matrix::from_vec(rows, columns, elements).unwrap()
}

// ============================================================================
// Values
// ============================================================================

mod value_tests {
    use super::*;

    #[test]
    fn test_by_rows_matches_hand_computation() {
        // W = [[1, 2], [3, 4], [5, 6]], x = [1, -1]
        let weights = Matrix::from_vec(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let input = Matrix::column(&[1.0, -1.0]);
        let output = run(Traversal::ByRows, &weights, &input, Dispatch::Sequential);
        assert_eq!(output.elements(), &[-1.0, -1.0, -1.0]);
    }

    #[test]
    fn test_by_columns_matches_hand_computation() {
        // W^T x with x = [1, 0, 2]
        let weights = Matrix::from_vec(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let input = Matrix::column(&[1.0, 0.0, 2.0]);
        let output = run(Traversal::ByColumns, &weights, &input, Dispatch::Sequential);
        assert_eq!(output.elements(), &[11.0, 14.0]);
    }

    #[test]
    fn test_batch_columns_are_independent() {
        let weights = Matrix::from_vec(1, 2, vec![0.5, -0.5]).unwrap();
        let input = Matrix::from_vec(2, 3, vec![1.0, 2.0, 0.0, 1.0, 0.0, 4.0]).unwrap();
        let output = run(Traversal::ByRows, &weights, &input, Dispatch::Sequential);
        assert_eq!(output.shape(), (1, 3));
        assert_eq!(output.elements(), &[0.0, 1.0, -2.0]);
    }

    #[test]
    fn test_accumulates_onto_existing_output() {
        let weights = Matrix::from_vec(1, 1, vec![2.0]).unwrap();
        let input = Matrix::column(&[3.0]);
        let mut output = Matrix::column(&[1.0]);
        let kernel = WeightedSum::init(Traversal::ByRows, &weights, &input, &output).unwrap();
        kernel.run(&Accumulate, &mut output, Dispatch::Sequential).unwrap();
        kernel.run(&Accumulate, &mut output, Dispatch::Sequential).unwrap();
        assert_eq!(output.elements(), &[13.0]);
    }
}

// ============================================================================
// Hooks
// ============================================================================

mod hook_tests {
    use super::*;

    struct Offset;

    impl CellHooks for Offset {
        fn before(&self, row: usize, _column: usize, _current: f32) -> f32 {
            row as f32 * 100.0
        }

        fn after(&self, _row: usize, column: usize, sum: f32) -> f32 {
            sum + column as f32
        }
    }

    #[test]
    fn test_before_seeds_and_after_sees_raw_sum() {
        let weights = Matrix::from_vec(2, 1, vec![1.0, 1.0]).unwrap();
        let input = Matrix::from_vec(1, 2, vec![1.0, 2.0]).unwrap();
        let mut output = Matrix::filled(2, 2, 9.0);
        WeightedSum::init(Traversal::ByRows, &weights, &input, &output)
            .unwrap()
            .run(&Offset, &mut output, Dispatch::Sequential)
            .unwrap();

        // before replaces the stored 9.0, after adds the column index
        assert_eq!(output.elements(), &[1.0, 3.0, 101.0, 103.0]);
    }
}

// ============================================================================
// Shape checks
// ============================================================================

mod shape_tests {
    use super::*;

    #[test]
    fn test_input_rows_must_match_summed_dimension() {
        let weights = Matrix::zeros(3, 2);
        let input = Matrix::zeros(3, 1);
        let output = Matrix::zeros(3, 1);
        let err = WeightedSum::init(Traversal::ByRows, &weights, &input, &output).unwrap_err();
        assert!(matches!(err, NetworkError::ShapeMismatch { .. }));
        assert!(WeightedSum::init(Traversal::ByColumns, &weights, &input, &Matrix::zeros(2, 1)).is_ok());
    }

    #[test]
    fn test_output_shape_checked() {
        let weights = Matrix::zeros(3, 2);
        let input = Matrix::zeros(2, 4);
        assert!(WeightedSum::init(Traversal::ByRows, &weights, &input, &Matrix::zeros(3, 1)).is_err());

        let kernel = WeightedSum::init(Traversal::ByRows, &weights, &input, &Matrix::zeros(3, 4)).unwrap();
        assert_eq!(kernel.output_shape(), (3, 4));
        let mut wrong = Matrix::zeros(4, 3);
        assert!(kernel.run(&Accumulate, &mut wrong, Dispatch::Sequential).is_err());
    }
}

// ============================================================================
// Duality and dispatch properties
// ============================================================================

mod property_tests {
    use super::*;

    proptest! {
        #[test]
        fn prop_by_columns_equals_by_rows_on_transpose(
            rows in 1usize..6,
            columns in 1usize..6,
            batch in 1usize..4,
            seed in prop::collection::vec(-2.0f32..2.0, 1..16),
        ) {
            let weights = matrix(rows, columns, &seed);
            let input = matrix(rows, batch, &seed[1..].iter().chain(&seed).copied().collect::<Vec<_>>());

            let by_columns = run(Traversal::ByColumns, &weights, &input, Dispatch::Sequential);
            let by_rows = run(Traversal::ByRows, &weights.transposed(), &input, Dispatch::Sequential);

            prop_assert_eq!(by_columns.shape(), (columns, batch));
            for (a, b) in by_columns.elements().iter().zip(by_rows.elements()) {
                prop_assert!((a - b).abs() < 1e-5);
            }
        }

        #[test]
        fn prop_parallel_matches_sequential(
            rows in 1usize..8,
            columns in 1usize..8,
            batch in 1usize..5,
            seed in prop::collection::vec(-1.0f32..1.0, 1..32),
        ) {
            let weights = matrix(rows, columns, &seed);
            let input = matrix(columns, batch, &seed);

            let sequential = run(Traversal::ByRows, &weights, &input, Dispatch::Sequential);
            let parallel = run(Traversal::ByRows, &weights, &input, Dispatch::Parallel);
            prop_assert_eq!(sequential, parallel);
        }
    }

    #[test]
    fn test_parallel_by_columns_large() {
        let weights = matrix(64, 48, &[0.25, -0.5, 0.75, 1.0, -1.25]);
        let input = matrix(64, 8, &[1.0, -1.0, 0.5]);
        let sequential = run(Traversal::ByColumns, &weights, &input, Dispatch::Sequential);
        let parallel = run(Traversal::ByColumns, &weights, &input, Dispatch::Parallel);
        for (a, b) in sequential.elements().iter().zip(parallel.elements()) {
            assert_relative_eq!(*a, *b);
        }
    }
}
