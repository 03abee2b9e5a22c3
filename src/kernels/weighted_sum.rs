//! Weighted-sum kernel, by rows and by columns
//!
//! For a weight matrix `W` of shape `R x C`:
//!
//! ```text
//! by rows:    output[row, col] = Σ_k W[row, k] * input[k, col]    (k < C, row < R)
//! by columns: output[row, col] = Σ_k W[k, row] * input[k, col]    (k < R, row < C)
//! ```
//!
//! The by-columns variant reads the same buffer as the `C x R` transpose through
//! column-major addressing, so forward propagation (by rows) and backward
//! propagation (by columns) share one weight buffer without ever transposing it.

use rayon::prelude::*;

use super::Dispatch;
use crate::error::{NetworkError, Result};
use crate::matrix::{Addressing, Matrix};

/// Which way the kernel walks the weight matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    ByRows,
    ByColumns,
}

impl Traversal {
    /// Buffer offset of the weight multiplying `input[k, _]` for output row `row`.
    #[inline]
    pub fn weight_offset(self, weights: &Matrix, row: usize, k: usize) -> usize {
        let (rows, columns) = weights.shape();
        match self {
            Traversal::ByRows => Addressing::RowMajor.offset(rows, columns, row, k),
            Traversal::ByColumns => Addressing::ColumnMajor.offset(columns, rows, row, k),
        }
    }

    /// Rows of the output matrix this traversal produces from `weights`.
    pub fn output_rows(self, weights: &Matrix) -> usize {
        match self {
            Traversal::ByRows => weights.rows(),
            Traversal::ByColumns => weights.columns(),
        }
    }

    /// Length of the summation, which is also the rows of the input matrix.
    pub fn inner_len(self, weights: &Matrix) -> usize {
        match self {
            Traversal::ByRows => weights.columns(),
            Traversal::ByColumns => weights.rows(),
        }
    }
}

/// Per-cell customisation points of a weighted-sum invocation.
///
/// Hooks take `&self` and must be `Sync`: under parallel dispatch they are
/// called from several worker threads at once.
pub trait CellHooks: Sync {
    /// Seeds the accumulator of `(row, column)`; `current` is the value already
    /// stored in the output cell. The default accumulates onto it.
    fn before(&self, _row: usize, _column: usize, current: f32) -> f32 {
        current
    }

    /// Receives the finished sum of `(row, column)` and returns the value stored
    /// in the output cell.
    fn after(&self, _row: usize, _column: usize, sum: f32) -> f32 {
        sum
    }
}

/// Plain accumulation: `output += W' * input`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Accumulate;

impl CellHooks for Accumulate {}

/// Weighted sum bound to one connection's weights and one input matrix.
#[derive(Debug, Clone, Copy)]
pub struct WeightedSum<'a> {
    traversal: Traversal,
    weights: &'a Matrix,
    input: &'a Matrix,
    rows: usize,
    inner: usize,
    columns: usize,
}

impl<'a> WeightedSum<'a> {
    /// Binds the buffers of one invocation and checks that `output` has the shape
    /// the traversal produces.
    ///
    /// # Errors
    ///
    /// [`NetworkError::ShapeMismatch`] if the input rows do not match the weight
    /// dimension being summed over, or if `output` is not
    /// `output_rows x input.columns()`.
    pub fn init(
        traversal: Traversal,
        weights: &'a Matrix,
        input: &'a Matrix,
        output: &Matrix,
    ) -> Result<Self> {
        let rows = traversal.output_rows(weights);
        let inner = traversal.inner_len(weights);
        let columns = input.columns();

        if input.rows() != inner {
            return Err(NetworkError::shape(
                "weighted sum input",
                (inner, columns),
                input.shape(),
            ));
        }
        output.ensure_shape("weighted sum output", (rows, columns))?;

        Ok(Self {
            traversal,
            weights,
            input,
            rows,
            inner,
            columns,
        })
    }

    pub fn traversal(&self) -> Traversal {
        self.traversal
    }

    /// `(rows, columns)` of the output this invocation writes.
    pub fn output_shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    /// Runs `before`, the summation and `after` for every output cell.
    ///
    /// # Errors
    ///
    /// [`NetworkError::ShapeMismatch`] if `output` differs from the shape bound in
    /// [`init`](Self::init).
    pub fn run<H: CellHooks>(&self, hooks: &H, output: &mut Matrix, dispatch: Dispatch) -> Result<()> {
        output.ensure_shape("weighted sum output", self.output_shape())?;
        if output.is_empty() {
            return Ok(());
        }

        let columns = self.columns;
        let process_row = |(row, cells): (usize, &mut [f32])| {
            for (column, cell) in cells.iter_mut().enumerate() {
                *cell = self.cell(hooks, row, column, *cell);
            }
        };

        match dispatch {
            Dispatch::Sequential => output
                .elements_mut()
                .chunks_mut(columns)
                .enumerate()
                .for_each(&process_row),
            Dispatch::Parallel => output
                .elements_mut()
                .par_chunks_mut(columns)
                .enumerate()
                .for_each(&process_row),
        }

        Ok(())
    }

    #[inline]
    fn cell<H: CellHooks>(&self, hooks: &H, row: usize, column: usize, current: f32) -> f32 {
        let weights = self.weights.elements();
        let input = self.input.elements();

        let mut sum = hooks.before(row, column, current);
        for k in 0..self.inner {
            sum += weights[self.traversal.weight_offset(self.weights, row, k)]
                * input[self.input.row_major_index(k, column)];
        }
        hooks.after(row, column, sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Overwrite;

    impl CellHooks for Overwrite {
        fn before(&self, _row: usize, _column: usize, _current: f32) -> f32 {
            0.0
        }
    }

    fn weights_2x3() -> Matrix {
        Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()
    }

    #[test]
    fn test_by_rows_single_column() {
        let weights = weights_2x3();
        let input = Matrix::column(&[1.0, 0.0, -1.0]);
        let mut output = Matrix::zeros(2, 1);

        let kernel = WeightedSum::init(Traversal::ByRows, &weights, &input, &output).unwrap();
        kernel.run(&Accumulate, &mut output, Dispatch::Sequential).unwrap();

        assert_eq!(output.elements(), &[-2.0, -2.0]);
    }

    #[test]
    fn test_by_columns_is_transposed_product() {
        let weights = weights_2x3();
        let input = Matrix::column(&[1.0, 2.0]);
        let mut output = Matrix::zeros(3, 1);

        let kernel = WeightedSum::init(Traversal::ByColumns, &weights, &input, &output).unwrap();
        kernel.run(&Accumulate, &mut output, Dispatch::Sequential).unwrap();

        // Wᵀ * [1, 2] = [1 + 8, 2 + 10, 3 + 12]
        assert_eq!(output.elements(), &[9.0, 12.0, 15.0]);
    }

    #[test]
    fn test_accumulates_onto_existing_output() {
        let weights = weights_2x3();
        let input = Matrix::column(&[1.0, 1.0, 1.0]);
        let mut output = Matrix::filled(2, 1, 10.0);

        let kernel = WeightedSum::init(Traversal::ByRows, &weights, &input, &output).unwrap();
        kernel.run(&Accumulate, &mut output, Dispatch::Sequential).unwrap();
        assert_eq!(output.elements(), &[16.0, 25.0]);

        let mut output = Matrix::filled(2, 1, 10.0);
        kernel.run(&Overwrite, &mut output, Dispatch::Sequential).unwrap();
        assert_eq!(output.elements(), &[6.0, 15.0]);
    }

    #[test]
    fn test_init_rejects_wrong_input_rows() {
        let weights = weights_2x3();
        let input = Matrix::column(&[1.0, 2.0]);
        let output = Matrix::zeros(2, 1);

        let err = WeightedSum::init(Traversal::ByRows, &weights, &input, &output).unwrap_err();
        assert!(matches!(err, NetworkError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_init_rejects_wrong_output_shape() {
        let weights = weights_2x3();
        let input = Matrix::zeros(3, 2);
        let output = Matrix::zeros(2, 1);

        assert!(WeightedSum::init(Traversal::ByRows, &weights, &input, &output).is_err());
    }

    #[test]
    fn test_weight_offsets_address_same_element() {
        let weights = weights_2x3();
        // By columns, output row 2 / k = 1 reads W[1, 2].
        let offset = Traversal::ByColumns.weight_offset(&weights, 2, 1);
        assert_eq!(offset, weights.row_major_index(1, 2));
        assert_eq!(weights.elements()[offset], 6.0);
    }
}
