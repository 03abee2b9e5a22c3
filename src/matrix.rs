//! Flat numeric buffer with a fixed shape
//!
//! A [`Matrix`] stores `rows * columns` values in one `Vec<f32>`. Kernels pick one
//! of two addressing conventions to translate `(row, column)` into a buffer
//! offset:
//!
//! - row-major: `row * columns + column`
//! - column-major: `column * rows + row`
//!
//! Activation and error matrices hold one row per unit and one column per sample
//! of the batch. Weight matrices hold one row per unit of the connection's output
//! layer and one column per unit of its input layer.

use crate::error::{NetworkError, Result};

/// Addressing convention used to map logical coordinates onto the flat buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    RowMajor,
    ColumnMajor,
}

impl Addressing {
    /// Offset of `(row, column)` in a `rows x columns` buffer stored with this convention.
    #[inline]
    pub fn offset(self, rows: usize, columns: usize, row: usize, column: usize) -> usize {
        match self {
            Addressing::RowMajor => row * columns + column,
            Addressing::ColumnMajor => column * rows + row,
        }
    }
}

/// Fixed-shape `f32` buffer.
///
/// The shape is set at construction and never changes; training mutates the
/// elements in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Matrix {
    elements: Vec<f32>,
    rows: usize,
    columns: usize,
}

impl Matrix {
    /// Zero-filled matrix of the given shape.
    pub fn zeros(rows: usize, columns: usize) -> Self {
        Self {
            elements: vec![0.0f32; rows * columns],
            rows,
            columns,
        }
    }

    /// Matrix with every element set to `value`.
    pub fn filled(rows: usize, columns: usize, value: f32) -> Self {
        Self {
            elements: vec![value; rows * columns],
            rows,
            columns,
        }
    }

    /// Wraps an existing row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::ShapeMismatch`] if `elements.len() != rows * columns`.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_neural_backprop::matrix::Matrix;
    ///
    /// let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    /// assert_eq!(m.get(1, 0), 4.0);
    /// ```
    pub fn from_vec(rows: usize, columns: usize, elements: Vec<f32>) -> Result<Self> {
        if elements.len() != rows * columns {
            return Err(NetworkError::ShapeMismatch {
                context: "matrix construction",
                expected: format!("{} elements", rows * columns),
                actual: format!("{} elements", elements.len()),
            });
        }
        Ok(Self {
            elements,
            rows,
            columns,
        })
    }

    /// Column vector (`n x 1`) from a slice, the shape of a single-sample activation.
    pub fn column(values: &[f32]) -> Self {
        Self {
            elements: values.to_vec(),
            rows: values.len(),
            columns: 1,
        }
    }

    /// Zero-filled matrix with the same shape as `other`. Contents are not copied.
    pub fn like(other: &Matrix) -> Self {
        Self::zeros(other.rows, other.columns)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    /// Number of elements, always `rows * columns`.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[f32] {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut [f32] {
        &mut self.elements
    }

    #[inline]
    pub fn row_major_index(&self, row: usize, column: usize) -> usize {
        Addressing::RowMajor.offset(self.rows, self.columns, row, column)
    }

    #[inline]
    pub fn column_major_index(&self, row: usize, column: usize) -> usize {
        Addressing::ColumnMajor.offset(self.rows, self.columns, row, column)
    }

    /// Element at `(row, column)` under row-major addressing.
    #[inline]
    pub fn get(&self, row: usize, column: usize) -> f32 {
        self.elements[self.row_major_index(row, column)]
    }

    /// Sets the element at `(row, column)` under row-major addressing.
    #[inline]
    pub fn set(&mut self, row: usize, column: usize, value: f32) {
        let index = self.row_major_index(row, column);
        self.elements[index] = value;
    }

    pub fn fill(&mut self, value: f32) {
        self.elements.iter_mut().for_each(|e| *e = value);
    }

    /// Row-major copy of the transpose.
    pub fn transposed(&self) -> Matrix {
        let mut result = Matrix::zeros(self.columns, self.rows);
        for row in 0..self.rows {
            for column in 0..self.columns {
                result.set(column, row, self.get(row, column));
            }
        }
        result
    }

    /// Fails with [`NetworkError::ShapeMismatch`] unless `self` has `shape`.
    pub fn ensure_shape(&self, context: &'static str, shape: (usize, usize)) -> Result<()> {
        if self.shape() != shape {
            return Err(NetworkError::shape(context, shape, self.shape()));
        }
        Ok(())
    }
}
