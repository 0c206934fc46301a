//! Dense row-major matrix of `f64` features.
//!
//! Every row has the same number of columns; this is checked when the matrix is
//! built so downstream code can index rows without re-validating shapes.

use crate::error::{Error, Result};

/// An `n x d` dataset: `n` points, each with `d` features.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    n_rows: usize,
    n_cols: usize,
}

impl Matrix {
    /// Build a matrix from one `Vec` per point.
    ///
    /// Fails with [`Error::EmptyInput`] when there are no rows or the first row is
    /// empty, and with [`Error::DimensionMismatch`] when rows disagree in length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_cols = match rows.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => return Err(Error::EmptyInput),
        };

        let mut data = Vec::with_capacity(rows.len() * n_cols);
        for row in &rows {
            if row.len() != n_cols {
                return Err(Error::DimensionMismatch {
                    expected: n_cols,
                    found: row.len(),
                });
            }
            data.extend_from_slice(row);
        }

        Ok(Self {
            data,
            n_rows: rows.len(),
            n_cols,
        })
    }

    /// Build a matrix from a flat row-major buffer.
    pub fn from_shape_vec((n_rows, n_cols): (usize, usize), data: Vec<f64>) -> Result<Self> {
        if n_rows == 0 || n_cols == 0 {
            return Err(Error::EmptyInput);
        }
        let expected = n_rows.checked_mul(n_cols).ok_or(Error::InvalidParameter {
            name: "shape",
            message: "n_rows * n_cols overflows",
        })?;
        if data.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                found: data.len(),
            });
        }
        Ok(Self {
            data,
            n_rows,
            n_cols,
        })
    }

    /// Number of points.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of features per point.
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Features of point `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_rows()`.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        let start = i * self.n_cols;
        &self.data[start..start + self.n_cols]
    }

    /// Iterate over rows in order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        self.data.chunks_exact(self.n_cols)
    }

    /// Location of the first NaN or infinite entry, if any.
    pub fn first_non_finite(&self) -> Option<(usize, usize)> {
        self.data
            .iter()
            .position(|x| !x.is_finite())
            .map(|pos| (pos / self.n_cols, pos % self.n_cols))
    }
}
