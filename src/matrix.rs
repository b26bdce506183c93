//! Read-only square matrices for distance and duration lookups.

use serde::{Deserialize, Serialize};

/// A square matrix stored in row-major order. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matrix<T> {
    size: usize,
    data: Vec<T>,
}

impl<T: Copy> Matrix<T> {
    /// Create a matrix of the given size, filled with `value`.
    pub fn full(size: usize, value: T) -> Self {
        Matrix {
            size,
            data: vec![value; size * size],
        }
    }

    /// Create a matrix from row-major data. The data length must be a square.
    pub fn from_data(size: usize, data: Vec<T>) -> Self {
        assert_eq!(data.len(), size * size, "matrix data must be square");
        Matrix { size, data }
    }

    /// Number of rows (equal to the number of columns).
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.size + col]
    }

    /// Iterate over one row.
    pub fn row(&self, row: usize) -> impl Iterator<Item = T> + '_ {
        self.data[row * self.size..(row + 1) * self.size]
            .iter()
            .copied()
    }

    /// Iterate over one column.
    pub fn col(&self, col: usize) -> impl Iterator<Item = T> + '_ {
        (0..self.size).map(move |row| self.get(row, col))
    }
}
