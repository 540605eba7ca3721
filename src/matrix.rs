use crate::solution::Cost;
use anyhow;
use anyhow::{anyhow as anyhow_error, ensure, Result};
use std::fmt;
use std::ops::{Index, IndexMut};
use tracing::trace;

/// Dense row-major matrix with a fixed row stride.
///
/// Rectangularity is checked once at construction, so every row has exactly
/// `num_cols` entries afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    num_rows: usize,
    num_cols: usize,
    values: Vec<T>,
}

impl<T: Copy> Matrix<T> {
    pub fn new(num_rows: usize, num_cols: usize, values: Vec<T>) -> Result<Self, anyhow::Error> {
        ensure!(
            num_rows
                .checked_mul(num_cols)
                .map_or(false, |len| len == values.len()),
            "{} values don't fill a {}x{} matrix",
            values.len(),
            num_rows,
            num_cols
        );
        Ok(Matrix {
            num_rows,
            num_cols,
            values,
        })
    }

    pub fn from_elem(num_rows: usize, num_cols: usize, value: T) -> Self {
        Matrix {
            num_rows,
            num_cols,
            values: vec![value; num_rows * num_cols],
        }
    }

    /// Builds a matrix from rows of equal, nonzero length.
    pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> Result<Self, anyhow::Error> {
        ensure!(!rows.is_empty(), "matrix has no rows");
        let num_cols = rows[0].as_ref().len();
        ensure!(num_cols > 0, "matrix has no columns");
        let mut values = Vec::with_capacity(rows.len() * num_cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            ensure!(
                row.len() == num_cols,
                "row {} has {} values, expected {}",
                i,
                row.len(),
                num_cols
            );
            values.extend_from_slice(row);
        }
        Ok(Matrix {
            num_rows: rows.len(),
            num_cols,
            values,
        })
    }

    /// Builds a `rows.len()` x `widest row` matrix, filling the tail of short rows with `pad_value`.
    pub fn from_ragged_rows<R: AsRef<[T]>>(
        rows: &[R],
        pad_value: T,
    ) -> Result<Self, anyhow::Error> {
        ensure!(!rows.is_empty(), "matrix has no rows");
        let mut num_cols = 0;
        for (i, row) in rows.iter().enumerate() {
            let len = row.as_ref().len();
            ensure!(len > 0, "row {} is empty", i);
            num_cols = num_cols.max(len);
        }

        let mut values = Vec::with_capacity(rows.len() * num_cols);
        for row in rows {
            let row = row.as_ref();
            values.extend_from_slice(row);
            values.extend(std::iter::repeat(pad_value).take(num_cols - row.len()));
        }
        Ok(Matrix {
            num_rows: rows.len(),
            num_cols,
            values,
        })
    }

    /// Returns a square copy of side `max(num_rows, num_cols)` with the original
    /// values in the top-left corner and `pad_value` everywhere else.
    pub fn pad_to_square(&self, pad_value: T) -> Self {
        let size = self.num_rows.max(self.num_cols);
        if size == self.num_rows && size == self.num_cols {
            return self.clone();
        }
        trace!(
            "padding {}x{} matrix to {}x{}",
            self.num_rows,
            self.num_cols,
            size,
            size
        );
        let mut values = Vec::with_capacity(size * size);
        for row in self.rows() {
            values.extend_from_slice(row);
            values.extend(std::iter::repeat(pad_value).take(size - self.num_cols));
        }
        values.resize(size * size, pad_value);
        Matrix {
            num_rows: size,
            num_cols: size,
            values,
        }
    }

    /// Squares possibly ragged rows. The caller's rows are left untouched.
    pub fn padded<R: AsRef<[T]>>(rows: &[R], pad_value: T) -> Result<Self, anyhow::Error> {
        Ok(Self::from_ragged_rows(rows, pad_value)?.pad_to_square(pad_value))
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    #[inline]
    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.num_rows == self.num_cols
    }

    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[T] {
        let start = row * self.num_cols;
        &self.values[start..start + self.num_cols]
    }

    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut [T] {
        let start = row * self.num_cols;
        &mut self.values[start..start + self.num_cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        // chunks_exact panics on a zero chunk size
        self.values.chunks_exact(self.num_cols.max(1))
    }

    pub fn map<U: Copy, F: FnMut(T) -> U>(&self, f: F) -> Matrix<U> {
        Matrix {
            num_rows: self.num_rows,
            num_cols: self.num_cols,
            values: self.values.iter().copied().map(f).collect(),
        }
    }

    pub fn to_rows(&self) -> Vec<Vec<T>> {
        self.rows().map(|row| row.to_vec()).collect()
    }
}

impl<C: Cost> Matrix<C> {
    pub fn max_entry(&self) -> Option<C> {
        self.values
            .iter()
            .copied()
            .fold(None, |max, v| match max {
                Some(m) if m >= v => Some(m),
                _ => Some(v),
            })
    }

    pub fn min_entry(&self) -> Option<C> {
        self.values
            .iter()
            .copied()
            .fold(None, |min, v| match min {
                Some(m) if m <= v => Some(m),
                _ => Some(v),
            })
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    #[inline]
    fn index(&self, (row, column): (usize, usize)) -> &T {
        debug_assert!(column < self.num_cols);
        &self.values[row * self.num_cols + column]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    #[inline]
    fn index_mut(&mut self, (row, column): (usize, usize)) -> &mut T {
        debug_assert!(column < self.num_cols);
        &mut self.values[row * self.num_cols + column]
    }
}

/// Right-aligns every column to its widest entry, separating columns by one space.
impl<T: fmt::Display> fmt::Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.values.iter().map(|v| v.to_string()).collect();
        let mut widths = vec![0; self.num_cols];
        for (idx, s) in rendered.iter().enumerate() {
            let column = idx % self.num_cols;
            widths[column] = widths[column].max(s.chars().count());
        }

        for (idx, s) in rendered.iter().enumerate() {
            let column = idx % self.num_cols;
            if column > 0 {
                f.write_str(" ")?;
            } else if idx > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{:>width$}", s, width = widths[column])?;
        }
        Ok(())
    }
}

/// Renders a matrix as aligned text columns.
pub fn format_matrix<T: fmt::Display>(matrix: &Matrix<T>) -> String {
    matrix.to_string()
}

/// Converts a profit matrix to a cost matrix as `max_entry - value`.
///
/// Fails when a difference is not representable in the cost type.
pub fn profit_to_cost<C: Cost>(profit: &Matrix<C>) -> Result<Matrix<C>, anyhow::Error> {
    let maximum = match profit.max_entry() {
        Some(maximum) => maximum,
        None => return Ok(profit.clone()),
    };
    let values = profit
        .values
        .iter()
        .map(|v| {
            maximum.checked_sub(*v).ok_or_else(|| {
                anyhow_error!("profit {} can't be inverted against maximum {}", v, maximum)
            })
        })
        .collect::<Result<Vec<C>, anyhow::Error>>()?;
    Matrix::new(profit.num_rows, profit.num_cols, values)
}

/// Converts a profit matrix to a cost matrix by applying `inversion` to every entry.
pub fn profit_to_cost_with<C, F>(profit: &Matrix<C>, inversion: F) -> Matrix<C>
where
    C: Cost,
    F: FnMut(C) -> C,
{
    profit.map(inversion)
}
