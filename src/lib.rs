//! Dense linear assignment problem solver.
//!
//! Finds a set of (row, column) pairs, at most one per row and one per column,
//! covering every row or every column (whichever is fewer) with the minimum total
//! cost. The solver implements the Kuhn-Munkres (Hungarian) algorithm and runs in
//! O(n³) for an n×n problem; rectangular problems are squared with a pad value.
//!
//! ```
//! use munkres_assignment::{compute_munkres, Options};
//!
//! let costs = vec![vec![5, 3, 1], vec![2, 4, 6], vec![9, 9, 9]];
//! let pairs = compute_munkres(&costs, &Options::default()).unwrap();
//! assert_eq!(pairs, [[0, 2], [1, 0], [2, 1]]);
//! ```
//!
//! The [`AssignmentSolver`] trait exposes the lower level interface which reuses
//! allocations between solves and reports the assignment in both directions.
pub mod matrix;
pub mod munkres;
pub mod solution;
pub mod solver;

pub use crate::matrix::{format_matrix, profit_to_cost, profit_to_cost_with, Matrix};
pub use crate::munkres::MunkresSolver;
pub use crate::solution::{AssignmentSolution, Cost, UnsignedInt};
pub use crate::solver::AssignmentSolver;

use anyhow::{anyhow as anyhow_error, Result};
use tracing::debug;

/// Options of [`compute_munkres`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Options<C> {
    /// cost of the cells added to make the matrix square, also when maximizing
    pub pad_value: C,
    /// treat entries as profits and maximize their sum
    pub maximize: bool,
}

impl<C: Cost> Default for Options<C> {
    fn default() -> Self {
        Options {
            pad_value: C::zero(),
            maximize: false,
        }
    }
}

impl<C: Cost> Options<C> {
    pub fn with_pad_value(mut self, pad_value: C) -> Self {
        self.pad_value = pad_value;
        self
    }

    pub fn maximizing(mut self) -> Self {
        self.maximize = true;
        self
    }
}

/// Computes the lowest cost pairing of rows and columns.
///
/// Rows may have different lengths: short rows are completed with
/// `options.pad_value`, and the problem spans all rows and the widest row.
/// Empty input, empty rows and non-finite entries are rejected.
/// The caller's rows are never modified.
///
/// With `options.maximize` the given entries are converted to costs first and
/// only then padded, so missing cells and squaring cells both cost `pad_value`.
///
/// Returns `[row, column]` pairs in row-major order.
pub fn compute_munkres<C, R>(rows: &[R], options: &Options<C>) -> Result<Vec<[usize; 2]>>
where
    C: Cost,
    R: AsRef<[C]>,
{
    if !options.maximize {
        let matrix = Matrix::from_ragged_rows(rows, options.pad_value)?;
        return compute_munkres_matrix(&matrix, options);
    }
    let costs = ragged_profit_to_cost(rows)?;
    let matrix = Matrix::from_ragged_rows(&costs, options.pad_value)?;
    let options = Options {
        maximize: false,
        ..*options
    };
    compute_munkres_matrix(&matrix, &options)
}

/// `max - value` over the present entries of possibly ragged rows
fn ragged_profit_to_cost<C, R>(rows: &[R]) -> Result<Vec<Vec<C>>>
where
    C: Cost,
    R: AsRef<[C]>,
{
    let maximum = rows
        .iter()
        .flat_map(|row| row.as_ref().iter().copied())
        .fold(None, |max, v| match max {
            Some(m) if m >= v => Some(m),
            _ => Some(v),
        })
        .unwrap_or_else(C::zero);
    debug!("inverting {} rows of profits against {}", rows.len(), maximum);
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            row.as_ref()
                .iter()
                .enumerate()
                .map(|(j, v)| {
                    maximum.checked_sub(*v).ok_or_else(|| {
                        anyhow_error!("profit {} at ({}, {}) can't be inverted", v, i, j)
                    })
                })
                .collect::<Result<Vec<C>>>()
        })
        .collect()
}

/// Same as [`compute_munkres`] for an already rectangular matrix.
pub fn compute_munkres_matrix<C: Cost>(
    matrix: &Matrix<C>,
    options: &Options<C>,
) -> Result<Vec<[usize; 2]>> {
    let (mut solver, mut solution) =
        MunkresSolver::<usize, C>::new(matrix.num_rows(), matrix.num_cols());
    solver.set_pad_value(options.pad_value);
    solver.load_matrix(matrix)?;
    solver.solve(&mut solution, options.maximize)?;
    debug!(
        "{} pairs, {} rows unassigned",
        solution.pairs.len(),
        solution.num_unassigned
    );
    Ok(solution.index_pairs())
}


#[cfg(test)]
#[generic_tests::define]
mod generic_cost_tests {
    use super::{compute_munkres, Cost, Options};

    fn rows<C: Cost>(values: &[&[i8]]) -> Vec<Vec<C>> {
        values
            .iter()
            .map(|row| row.iter().map(|v| C::from_i8(*v).unwrap()).collect())
            .collect()
    }

    #[test]
    fn solves_square<C: Cost>() {
        let costs = rows::<C>(&[&[5, 3, 1], &[2, 4, 6], &[9, 9, 9]]);
        assert_eq!(
            compute_munkres(&costs, &Options::default()).unwrap(),
            [[0, 2], [1, 0], [2, 1]]
        );
    }

    #[test]
    fn solves_negative<C: Cost>() {
        let costs = rows::<C>(&[&[5, 3, -1], &[2, 4, -6], &[9, 9, -9]]);
        assert_eq!(
            compute_munkres(&costs, &Options::default()).unwrap(),
            [[0, 1], [1, 0], [2, 2]]
        );
    }

    #[test]
    fn solves_tall<C: Cost>() {
        // row 0 is cheapest left on the padded column
        let costs = rows::<C>(&[&[4, 1], &[1, 4], &[0, 0]]);
        assert_eq!(
            compute_munkres(&costs, &Options::default()).unwrap(),
            [[1, 0], [2, 1]]
        );
    }

    #[test]
    fn maximizes<C: Cost>() {
        let profits = rows::<C>(&[&[5, 3], &[2, 4]]);
        assert_eq!(
            compute_munkres(&profits, &Options::default().maximizing()).unwrap(),
            [[0, 0], [1, 1]]
        );
    }

    #[instantiate_tests(<i32>)]
    mod int32 {}

    #[instantiate_tests(<i64>)]
    mod int64 {}

    #[instantiate_tests(<f32>)]
    mod float32 {}

    #[instantiate_tests(<f64>)]
    mod float64 {}
}
