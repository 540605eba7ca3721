use crate::matrix::Matrix;
use crate::solution::{AssignmentSolution, Cost, UnsignedInt};
use anyhow;
use anyhow::{anyhow as anyhow_error, ensure, Result};
use num_iter;
use tracing::trace;

/// Shared storage handling of dense assignment solvers.
///
/// Costs are loaded in row-major order with `add_value`, `extend_from_values` or
/// `load_matrix` after a call to `init`, then `solve` fills a reusable solution.
pub trait AssignmentSolver<I: UnsignedInt, C: Cost, Solver> {
    fn new(row_capacity: usize, column_capacity: usize) -> (Solver, AssignmentSolution<I>);

    fn num_rows(&self) -> I;
    fn num_cols(&self) -> I;
    fn num_rows_mut(&mut self) -> &mut I;
    fn num_cols_mut(&mut self) -> &mut I;

    fn values(&self) -> &Vec<C>;
    fn values_mut(&mut self) -> &mut Vec<C>;

    fn solve(
        &mut self,
        solution: &mut AssignmentSolution<I>,
        maximize: bool,
    ) -> Result<(), anyhow::Error>;

    fn init(&mut self, num_rows: I, num_cols: I) -> Result<(), anyhow::Error> {
        ensure!(
            num_rows > I::zero() && num_cols > I::zero(),
            "empty {}x{} problem",
            num_rows,
            num_cols
        );
        ensure!(num_rows < I::max_value() && num_cols < I::max_value());
        let num_rows_usize: usize = num_rows.as_();
        let num_cols_usize: usize = num_cols.as_();
        let num_of_values = num_rows_usize
            .checked_mul(num_cols_usize)
            .ok_or_else(|| anyhow_error!("{}x{} matrix doesn't fit in memory", num_rows, num_cols))?;
        *self.num_rows_mut() = num_rows;
        *self.num_cols_mut() = num_cols;

        let values = self.values_mut();
        values.clear();
        values.reserve(num_of_values);
        Ok(())
    }

    #[inline]
    fn num_of_values(&self) -> usize {
        self.values().len()
    }

    #[inline]
    fn add_value(&mut self, row: I, column: I, value: C) -> Result<(), anyhow::Error> {
        let num_cols: usize = self.num_cols().as_();
        ensure!(row < self.num_rows() && column < self.num_cols());
        let row_usize: usize = row.as_();
        let column_usize: usize = column.as_();
        // dense storage, so values must arrive in row-major order
        ensure!(
            row_usize * num_cols + column_usize == self.num_of_values(),
            "value ({}, {}) is out of row-major order",
            row,
            column
        );
        self.values_mut().push(value);
        Ok(())
    }

    #[inline]
    fn extend_from_values(&mut self, row: I, values: &[C]) -> Result<(), anyhow::Error> {
        let num_cols: usize = self.num_cols().as_();
        ensure!(
            values.len() == num_cols,
            "row {} has {} values, expected {}",
            row,
            values.len(),
            num_cols
        );
        ensure!(row < self.num_rows());
        let row_usize: usize = row.as_();
        ensure!(
            row_usize * num_cols == self.num_of_values(),
            "row {} is out of order",
            row
        );
        self.values_mut().extend_from_slice(values);
        Ok(())
    }

    fn load_matrix(&mut self, matrix: &Matrix<C>) -> Result<(), anyhow::Error> {
        let num_rows = I::from_usize(matrix.num_rows())
            .ok_or_else(|| anyhow_error!("number of rows is greater than max value of type"))?;
        let num_cols = I::from_usize(matrix.num_cols())
            .ok_or_else(|| anyhow_error!("number of columns is greater than max value of type"))?;
        self.init(num_rows, num_cols)?;
        self.values_mut().extend_from_slice(matrix.values());
        Ok(())
    }

    fn validate_input(&self) -> Result<(), anyhow::Error> {
        let num_rows: usize = self.num_rows().as_();
        let num_cols: usize = self.num_cols().as_();
        ensure!(num_rows > 0 && num_cols > 0, "solver is not initialized");
        ensure!(
            self.num_of_values() == num_rows * num_cols,
            "{} values loaded into {}x{} matrix",
            self.num_of_values(),
            num_rows,
            num_cols
        );
        if let Some(idx) = self.values().iter().position(|v| !v.is_finite()) {
            return Err(anyhow_error!(
                "non-finite cost {} at ({}, {})",
                self.values()[idx],
                idx / num_cols,
                idx % num_cols
            ));
        }
        Ok(())
    }

    /// Returns the total cost of assigned pairs, measured on the loaded values.
    ///
    /// Fails when the sum is not representable in the cost type.
    fn get_objective(&self, solution: &AssignmentSolution<I>) -> Result<C, anyhow::Error> {
        let num_cols: usize = self.num_cols().as_();
        let mut obj = C::zero();
        for i in num_iter::range(I::zero(), self.num_rows()) {
            let i_usize: usize = i.as_();
            let j = match solution.row_to_column.get(i_usize) {
                Some(j) if *j != I::max_value() => *j,
                // skip any unassigned
                _ => continue,
            };
            let j_usize: usize = j.as_();
            let value = self.values()[i_usize * num_cols + j_usize];
            obj = obj
                .checked_add(value)
                .ok_or_else(|| anyhow_error!("objective overflows at row {}", i))?;
        }
        trace!("OBJECTIVE: {}", obj);
        Ok(obj)
    }
}
