use crate::matrix::{profit_to_cost, Matrix};
use crate::solution::{AssignmentSolution, Cost, UnsignedInt};
use crate::solver::AssignmentSolver;
use anyhow;
use anyhow::{anyhow as anyhow_error, ensure, Result};
use tracing::{debug, info, trace};

/// Cell tag of the mark matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mark {
    Unmarked,
    /// zero in the current matching
    Starred,
    /// candidate zero of an augmenting path
    Primed,
}

/// States of the Munkres algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    ReduceRows,
    StarZeros,
    CoverStarredColumns,
    PrimeZeros,
    AugmentPath,
    AdjustDuals,
    Done,
}

/// Solver for dense assignment problem
/// Which finds a minimum cost assignment of N rows -> M columns with the Kuhn-Munkres algorithm.
///
/// Rectangular problems are squared with `pad_value` (zero by default). Only pairs inside
/// the loaded N x M extent are reported.
#[derive(Clone)]
pub struct MunkresSolver<I: UnsignedInt, C: Cost> {
    num_rows: I,
    num_cols: I,
    // memory view of all values in row-major order
    values: Vec<C>,

    pad_value: C,

    // reduced costs of the padded square problem
    costs: Matrix<C>,
    marks: Matrix<Mark>,
    row_covered: Vec<bool>,
    col_covered: Vec<bool>,
    path: Vec<(usize, usize)>,
    z0: (usize, usize),

    pub nits: u32,
    pub naugmentations: u32,
    pub nadjustments: u32,
}

impl<I: UnsignedInt, C: Cost> AssignmentSolver<I, C, MunkresSolver<I, C>> for MunkresSolver<I, C> {
    fn new(row_capacity: usize, column_capacity: usize) -> (Self, AssignmentSolution<I>) {
        let size = row_capacity.max(column_capacity);
        (
            Self {
                num_rows: I::zero(),
                num_cols: I::zero(),
                values: Vec::with_capacity(row_capacity * column_capacity),

                pad_value: C::zero(),

                costs: Matrix::from_elem(0, 0, C::zero()),
                marks: Matrix::from_elem(0, 0, Mark::Unmarked),
                row_covered: Vec::with_capacity(size),
                col_covered: Vec::with_capacity(size),
                path: Vec::with_capacity(2 * size),
                z0: (0, 0),

                nits: 0,
                naugmentations: 0,
                nadjustments: 0,
            },
            AssignmentSolution::<I>::new(row_capacity, column_capacity),
        )
    }

    fn num_rows(&self) -> I {
        self.num_rows
    }
    fn num_cols(&self) -> I {
        self.num_cols
    }
    fn num_rows_mut(&mut self) -> &mut I {
        &mut self.num_rows
    }
    fn num_cols_mut(&mut self) -> &mut I {
        &mut self.num_cols
    }

    fn values(&self) -> &Vec<C> {
        &self.values
    }
    fn values_mut(&mut self) -> &mut Vec<C> {
        &mut self.values
    }

    fn solve(
        &mut self,
        solution: &mut AssignmentSolution<I>,
        maximize: bool,
    ) -> Result<(), anyhow::Error> {
        self.validate_input()?;
        self.init_solve(solution, maximize)?;

        let mut step = Step::ReduceRows;
        loop {
            trace!("{:?}", step);
            step = match step {
                Step::ReduceRows => self.reduce_rows()?,
                Step::StarZeros => self.star_zeros(),
                Step::CoverStarredColumns => self.cover_starred_columns(),
                Step::PrimeZeros => self.prime_zeros(),
                Step::AugmentPath => self.augment_path()?,
                Step::AdjustDuals => self.adjust_duals()?,
                Step::Done => break,
            };
            self.nits += 1;
        }

        self.collect_assignment(solution)?;
        debug!(
            "solved {}x{} problem: nits {}, naugmentations {}, nadjustments {}",
            self.num_rows, self.num_cols, self.nits, self.naugmentations, self.nadjustments
        );
        trace!("pairs: {:?}", solution.pairs);
        Ok(())
    }
}

impl<I: UnsignedInt, C: Cost> MunkresSolver<I, C> {
    /// Value of the cells added to square a rectangular problem
    pub fn pad_value(&self) -> C {
        self.pad_value
    }

    pub fn set_pad_value(&mut self, pad_value: C) {
        self.pad_value = pad_value;
    }

    fn init_solve(
        &mut self,
        solution: &mut AssignmentSolution<I>,
        maximize: bool,
    ) -> Result<(), anyhow::Error> {
        ensure!(
            self.pad_value.is_finite(),
            "non-finite pad value {}",
            self.pad_value
        );
        let num_rows: usize = self.num_rows.as_();
        let num_cols: usize = self.num_cols.as_();
        let input = Matrix::new(num_rows, num_cols, self.values.clone())?;
        let input = if maximize {
            profit_to_cost(&input)?
        } else {
            input
        };
        if !input.is_square() {
            info!(
                "padding {}x{} problem with {}",
                self.num_rows, self.num_cols, self.pad_value
            );
        }
        self.costs = input.pad_to_square(self.pad_value);
        // reduced costs stay within max - min until the first dual adjustment
        if let (Some(max), Some(min)) = (self.costs.max_entry(), self.costs.min_entry()) {
            ensure!(
                max.checked_sub(min).is_some(),
                "cost range {}..{} overflows the cost type",
                min,
                max
            );
        }

        let size = self.costs.num_rows();
        self.marks = Matrix::from_elem(size, size, Mark::Unmarked);
        self.row_covered.clear();
        self.row_covered.resize(size, false);
        self.col_covered.clear();
        self.col_covered.resize(size, false);
        self.path.clear();
        self.path.reserve(2 * size);
        self.z0 = (0, 0);

        self.nits = 0;
        self.naugmentations = 0;
        self.nadjustments = 0;

        solution.reset(self.num_rows, self.num_cols);
        Ok(())
    }

    #[inline]
    fn size(&self) -> usize {
        self.costs.num_rows()
    }

    /// Subtracts the row minimum from every row.
    fn reduce_rows(&mut self) -> Result<Step, anyhow::Error> {
        for row in 0..self.size() {
            let row_values = self.costs.row_mut(row);
            let min = row_values
                .iter()
                .skip(1)
                .fold(row_values[0], |min, v| if *v < min { *v } else { min });
            for v in row_values.iter_mut() {
                *v = v
                    .checked_sub(min)
                    .ok_or_else(|| anyhow_error!("reducing row {} by {} overflows", row, min))?;
            }
        }
        trace!("reduced costs:\n{}", self.costs);
        Ok(Step::StarZeros)
    }

    /// Stars the first zero of every row that shares no row or column with another star.
    fn star_zeros(&mut self) -> Step {
        let size = self.size();
        for row in 0..size {
            for col in 0..size {
                if self.costs[(row, col)].is_zero() && !self.row_covered[row] && !self.col_covered[col]
                {
                    self.marks[(row, col)] = Mark::Starred;
                    self.row_covered[row] = true;
                    self.col_covered[col] = true;
                    break;
                }
            }
        }
        // covers only guarded the initial placement
        self.clear_covers();
        Step::CoverStarredColumns
    }

    fn cover_starred_columns(&mut self) -> Step {
        let size = self.size();
        let mut count = 0;
        for row in 0..size {
            for col in 0..size {
                if self.marks[(row, col)] == Mark::Starred && !self.col_covered[col] {
                    self.col_covered[col] = true;
                    count += 1;
                }
            }
        }
        trace!("{} of {} columns covered", count, size);

        if count >= size {
            Step::Done
        } else {
            Step::PrimeZeros
        }
    }

    fn prime_zeros(&mut self) -> Step {
        while let Some((row, col)) = self.find_uncovered_zero() {
            self.marks[(row, col)] = Mark::Primed;
            match self.find_in_row(row, Mark::Starred) {
                Some(star_col) => {
                    self.row_covered[row] = true;
                    self.col_covered[star_col] = false;
                }
                None => {
                    self.z0 = (row, col);
                    return Step::AugmentPath;
                }
            }
        }
        Step::AdjustDuals
    }

    /// Flips the alternating primed/starred path that starts at `z0`,
    /// growing the matching by one pair.
    fn augment_path(&mut self) -> Result<Step, anyhow::Error> {
        self.path.clear();
        let mut current = self.z0;
        self.path.push(current);

        while let Some(star_row) = self.find_star_in_col(current.1) {
            current = (star_row, current.1);
            self.path.push(current);
            let prime_col = self.find_in_row(star_row, Mark::Primed).ok_or_else(|| {
                anyhow_error!("starred zero in row {} has no primed zero", star_row)
            })?;
            current = (star_row, prime_col);
            self.path.push(current);
        }
        trace!("augmenting path: {:?}", self.path);

        for &(row, col) in self.path.iter() {
            let mark = &mut self.marks[(row, col)];
            *mark = if *mark == Mark::Starred {
                Mark::Unmarked
            } else {
                Mark::Starred
            };
        }

        self.clear_covers();
        self.erase_primes();
        self.naugmentations += 1;
        Ok(Step::CoverStarredColumns)
    }

    /// Adds the smallest uncovered value to covered rows and subtracts it from uncovered columns.
    fn adjust_duals(&mut self) -> Result<Step, anyhow::Error> {
        let min = self
            .find_smallest_uncovered()
            .ok_or_else(|| anyhow_error!("no uncovered cells left for dual adjustment"))?;
        trace!("dual adjustment by {}", min);

        let size = self.size();
        for row in 0..size {
            let row_covered = self.row_covered[row];
            for col in 0..size {
                // covered row and uncovered column would get +min -min, so leave it alone
                let cost = self.costs[(row, col)];
                let updated = match (row_covered, self.col_covered[col]) {
                    (true, true) => cost.checked_add(min),
                    (false, false) => cost.checked_sub(min),
                    _ => continue,
                };
                self.costs[(row, col)] = updated.ok_or_else(|| {
                    anyhow_error!("adjusting ({}, {}) by {} overflows", row, col, min)
                })?;
            }
        }
        self.nadjustments += 1;
        Ok(Step::PrimeZeros)
    }

    fn find_uncovered_zero(&self) -> Option<(usize, usize)> {
        let size = self.size();
        (0..size)
            .filter(|row| !self.row_covered[*row])
            .find_map(|row| {
                (0..size)
                    .find(|col| !self.col_covered[*col] && self.costs[(row, *col)].is_zero())
                    .map(|col| (row, col))
            })
    }

    fn find_smallest_uncovered(&self) -> Option<C> {
        let size = self.size();
        let mut smallest = None;
        for row in (0..size).filter(|row| !self.row_covered[*row]) {
            for col in (0..size).filter(|col| !self.col_covered[*col]) {
                let value = self.costs[(row, col)];
                smallest = match smallest {
                    Some(min) if min <= value => Some(min),
                    _ => Some(value),
                };
            }
        }
        smallest
    }

    #[inline]
    fn find_in_row(&self, row: usize, mark: Mark) -> Option<usize> {
        self.marks.row(row).iter().position(|m| *m == mark)
    }

    #[inline]
    fn find_star_in_col(&self, col: usize) -> Option<usize> {
        (0..self.size()).find(|row| self.marks[(*row, col)] == Mark::Starred)
    }

    fn clear_covers(&mut self) {
        self.row_covered.iter_mut().for_each(|c| *c = false);
        self.col_covered.iter_mut().for_each(|c| *c = false);
    }

    fn erase_primes(&mut self) {
        let size = self.size();
        for row in 0..size {
            self.marks
                .row_mut(row)
                .iter_mut()
                .filter(|m| **m == Mark::Primed)
                .for_each(|m| *m = Mark::Unmarked);
        }
    }

    /// Stores starred cells inside the loaded extent, dropping padded rows and columns.
    fn collect_assignment(
        &self,
        solution: &mut AssignmentSolution<I>,
    ) -> Result<(), anyhow::Error> {
        let num_rows: usize = self.num_rows.as_();
        let num_cols: usize = self.num_cols.as_();
        for row in 0..num_rows {
            for col in 0..num_cols {
                if self.marks[(row, col)] != Mark::Starred {
                    continue;
                }
                let row_i = I::from_usize(row)
                    .ok_or_else(|| anyhow_error!("row {} is greater than max value of type", row))?;
                let col_i = I::from_usize(col).ok_or_else(|| {
                    anyhow_error!("column {} is greater than max value of type", col)
                })?;
                solution.pairs.push((row_i, col_i));
                solution.row_to_column[row] = col_i;
                solution.column_to_row[col] = row_i;
                solution.num_unassigned -= I::one();
            }
        }
        Ok(())
    }
}
