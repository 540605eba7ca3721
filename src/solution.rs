use num_traits::{AsPrimitive, Float, FromPrimitive, Num, NumAssign, PrimInt, Unsigned};
use std::fmt::{Debug, Display};

/// Index type of rows and columns in a solution.
///
/// `max_value()` is reserved to mark unassigned rows and columns.
pub trait UnsignedInt:
    PrimInt
    + Unsigned
    + Display
    + Debug
    + AsPrimitive<usize>
    + AsPrimitive<f64>
    + FromPrimitive
    + NumAssign
{
}

impl UnsignedInt for u8 {}
impl UnsignedInt for u16 {}
impl UnsignedInt for u32 {}
impl UnsignedInt for u64 {}
impl UnsignedInt for usize {}

/// Entry type of a cost matrix.
///
/// Reduced costs are updated with `checked_add`/`checked_sub`, which return `None`
/// when the result is not representable (integer overflow, or a non-finite float).
pub trait Cost: Num + NumAssign + FromPrimitive + Copy + PartialOrd + Debug + Display {
    /// Integers are always finite
    #[inline]
    fn is_finite(self) -> bool {
        true
    }

    fn checked_add(self, other: Self) -> Option<Self>;
    fn checked_sub(self, other: Self) -> Option<Self>;
}

macro_rules! impl_integer_cost {
    ($($t:ty),*) => {
        $(impl Cost for $t {
            #[inline]
            fn checked_add(self, other: Self) -> Option<Self> {
                <$t>::checked_add(self, other)
            }
            #[inline]
            fn checked_sub(self, other: Self) -> Option<Self> {
                <$t>::checked_sub(self, other)
            }
        })*
    };
}

impl_integer_cost!(i8, i16, i32, i64, i128, isize);

macro_rules! impl_float_cost {
    ($($t:ty),*) => {
        $(impl Cost for $t {
            #[inline]
            fn is_finite(self) -> bool {
                Float::is_finite(self)
            }
            #[inline]
            fn checked_add(self, other: Self) -> Option<Self> {
                Some(self + other).filter(|v| Float::is_finite(*v))
            }
            #[inline]
            fn checked_sub(self, other: Self) -> Option<Self> {
                Some(self - other).filter(|v| Float::is_finite(*v))
            }
        })*
    };
}

impl_float_cost!(f32, f64);

///
/// Solution of the linear assignment problem
///
#[derive(Debug, Clone)]
pub struct AssignmentSolution<I>
where
    I: UnsignedInt,
{
    /// assigned (row, column) pairs in row-major order
    pub pairs: Vec<(I, I)>,
    /// index i gives the column j assigned to row i
    ///
    /// Unassigned rows are marked by MAX value of the integer type (u32::MAX for u32)
    pub row_to_column: Vec<I>,
    /// index j gives the row i assigned to column j
    ///
    /// Unassigned columns are marked by MAX value of the integer type (u32::MAX for u32)
    pub column_to_row: Vec<I>,
    /// number of unassigned rows, nonzero only when there are more rows than columns
    pub num_unassigned: I,
}

impl<I> AssignmentSolution<I>
where
    I: UnsignedInt,
{
    pub fn new(row_capacity: usize, column_capacity: usize) -> AssignmentSolution<I> {
        AssignmentSolution::<I> {
            pairs: Vec::with_capacity(row_capacity.min(column_capacity)),
            row_to_column: Vec::with_capacity(row_capacity),
            column_to_row: Vec::with_capacity(column_capacity),
            num_unassigned: I::max_value(),
        }
    }

    pub(crate) fn reset(&mut self, num_rows: I, num_cols: I) {
        self.pairs.clear();
        self.row_to_column.clear();
        self.row_to_column.resize(num_rows.as_(), I::max_value());
        self.column_to_row.clear();
        self.column_to_row.resize(num_cols.as_(), I::max_value());
        self.num_unassigned = num_rows;
    }

    #[inline]
    pub fn is_assigned(&self, row: I) -> bool {
        let row_usize: usize = row.as_();
        self.row_to_column
            .get(row_usize)
            .map_or(false, |column| *column != I::max_value())
    }

    /// Pairs as `[row, column]` arrays of `usize`
    pub fn index_pairs(&self) -> Vec<[usize; 2]> {
        self.pairs
            .iter()
            .map(|(row, column)| {
                let row: usize = row.as_();
                let column: usize = column.as_();
                [row, column]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{AssignmentSolution, Cost};

    #[test]
    fn test_reset_marks_everything_unassigned() {
        let mut solution = AssignmentSolution::<u16>::new(2, 3);
        solution.pairs.push((0, 1));
        solution.reset(2, 3);
        assert!(solution.pairs.is_empty());
        assert_eq!(solution.row_to_column, [u16::MAX; 2]);
        assert_eq!(solution.column_to_row, [u16::MAX; 3]);
        assert_eq!(solution.num_unassigned, 2);
        assert!(!solution.is_assigned(0));
        assert!(!solution.is_assigned(7));
    }

    #[test]
    fn test_index_pairs() {
        let mut solution = AssignmentSolution::<u8>::new(2, 2);
        solution.reset(2, 2);
        solution.pairs.extend_from_slice(&[(0, 1), (1, 0)]);
        assert_eq!(solution.index_pairs(), [[0, 1], [1, 0]]);
    }

    #[test]
    fn test_finiteness() {
        assert!(Cost::is_finite(i64::MIN));
        assert!(Cost::is_finite(-0.5_f64));
        assert!(!Cost::is_finite(f64::NAN));
        assert!(!Cost::is_finite(f32::INFINITY));
        assert!(!Cost::is_finite(f64::NEG_INFINITY));
    }

    #[test]
    fn test_checked_arithmetic() {
        assert_eq!(Cost::checked_sub(100_i8, -100), None);
        assert_eq!(Cost::checked_sub(100_i8, -27), Some(127));
        assert_eq!(Cost::checked_add(i64::MAX, 1), None);
        assert_eq!(Cost::checked_sub(1e308_f64, -1e308), None);
        assert_eq!(Cost::checked_add(f32::MAX, f32::MAX), None);
        assert_eq!(Cost::checked_add(0.5_f64, 0.25), Some(0.75));
    }
}
