use crate::errors::{MatrixError, Result};
use crate::value::CountValue;

///
/// Row-based list-of-lists sparse matrix. Each row keeps its `(column, value)` entries sorted by
/// column, which makes single-coefficient increments cheap while a matrix is being filled.
///
#[derive(Debug, Clone, PartialEq)]
pub struct LilMatrix<T> {
    shape: (usize, usize),
    rows: Vec<Vec<(usize, T)>>,
}

impl<T: CountValue> LilMatrix<T> {
    pub fn new(shape: (usize, usize)) -> Self {
        LilMatrix {
            shape,
            rows: vec![Vec::new(); shape.0],
        }
    }

    ///
    /// Build from `(row, col, value)` triplets. Repeated coordinates are summed.
    ///
    pub fn from_triplets<I>(shape: (usize, usize), triplets: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, T)>,
    {
        let mut lil = LilMatrix::new(shape);
        for (row, col, value) in triplets {
            lil.add(row, col, value)?;
        }
        Ok(lil)
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn rows(&self) -> usize {
        self.shape.0
    }

    pub fn cols(&self) -> usize {
        self.shape.1
    }

    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum()
    }

    fn check_bounds(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.shape.0 {
            return Err(MatrixError::Bounds {
                index: row,
                len: self.shape.0,
            });
        }
        if col >= self.shape.1 {
            return Err(MatrixError::Bounds {
                index: col,
                len: self.shape.1,
            });
        }
        Ok(())
    }

    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.check_bounds(row, col)?;
        let entries = &self.rows[row];
        Ok(match entries.binary_search_by_key(&col, |&(c, _)| c) {
            Ok(pos) => entries[pos].1,
            Err(_) => T::zero(),
        })
    }

    ///
    /// Increment the coefficient at `(row, col)` by `value`. An entry that sums to zero is
    /// dropped from the row.
    ///
    pub fn add(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        self.check_bounds(row, col)?;
        self.accumulate(row, col, value);
        Ok(())
    }

    /// Unchecked increment used by layout conversions, whose coordinates are in bounds.
    pub(crate) fn accumulate(&mut self, row: usize, col: usize, value: T) {
        let entries = &mut self.rows[row];
        match entries.binary_search_by_key(&col, |&(c, _)| c) {
            Ok(pos) => {
                entries[pos].1 += value;
                if entries[pos].1 == T::zero() {
                    entries.remove(pos);
                }
            }
            Err(pos) => {
                if value != T::zero() {
                    entries.insert(pos, (col, value));
                }
            }
        }
    }

    /// Row-major iterator over `(row, col, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(row, entries)| entries.iter().map(move |&(col, v)| (row, col, v)))
    }

    pub fn row(&self, row: usize) -> &[(usize, T)] {
        &self.rows[row]
    }
}
