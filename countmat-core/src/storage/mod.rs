//!
//! Numeric storage of a count matrix.
//!
//! A matrix is held in exactly one of three layouts at a time:
//! - [Layout::Lil]: list-of-lists, cheap single coefficient increments
//! - [Layout::Coo]: coordinate triplets ([sprs::TriMat]), cheap to stream
//! - [Layout::Csc]: compressed sparse column ([sprs::CsMat]), cheap column slicing and merging
//!
//! Switching layout is always explicit through [MatrixStorage::convert]; read paths never coerce.
//!
pub mod lil;

use std::fmt::{self, Display};

use log::debug;
use sprs::{CsMat, TriMat};

use crate::errors::{MatrixError, Result};
use crate::utils::mask_remap;
use crate::value::CountValue;

pub use self::lil::LilMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Lil,
    Coo,
    Csc,
}

impl Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Lil => write!(f, "lil"),
            Layout::Coo => write!(f, "coo"),
            Layout::Csc => write!(f, "csc"),
        }
    }
}

///
/// Axis a reduction produces values along.
///
/// `PerBarcode` collapses the feature axis and yields one value per (unmasked) barcode,
/// `PerFeature` collapses the barcode axis and yields one value per (unmasked) feature.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    PerBarcode,
    PerFeature,
}

/// Result of a reduction: a scalar for a whole-matrix reduction, a vector for an axis reduction.
#[derive(Debug, Clone, PartialEq)]
pub enum Reduced<A> {
    Scalar(A),
    Vector(Vec<A>),
}

impl<A> Reduced<A> {
    pub fn scalar(self) -> Option<A> {
        match self {
            Reduced::Scalar(a) => Some(a),
            Reduced::Vector(_) => None,
        }
    }

    pub fn vector(self) -> Option<Vec<A>> {
        match self {
            Reduced::Scalar(_) => None,
            Reduced::Vector(v) => Some(v),
        }
    }
}

#[derive(Debug, Clone)]
pub enum MatrixStorage<T> {
    Lil(LilMatrix<T>),
    Coo(TriMat<T>),
    Csc(CsMat<T>),
}

impl<T: CountValue> MatrixStorage<T> {
    pub fn empty(shape: (usize, usize)) -> Self {
        MatrixStorage::Lil(LilMatrix::new(shape))
    }

    ///
    /// Wrap raw compressed-sparse-column arrays, validating their structure.
    ///
    /// The column pointer array must be monotonically non-decreasing, start at zero, and end at
    /// the number of stored entries. Anything else means the arrays were corrupted (for example
    /// by an integer overflow upstream) and is reported as [MatrixError::CorruptData].
    ///
    /// Row indices may be unsorted or repeated within a column. Such columns are sorted and
    /// repeated entries summed.
    ///
    pub fn from_csc_parts(
        shape: (usize, usize),
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<T>,
    ) -> Result<Self> {
        check_indptr(&indptr, shape.1, data.len())?;
        if indices.len() != data.len() {
            return Err(MatrixError::CorruptData(format!(
                "indices length {} does not match data length {}",
                indices.len(),
                data.len()
            )));
        }
        if let Some(&row) = indices.iter().find(|&&row| row >= shape.0) {
            return Err(MatrixError::CorruptData(format!(
                "row index {} exceeds matrix height {}",
                row, shape.0
            )));
        }

        match CsMat::try_new_csc(shape, indptr, indices, data) {
            Ok(csc) => Ok(MatrixStorage::Csc(csc)),
            // unsorted or repeated row indices inside a column: rebuild, summing repeats
            Err((indptr, indices, data, err)) => {
                debug!("Canonicalizing compressed column arrays: {}", err);
                let mut tri = TriMat::with_capacity(shape, data.len());
                for (c, bounds) in indptr.windows(2).enumerate() {
                    for k in bounds[0]..bounds[1] {
                        tri.add_triplet(indices[k], c, data[k]);
                    }
                }
                Ok(MatrixStorage::Csc(tri.to_csc()))
            }
        }
    }

    pub fn layout(&self) -> Layout {
        match self {
            MatrixStorage::Lil(_) => Layout::Lil,
            MatrixStorage::Coo(_) => Layout::Coo,
            MatrixStorage::Csc(_) => Layout::Csc,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        match self {
            MatrixStorage::Lil(m) => m.shape(),
            MatrixStorage::Coo(m) => (m.rows(), m.cols()),
            MatrixStorage::Csc(m) => (m.rows(), m.cols()),
        }
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        match self {
            MatrixStorage::Lil(m) => m.nnz(),
            MatrixStorage::Coo(m) => m.nnz(),
            MatrixStorage::Csc(m) => m.nnz(),
        }
    }

    pub fn as_csc(&self) -> Option<&CsMat<T>> {
        match self {
            MatrixStorage::Csc(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_coo(&self) -> Option<&TriMat<T>> {
        match self {
            MatrixStorage::Coo(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_lil_mut(&mut self) -> Option<&mut LilMatrix<T>> {
        match self {
            MatrixStorage::Lil(m) => Some(m),
            _ => None,
        }
    }

    ///
    /// Visit every stored entry as `(row, col, value)`, in the native order of the layout.
    ///
    pub fn for_each_entry<F: FnMut(usize, usize, T)>(&self, f: F) {
        self.for_each_entry_in_cols(None, f)
    }

    /// Like [MatrixStorage::for_each_entry], skipping masked-out columns without reading them
    /// when the layout is column-compressed.
    fn for_each_entry_in_cols<F: FnMut(usize, usize, T)>(&self, col_mask: Option<&[bool]>, mut f: F) {
        let keep_col = |c: usize| col_mask.is_none_or(|m| m[c]);
        match self {
            MatrixStorage::Lil(m) => {
                for (r, c, v) in m.iter() {
                    if keep_col(c) {
                        f(r, c, v)
                    }
                }
            }
            MatrixStorage::Coo(m) => {
                for ((&r, &c), &v) in m.row_inds().iter().zip(m.col_inds()).zip(m.data()) {
                    if keep_col(c) {
                        f(r, c, v)
                    }
                }
            }
            MatrixStorage::Csc(m) => {
                for (c, column) in m.outer_iterator().enumerate() {
                    if !keep_col(c) {
                        continue;
                    }
                    for (r, &v) in column.iter() {
                        f(r, c, v)
                    }
                }
            }
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        let (rows, cols) = self.shape();
        if row >= rows {
            return Err(MatrixError::Bounds {
                index: row,
                len: rows,
            });
        }
        if col >= cols {
            return Err(MatrixError::Bounds {
                index: col,
                len: cols,
            });
        }
        Ok(match self {
            MatrixStorage::Lil(m) => m.get(row, col)?,
            MatrixStorage::Csc(m) => m.get(row, col).copied().unwrap_or_else(T::zero),
            MatrixStorage::Coo(m) => {
                let mut total = T::zero();
                for ((&r, &c), &v) in m.row_inds().iter().zip(m.col_inds()).zip(m.data()) {
                    if r == row && c == col {
                        total += v;
                    }
                }
                total
            }
        })
    }

    fn triplets(&self) -> TriMat<T> {
        let mut tri = TriMat::with_capacity(self.shape(), self.nnz());
        self.for_each_entry(|r, c, v| tri.add_triplet(r, c, v));
        tri
    }

    pub fn to_lil(&self) -> LilMatrix<T> {
        match self {
            MatrixStorage::Lil(m) => m.clone(),
            _ => {
                let mut lil = LilMatrix::new(self.shape());
                self.for_each_entry(|r, c, v| lil.accumulate(r, c, v));
                lil
            }
        }
    }

    pub fn to_coo(&self) -> TriMat<T> {
        match self {
            MatrixStorage::Coo(m) => m.clone(),
            _ => self.triplets(),
        }
    }

    ///
    /// Compressed-sparse-column copy of the storage. Repeated coordinates of a coordinate
    /// layout are summed.
    ///
    pub fn to_csc(&self) -> CsMat<T> {
        match self {
            MatrixStorage::Csc(m) => m.clone(),
            MatrixStorage::Coo(m) => m.to_csc(),
            MatrixStorage::Lil(_) => self.triplets().to_csc(),
        }
    }

    ///
    /// Switch to the given layout in place. Converting to the current layout is a no-op.
    ///
    pub fn convert(&mut self, layout: Layout) {
        if self.layout() == layout {
            return;
        }
        let converted = match layout {
            Layout::Lil => MatrixStorage::Lil(self.to_lil()),
            Layout::Coo => MatrixStorage::Coo(self.to_coo()),
            Layout::Csc => MatrixStorage::Csc(self.to_csc()),
        };
        *self = converted;
    }

    ///
    /// Raw `(indptr, indices, data)` arrays of the compressed-sparse-column form.
    ///
    pub fn csc_parts(&self) -> (Vec<usize>, Vec<usize>, Vec<T>) {
        let owned;
        let csc = match self {
            MatrixStorage::Csc(m) => m,
            _ => {
                owned = self.to_csc();
                &owned
            }
        };

        let mut indptr = Vec::with_capacity(csc.cols() + 1);
        let mut indices = Vec::with_capacity(csc.nnz());
        let mut data = Vec::with_capacity(csc.nnz());
        indptr.push(0);
        for column in csc.outer_iterator() {
            for (r, &v) in column.iter() {
                indices.push(r);
                data.push(v);
            }
            indptr.push(indices.len());
        }
        (indptr, indices, data)
    }

    ///
    /// Entries sorted column-major with repeated coordinates summed and zeros dropped; a
    /// layout-independent view of the contents.
    ///
    pub fn sorted_entries(&self) -> Vec<(usize, usize, T)> {
        let mut entries = Vec::with_capacity(self.nnz());
        for (c, column) in self.to_csc().outer_iterator().enumerate() {
            for (r, &v) in column.iter() {
                if v != T::zero() {
                    entries.push((r, c, v));
                }
            }
        }
        entries
    }

    ///
    /// Elementwise sum of two identically shaped storages, in compressed-sparse-column layout.
    ///
    pub fn add(&self, other: &MatrixStorage<T>) -> Result<MatrixStorage<T>> {
        if self.shape() != other.shape() {
            return Err(MatrixError::ShapeMismatch {
                expected: self.shape(),
                found: other.shape(),
            });
        }
        let mut tri = TriMat::with_capacity(self.shape(), self.nnz() + other.nnz());
        self.for_each_entry(|r, c, v| tri.add_triplet(r, c, v));
        other.for_each_entry(|r, c, v| tri.add_triplet(r, c, v));
        let summed: CsMat<T> = tri.to_csc();

        // entries that cancel out are not stored
        let mut indptr = Vec::with_capacity(summed.cols() + 1);
        let mut indices = Vec::with_capacity(summed.nnz());
        let mut data = Vec::with_capacity(summed.nnz());
        indptr.push(0);
        for column in summed.outer_iterator() {
            for (r, &v) in column.iter() {
                if v != T::zero() {
                    indices.push(r);
                    data.push(v);
                }
            }
            indptr.push(data.len());
        }
        MatrixStorage::from_csc_parts(self.shape(), indptr, indices, data)
    }

    ///
    /// Copy of the sub-matrix formed by the masked-in rows and columns, in compressed-sparse-column
    /// layout. Rows and columns keep their original relative order.
    ///
    pub fn select(&self, row_mask: &[bool], col_mask: &[bool]) -> Result<MatrixStorage<T>> {
        let (rows, cols) = self.shape();
        if row_mask.len() != rows || col_mask.len() != cols {
            return Err(MatrixError::ShapeMismatch {
                expected: (rows, cols),
                found: (row_mask.len(), col_mask.len()),
            });
        }
        let row_map = mask_remap(row_mask);
        let new_rows = row_mask.iter().filter(|&&k| k).count();
        let new_cols = col_mask.iter().filter(|&&k| k).count();

        let csc = match self {
            MatrixStorage::Csc(m) => {
                let mut indptr = Vec::with_capacity(new_cols + 1);
                let mut indices = Vec::new();
                let mut data = Vec::new();
                indptr.push(0);
                for (c, column) in m.outer_iterator().enumerate() {
                    if !col_mask[c] {
                        continue;
                    }
                    for (r, &v) in column.iter() {
                        if let Some(new_r) = row_map[r] {
                            indices.push(new_r);
                            data.push(v);
                        }
                    }
                    indptr.push(indices.len());
                }
                return MatrixStorage::from_csc_parts((new_rows, new_cols), indptr, indices, data);
            }
            _ => {
                let col_map = mask_remap(col_mask);
                let mut tri = TriMat::new((new_rows, new_cols));
                self.for_each_entry(|r, c, v| {
                    if let (Some(new_r), Some(new_c)) = (row_map[r], col_map[c]) {
                        tri.add_triplet(new_r, new_c, v);
                    }
                });
                tri.to_csc()
            }
        };
        Ok(MatrixStorage::Csc(csc))
    }

    ///
    /// Fold the entries of the masked sub-rectangle, without copying the storage.
    ///
    /// # Arguments:
    /// - `row_mask`, `col_mask`: inclusion masks; `None` includes the whole axis
    /// - `axis`: `None` folds to a single scalar, otherwise one accumulator per unmasked
    ///   position of the output axis
    /// - `init`: initial accumulator value
    /// - `fold`: called with the accumulator of the entry's output slot and the entry value
    ///
    pub fn reduce<A, F>(
        &self,
        row_mask: Option<&[bool]>,
        col_mask: Option<&[bool]>,
        axis: Option<Axis>,
        init: A,
        fold: F,
    ) -> Reduced<A>
    where
        A: Copy,
        F: Fn(&mut A, T),
    {
        let (rows, cols) = self.shape();
        let keep_row = |r: usize| row_mask.is_none_or(|m| m[r]);

        match axis {
            None => {
                let mut acc = init;
                self.for_each_entry_in_cols(col_mask, |r, _, v| {
                    if keep_row(r) {
                        fold(&mut acc, v)
                    }
                });
                Reduced::Scalar(acc)
            }
            Some(Axis::PerBarcode) => {
                let mut acc = vec![init; cols];
                self.for_each_entry_in_cols(col_mask, |r, c, v| {
                    if keep_row(r) {
                        fold(&mut acc[c], v)
                    }
                });
                Reduced::Vector(apply_mask(acc, col_mask))
            }
            Some(Axis::PerFeature) => {
                let mut acc = vec![init; rows];
                self.for_each_entry_in_cols(col_mask, |r, _, v| {
                    if keep_row(r) {
                        fold(&mut acc[r], v)
                    }
                });
                Reduced::Vector(apply_mask(acc, row_mask))
            }
        }
    }

    /// Sum over the masked sub-rectangle.
    pub fn sum_masked(
        &self,
        row_mask: Option<&[bool]>,
        col_mask: Option<&[bool]>,
        axis: Option<Axis>,
    ) -> Reduced<T> {
        self.reduce(row_mask, col_mask, axis, T::zero(), |acc, v| *acc += v)
    }

    /// Number of entries `>= threshold` in the masked sub-rectangle.
    pub fn count_ge_masked(
        &self,
        row_mask: Option<&[bool]>,
        col_mask: Option<&[bool]>,
        axis: Option<Axis>,
        threshold: T,
    ) -> Reduced<u64> {
        self.reduce(row_mask, col_mask, axis, 0u64, |acc, v| {
            if v >= threshold {
                *acc += 1
            }
        })
    }
}

fn apply_mask<A>(values: Vec<A>, mask: Option<&[bool]>) -> Vec<A> {
    match mask {
        None => values,
        Some(mask) => values
            .into_iter()
            .zip(mask)
            .filter_map(|(v, &keep)| keep.then_some(v))
            .collect(),
    }
}

fn check_indptr(indptr: &[usize], cols: usize, nnz: usize) -> Result<()> {
    if indptr.len() != cols + 1 {
        return Err(MatrixError::CorruptData(format!(
            "indptr has {} entries, expected {}",
            indptr.len(),
            cols + 1
        )));
    }
    if let Some(pos) = indptr.windows(2).position(|w| w[0] > w[1]) {
        return Err(MatrixError::CorruptData(format!(
            "indptr is not monotonically non-decreasing at column {}",
            pos
        )));
    }
    if indptr[0] != 0 || indptr[cols] != nnz {
        return Err(MatrixError::CorruptData(format!(
            "indptr spans [{}, {}] but {} entries are stored",
            indptr[0], indptr[cols], nnz
        )));
    }
    Ok(())
}
