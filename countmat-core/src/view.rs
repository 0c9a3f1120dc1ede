//!
//! Masked, non-owning views over a [CountMatrix].
//!
//! A [MatrixView] borrows its matrix and holds one inclusion mask per axis. Reductions walk the
//! underlying storage and skip masked-out entries, so summing over a sub-rectangle never copies
//! numeric data. Every narrowing returns a new view; masks only ever shrink (logical AND).
//!
//! Selection indices are always positions in the *underlying* matrix, never in the masked
//! coordinate space.
//!
use crate::errors::{MatrixError, Result};
use crate::matrix::CountMatrix;
use crate::models::FeatureReference;
use crate::storage::{Axis, Reduced};
use crate::utils::{mask_from_indices, mask_positions, split_barcode_seq};
use crate::value::CountValue;

#[derive(Debug, Clone)]
pub struct MatrixView<'a, T: CountValue = i32> {
    matrix: &'a CountMatrix<T>,
    feature_mask: Vec<bool>,
    bc_mask: Vec<bool>,
    feature_ref: FeatureReference,
}

impl<'a, T: CountValue> MatrixView<'a, T> {
    ///
    /// Create a view over `matrix`.
    ///
    /// # Arguments:
    /// - `matrix`: the matrix to borrow
    /// - `feature_indices`: features to include, `None` for all of them
    /// - `bc_indices`: barcodes to include, `None` for all of them
    ///
    pub fn new(
        matrix: &'a CountMatrix<T>,
        feature_indices: Option<&[usize]>,
        bc_indices: Option<&[usize]>,
    ) -> Result<Self> {
        let feature_mask = match feature_indices {
            Some(indices) => mask_from_indices(indices, matrix.features_dim())?,
            None => vec![true; matrix.features_dim()],
        };
        let bc_mask = match bc_indices {
            Some(indices) => mask_from_indices(indices, matrix.bcs_dim())?,
            None => vec![true; matrix.bcs_dim()],
        };
        let feature_ref = masked_feature_ref(matrix, &feature_mask)?;

        Ok(MatrixView {
            matrix,
            feature_mask,
            bc_mask,
            feature_ref,
        })
    }

    pub(crate) fn full(matrix: &'a CountMatrix<T>) -> Self {
        MatrixView {
            matrix,
            feature_mask: vec![true; matrix.features_dim()],
            bc_mask: vec![true; matrix.bcs_dim()],
            feature_ref: matrix.feature_ref().clone(),
        }
    }

    /// Return a copy of this view.
    pub fn view(&self) -> MatrixView<'a, T> {
        self.clone()
    }

    pub fn matrix(&self) -> &'a CountMatrix<T> {
        self.matrix
    }

    /// Catalog of the features still included by the view.
    pub fn feature_ref(&self) -> &FeatureReference {
        &self.feature_ref
    }

    pub fn feature_mask(&self) -> &[bool] {
        &self.feature_mask
    }

    pub fn bc_mask(&self) -> &[bool] {
        &self.bc_mask
    }

    pub fn bcs_dim(&self) -> usize {
        self.bc_mask.iter().filter(|&&keep| keep).count()
    }

    /// Shape of the masked sub-matrix.
    pub fn get_shape(&self) -> (usize, usize) {
        (self.feature_ref.len(), self.bcs_dim())
    }

    pub fn sum(&self, axis: Option<Axis>) -> Reduced<T> {
        self.matrix
            .storage()
            .sum_masked(Some(self.feature_mask.as_slice()), Some(self.bc_mask.as_slice()), axis)
    }

    pub fn count_ge(&self, axis: Option<Axis>, threshold: T) -> Reduced<u64> {
        self.matrix.storage().count_ge_masked(
            Some(self.feature_mask.as_slice()),
            Some(self.bc_mask.as_slice()),
            axis,
            threshold,
        )
    }

    /// Number of entries of the masked sub-matrix that are at least one.
    pub fn get_num_nonzero(&self) -> u64 {
        self.count_ge(None, T::one()).scalar().unwrap_or_default()
    }

    pub fn get_counts_per_bc(&self) -> Vec<T> {
        self.sum(Some(Axis::PerBarcode)).vector().unwrap_or_default()
    }

    ///
    /// Narrow the barcode mask to the given positions of the underlying matrix.
    ///
    pub fn select_barcodes(&self, indices: &[usize]) -> Result<MatrixView<'a, T>> {
        let mask = mask_from_indices(indices, self.bc_mask.len())?;
        let mut view = self.clone();
        view.bc_mask.iter_mut().zip(mask).for_each(|(m, keep)| *m &= keep);
        Ok(view)
    }

    ///
    /// Narrow the feature mask to the given positions of the underlying matrix, and rebuild
    /// the feature catalog to match.
    ///
    pub fn select_features(&self, indices: &[usize]) -> Result<MatrixView<'a, T>> {
        let mask = mask_from_indices(indices, self.feature_mask.len())?;
        let mut view = self.clone();
        view.feature_mask
            .iter_mut()
            .zip(mask)
            .for_each(|(m, keep)| *m &= keep);
        view.feature_ref = masked_feature_ref(self.matrix, &view.feature_mask)?;
        Ok(view)
    }

    pub fn select_barcodes_by_seq<S: AsRef<str>>(
        &self,
        barcode_seqs: &[S],
    ) -> Result<MatrixView<'a, T>> {
        let indices = barcode_seqs
            .iter()
            .map(|bc| self.matrix.bc_to_int(bc.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.select_barcodes(&indices)
    }

    pub fn select_barcodes_by_gem_group(&self, gem_group: u32) -> Result<MatrixView<'a, T>> {
        let indices: Vec<usize> = self
            .matrix
            .bcs()
            .iter()
            .enumerate()
            .filter(|(_, bc)| split_barcode_seq(bc).1 == Some(gem_group))
            .map(|(j, _)| j)
            .collect();
        self.select_barcodes(&indices)
    }

    pub fn select_features_by_genome(&self, genome: &str) -> Result<MatrixView<'a, T>> {
        self.select_features(&self.matrix.feature_ref().indices_by_genome(genome))
    }

    pub fn select_features_by_type(&self, feature_type: &str) -> Result<MatrixView<'a, T>> {
        self.select_features(&self.matrix.feature_ref().indices_by_type(feature_type))
    }

    pub fn get_genomes(&self) -> Vec<String> {
        self.feature_ref.genomes()
    }

    ///
    /// Positions of the given barcodes in the underlying matrix.
    ///
    /// Only defined while no barcode has been masked out: on a narrowed view the positions
    /// would be ambiguous between the masked and the original coordinate space.
    ///
    pub fn bcs_to_ints<S: AsRef<str>>(&self, bcs: &[S]) -> Result<Vec<usize>> {
        if self.bc_mask.iter().any(|&keep| !keep) {
            return Err(MatrixError::UnsupportedOperation(
                "bcs_to_ints on a barcode-sliced matrix view".to_string(),
            ));
        }
        self.matrix.bcs_to_ints(bcs)
    }

    ///
    /// Translate positions in the masked barcode axis back to barcode sequences.
    ///
    pub fn ints_to_bcs(&self, jj: &[usize]) -> Result<Vec<String>> {
        let sliced = mask_positions(&self.bc_mask);
        jj.iter()
            .map(|&j| {
                let orig = sliced.get(j).ok_or(MatrixError::Bounds {
                    index: j,
                    len: sliced.len(),
                })?;
                self.matrix.int_to_bc(*orig).map(|s| s.to_string())
            })
            .collect()
    }

    /// Feature id at position `i` of the masked feature axis.
    pub fn int_to_feature_id(&self, i: usize) -> Result<&str> {
        self.feature_ref
            .get(i)
            .map(|f| f.id.as_str())
            .ok_or(MatrixError::Bounds {
                index: i,
                len: self.feature_ref.len(),
            })
    }
}

fn masked_feature_ref<T: CountValue>(
    matrix: &CountMatrix<T>,
    feature_mask: &[bool],
) -> Result<FeatureReference> {
    matrix.feature_ref().subset(&mask_positions(feature_mask))
}
