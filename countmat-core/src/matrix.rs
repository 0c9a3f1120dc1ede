use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Display};

use log::debug;

use crate::errors::{MatrixError, Result};
use crate::models::{AxisIndex, FeatureReference};
use crate::storage::{Axis, Layout, MatrixStorage, Reduced};
use crate::utils::{mask_from_indices, mask_positions, split_barcode_seq};
use crate::value::CountValue;
use crate::view::MatrixView;

///
/// CountMatrix struct, a sparse feature x barcode matrix of counts.
///
/// Rows are labelled by a [FeatureReference], columns by barcode sequences. Both axes carry an
/// [AxisIndex] for label lookups. The numeric storage can be moved between layouts with
/// [CountMatrix::to_lil], [CountMatrix::to_coo] and [CountMatrix::to_csc].
///
#[derive(Debug, Clone)]
pub struct CountMatrix<T = i32> {
    feature_ref: FeatureReference,
    feature_ids: AxisIndex,
    bcs: AxisIndex,
    storage: MatrixStorage<T>,
}

impl<T: CountValue> CountMatrix<T> {
    ///
    /// Assemble a matrix from its parts.
    ///
    /// # Arguments:
    /// - `feature_ref`: the row catalog
    /// - `bcs`: the column labels
    /// - `storage`: numeric storage of shape `(feature_ref.len(), bcs.len())`
    ///
    pub fn new(
        feature_ref: FeatureReference,
        bcs: Vec<String>,
        storage: MatrixStorage<T>,
    ) -> Result<Self> {
        let expected = (feature_ref.len(), bcs.len());
        if storage.shape() != expected {
            return Err(MatrixError::ShapeMismatch {
                expected,
                found: storage.shape(),
            });
        }
        let feature_ids = AxisIndex::new(feature_ref.ids());
        Ok(CountMatrix {
            feature_ref,
            feature_ids,
            bcs: AxisIndex::new(bcs),
            storage,
        })
    }

    ///
    /// Create an all-zero matrix in list-of-lists layout, ready for [CountMatrix::add].
    ///
    pub fn empty(feature_ref: FeatureReference, bcs: Vec<String>) -> Self {
        let storage = MatrixStorage::empty((feature_ref.len(), bcs.len()));
        let feature_ids = AxisIndex::new(feature_ref.ids());
        CountMatrix {
            feature_ref,
            feature_ids,
            bcs: AxisIndex::new(bcs),
            storage,
        }
    }

    pub fn features_dim(&self) -> usize {
        self.feature_ref.len()
    }

    pub fn bcs_dim(&self) -> usize {
        self.bcs.len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.features_dim(), self.bcs_dim())
    }

    pub fn nnz(&self) -> usize {
        self.storage.nnz()
    }

    pub fn feature_ref(&self) -> &FeatureReference {
        &self.feature_ref
    }

    pub fn bcs(&self) -> &[String] {
        self.bcs.labels()
    }

    pub fn storage(&self) -> &MatrixStorage<T> {
        &self.storage
    }

    pub fn layout(&self) -> Layout {
        self.storage.layout()
    }

    pub fn into_parts(self) -> (FeatureReference, Vec<String>, MatrixStorage<T>) {
        (self.feature_ref, self.bcs.into_labels(), self.storage)
    }

    /// Return a view covering the whole matrix.
    pub fn view(&self) -> MatrixView<'_, T> {
        MatrixView::full(self)
    }

    pub fn feature_id_to_int(&self, feature_id: &str) -> Result<usize> {
        self.feature_ids
            .get(feature_id)
            .ok_or_else(|| MatrixError::FeatureNotFound(feature_id.to_string()))
    }

    /// Positions of the given feature ids, sorted ascending.
    pub fn feature_ids_to_ints(&self, feature_ids: &[&str]) -> Result<Vec<usize>> {
        let mut ints = feature_ids
            .iter()
            .map(|id| self.feature_id_to_int(id))
            .collect::<Result<Vec<_>>>()?;
        ints.sort_unstable();
        Ok(ints)
    }

    pub fn int_to_feature_id(&self, i: usize) -> Result<&str> {
        self.feature_ref
            .get(i)
            .map(|f| f.id.as_str())
            .ok_or(MatrixError::Bounds {
                index: i,
                len: self.features_dim(),
            })
    }

    pub fn int_to_feature_name(&self, i: usize) -> Result<&str> {
        self.feature_ref
            .get(i)
            .map(|f| f.name.as_str())
            .ok_or(MatrixError::Bounds {
                index: i,
                len: self.features_dim(),
            })
    }

    pub fn bc_to_int(&self, bc: &str) -> Result<usize> {
        self.bcs
            .get(bc)
            .ok_or_else(|| MatrixError::BarcodeNotFound(bc.to_string()))
    }

    /// Positions of the given barcodes, sorted ascending.
    pub fn bcs_to_ints<S: AsRef<str>>(&self, bcs: &[S]) -> Result<Vec<usize>> {
        let mut ints = bcs
            .iter()
            .map(|bc| self.bc_to_int(bc.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        ints.sort_unstable();
        Ok(ints)
    }

    pub fn int_to_bc(&self, j: usize) -> Result<&str> {
        self.bcs.label(j).ok_or(MatrixError::Bounds {
            index: j,
            len: self.bcs_dim(),
        })
    }

    pub fn ints_to_bcs(&self, jj: &[usize]) -> Result<Vec<String>> {
        jj.iter()
            .map(|&j| self.int_to_bc(j).map(|s| s.to_string()))
            .collect()
    }

    ///
    /// Add `value` to the count of `feature_id` in barcode `bc`.
    ///
    /// Switches the storage to list-of-lists layout first if needed.
    ///
    pub fn add(&mut self, feature_id: &str, bc: &str, value: T) -> Result<()> {
        let i = self.feature_id_to_int(feature_id)?;
        let j = self.bc_to_int(bc)?;
        self.storage.convert(Layout::Lil);
        match self.storage.as_lil_mut() {
            Some(lil) => lil.add(i, j, value),
            None => Err(MatrixError::UnsupportedOperation(
                "storage is not mutable after conversion".to_string(),
            )),
        }
    }

    pub fn get(&self, feature_id: &str, bc: &str) -> Result<T> {
        let i = self.feature_id_to_int(feature_id)?;
        let j = self.bc_to_int(bc)?;
        self.storage.get(i, j)
    }

    ///
    /// Add the counts of `other` into this matrix, elementwise.
    ///
    /// Both matrices must have the same shape. Barcode labels are not reconciled: entries are
    /// summed by position, so callers are responsible for aligning the barcode axes first.
    /// The result is in compressed-sparse-column layout.
    ///
    pub fn merge(&mut self, other: &CountMatrix<T>) -> Result<()> {
        if self.features_dim() != other.features_dim() || self.bcs_dim() != other.bcs_dim() {
            return Err(MatrixError::ShapeMismatch {
                expected: self.shape(),
                found: other.shape(),
            });
        }
        self.storage = self.storage.add(&other.storage)?;
        Ok(())
    }

    pub fn to_lil(&mut self) {
        self.storage.convert(Layout::Lil)
    }

    pub fn to_coo(&mut self) {
        self.storage.convert(Layout::Coo)
    }

    pub fn to_csc(&mut self) {
        self.storage.convert(Layout::Csc)
    }

    ///
    /// Select a subset of features (by position) and return the resulting matrix.
    ///
    /// Positions go through an inclusion mask: repeats collapse, and the new matrix lists
    /// features in their original ascending order whatever the order of `indices`.
    ///
    pub fn select_features(&self, indices: &[usize]) -> Result<CountMatrix<T>> {
        let feature_mask = mask_from_indices(indices, self.features_dim())?;
        let bc_mask = vec![true; self.bcs_dim()];
        self.select_masked(&feature_mask, &bc_mask)
    }

    ///
    /// Select a subset of barcodes (by position) and return the resulting matrix.
    ///
    /// Same ordering rules as [CountMatrix::select_features].
    ///
    pub fn select_barcodes(&self, indices: &[usize]) -> Result<CountMatrix<T>> {
        let feature_mask = vec![true; self.features_dim()];
        let bc_mask = mask_from_indices(indices, self.bcs_dim())?;
        self.select_masked(&feature_mask, &bc_mask)
    }

    pub(crate) fn select_masked(
        &self,
        feature_mask: &[bool],
        bc_mask: &[bool],
    ) -> Result<CountMatrix<T>> {
        let feature_ref = self.feature_ref.subset(&mask_positions(feature_mask))?;
        let bcs = self.ints_to_bcs(&mask_positions(bc_mask))?;
        let storage = self.storage.select(feature_mask, bc_mask)?;
        CountMatrix::new(feature_ref, bcs, storage)
    }

    pub fn select_barcodes_by_seq<S: AsRef<str>>(&self, barcode_seqs: &[S]) -> Result<CountMatrix<T>> {
        let indices = barcode_seqs
            .iter()
            .map(|bc| self.bc_to_int(bc.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.select_barcodes(&indices)
    }

    pub fn select_barcodes_by_gem_group(&self, gem_group: u32) -> Result<CountMatrix<T>> {
        let indices: Vec<usize> = self
            .bcs()
            .iter()
            .enumerate()
            .filter(|(_, bc)| split_barcode_seq(bc).1 == Some(gem_group))
            .map(|(j, _)| j)
            .collect();
        self.select_barcodes(&indices)
    }

    /// Select the gene expression features of a specific genome.
    pub fn select_features_by_genome(&self, genome: &str) -> Result<CountMatrix<T>> {
        self.select_features(&self.feature_ref.indices_by_genome(genome))
    }

    /// Select the features of a particular type (e.g. "Gene Expression").
    pub fn select_features_by_type(&self, feature_type: &str) -> Result<CountMatrix<T>> {
        self.select_features(&self.feature_ref.indices_by_type(feature_type))
    }

    pub fn get_genomes(&self) -> Vec<String> {
        self.feature_ref.genomes()
    }

    ///
    /// Keep only the barcodes called as cells in at least one genome.
    ///
    /// # Arguments:
    /// - `bcs_per_genome`: genome to cell-associated barcodes
    ///
    pub fn filter_barcodes(
        &self,
        bcs_per_genome: &HashMap<String, Vec<String>>,
    ) -> Result<CountMatrix<T>> {
        let bcs: BTreeSet<&str> = bcs_per_genome
            .values()
            .flat_map(|bcs| bcs.iter().map(|s| s.as_str()))
            .collect();
        let bcs: Vec<&str> = bcs.into_iter().collect();
        self.select_barcodes_by_seq(&bcs[..])
    }

    ///
    /// Drop all-zero barcodes, then all-zero features.
    ///
    /// # Returns:
    /// - the new matrix
    /// - positions of the kept barcodes
    /// - positions of the kept features (relative to the barcode-filtered matrix)
    ///
    pub fn select_nonzero_axes(&self) -> Result<(CountMatrix<T>, Vec<usize>, Vec<usize>)> {
        let nonzero_bcs = nonzero_positions(&self.get_counts_per_bc());
        let new_mat = if self.bcs_dim() > nonzero_bcs.len() {
            self.select_barcodes(&nonzero_bcs)?
        } else {
            self.clone()
        };

        let nonzero_features = nonzero_positions(&new_mat.get_counts_per_feature());
        let new_mat = if new_mat.features_dim() > nonzero_features.len() {
            new_mat.select_features(&nonzero_features)?
        } else {
            new_mat
        };

        debug!(
            "Kept {} of {} barcodes and {} of {} features",
            nonzero_bcs.len(),
            self.bcs_dim(),
            nonzero_features.len(),
            self.features_dim()
        );
        Ok((new_mat, nonzero_bcs, nonzero_features))
    }

    pub fn sum(&self, axis: Option<Axis>) -> Reduced<T> {
        self.storage.sum_masked(None, None, axis)
    }

    pub fn count_ge(&self, axis: Option<Axis>, threshold: T) -> Reduced<u64> {
        self.storage.count_ge_masked(None, None, axis, threshold)
    }

    /// Total count of each barcode.
    pub fn get_counts_per_bc(&self) -> Vec<T> {
        self.sum(Some(Axis::PerBarcode)).vector().unwrap_or_default()
    }

    /// Total count of each feature.
    pub fn get_counts_per_feature(&self) -> Vec<T> {
        self.sum(Some(Axis::PerFeature)).vector().unwrap_or_default()
    }

    /// Number of barcodes with a positive count, for each feature.
    pub fn get_numbcs_per_feature(&self) -> Vec<u64> {
        self.count_positive(Axis::PerFeature)
    }

    /// Number of features with a positive count, for each barcode.
    pub fn get_unique_features_per_bc(&self) -> Vec<u64> {
        self.count_positive(Axis::PerBarcode)
    }

    fn count_positive(&self, axis: Axis) -> Vec<u64> {
        self.storage
            .reduce(None, None, Some(axis), 0u64, |acc, v| {
                if v > T::zero() {
                    *acc += 1
                }
            })
            .vector()
            .unwrap_or_default()
    }

    ///
    /// Positions of the barcodes whose total count reaches the `cutoff`-th largest total.
    ///
    /// Ties with that total are all included, so more than `cutoff` barcodes can come back.
    /// `cutoff` is clamped to `[1, bcs_dim]`.
    ///
    pub fn get_top_bcs(&self, cutoff: usize) -> Vec<usize> {
        let reads_per_bc = self.get_counts_per_bc();
        if reads_per_bc.is_empty() {
            return Vec::new();
        }
        let index = cutoff.clamp(1, reads_per_bc.len()) - 1;

        let mut sorted = reads_per_bc.clone();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        let value = sorted[index];

        reads_per_bc
            .iter()
            .enumerate()
            .filter_map(|(j, &v)| (v >= value).then_some(j))
            .collect()
    }
}

impl<T: CountValue> Display for CountMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CountMatrix with {} features x {} barcodes ({} stored entries, {}).",
            self.features_dim(),
            self.bcs_dim(),
            self.nnz(),
            self.layout()
        )
    }
}

fn nonzero_positions<T: CountValue>(values: &[T]) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, &v)| (v != T::zero()).then_some(i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    use crate::consts::{DEFAULT_LIBRARY_TYPE, GENOME_TAG};
    use crate::models::FeatureDef;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[fixture]
    fn feature_ref() -> FeatureReference {
        FeatureReference::new(
            vec![
                FeatureDef::new("g1", "Gene1", DEFAULT_LIBRARY_TYPE).with_tag(GENOME_TAG, "hg19"),
                FeatureDef::new("g2", "Gene2", DEFAULT_LIBRARY_TYPE).with_tag(GENOME_TAG, "mm10"),
                FeatureDef::new("g3", "Gene3", DEFAULT_LIBRARY_TYPE).with_tag(GENOME_TAG, "hg19"),
            ],
            strings(&[GENOME_TAG]),
        )
    }

    #[fixture]
    fn small_matrix(feature_ref: FeatureReference) -> CountMatrix {
        let mut m = CountMatrix::empty(feature_ref, strings(&["AAAA-1", "CCCC-1"]));
        m.add("g1", "AAAA-1", 5).unwrap();
        m.add("g2", "CCCC-1", 2).unwrap();
        m
    }

    #[fixture]
    fn wide_matrix(feature_ref: FeatureReference) -> CountMatrix {
        let bcs = strings(&["AAAA-1", "CCCC-1", "GGGG-2", "TTTT-2", "ACGT-1"]);
        let mut m = CountMatrix::empty(feature_ref, bcs);
        for (f, bc, v) in [
            ("g1", "AAAA-1", 3),
            ("g1", "GGGG-2", 1),
            ("g2", "CCCC-1", 4),
            ("g3", "CCCC-1", 1),
            ("g3", "TTTT-2", 2),
            ("g2", "ACGT-1", 3),
        ] {
            m.add(f, bc, v).unwrap();
        }
        m
    }

    #[rstest]
    fn test_counts_scenario(small_matrix: CountMatrix) {
        assert_eq!(small_matrix.get_counts_per_bc(), vec![5, 2]);
        assert_eq!(small_matrix.get_counts_per_feature(), vec![5, 2, 0]);
        assert_eq!(small_matrix.get("g1", "AAAA-1").unwrap(), 5);
        assert_eq!(small_matrix.get("g3", "CCCC-1").unwrap(), 0);
    }

    #[rstest]
    fn test_select_nonzero_axes_scenario(small_matrix: CountMatrix) {
        let (nonzero, bcs, features) = small_matrix.select_nonzero_axes().unwrap();

        assert_eq!(nonzero.shape(), (2, 2));
        assert_eq!(nonzero.feature_ref().ids(), strings(&["g1", "g2"]));
        assert_eq!(nonzero.bcs(), &strings(&["AAAA-1", "CCCC-1"])[..]);
        assert_eq!(bcs, vec![0, 1]);
        assert_eq!(features, vec![0, 1]);
        assert_eq!(nonzero.get("g2", "CCCC-1").unwrap(), 2);
    }

    #[rstest]
    fn test_unknown_ids(mut small_matrix: CountMatrix) {
        assert_eq!(
            small_matrix.add("g9", "AAAA-1", 1),
            Err(MatrixError::FeatureNotFound("g9".to_string()))
        );
        assert_eq!(
            small_matrix.add("g1", "NNNN-1", 1),
            Err(MatrixError::BarcodeNotFound("NNNN-1".to_string()))
        );
    }

    #[rstest]
    fn test_add_after_conversion_reverts_to_lil(mut small_matrix: CountMatrix) {
        small_matrix.to_csc();
        assert_eq!(small_matrix.layout(), Layout::Csc);

        small_matrix.add("g1", "AAAA-1", 1).unwrap();
        assert_eq!(small_matrix.layout(), Layout::Lil);
        assert_eq!(small_matrix.get("g1", "AAAA-1").unwrap(), 6);
    }

    #[rstest]
    fn test_new_rejects_wrong_shape(feature_ref: FeatureReference) {
        let result = CountMatrix::new(feature_ref, strings(&["A-1"]), MatrixStorage::<i32>::empty((3, 2)));
        assert!(matches!(result, Err(MatrixError::ShapeMismatch { .. })));
    }

    #[rstest]
    fn test_select_barcodes_ignores_input_order(wide_matrix: CountMatrix) {
        // [4, 0, 4] selects barcodes 0 and 4 once each, in original order.
        let selected = wide_matrix.select_barcodes(&[4, 0, 4]).unwrap();

        assert_eq!(selected.bcs(), &strings(&["AAAA-1", "ACGT-1"])[..]);
        assert_eq!(selected.get_counts_per_bc(), vec![3, 3]);
        assert_eq!(selected.features_dim(), 3);
    }

    #[rstest]
    fn test_select_features_ignores_input_order(wide_matrix: CountMatrix) {
        let selected = wide_matrix.select_features(&[2, 0]).unwrap();

        assert_eq!(selected.feature_ref().ids(), strings(&["g1", "g3"]));
        assert_eq!(selected.feature_id_to_int("g3").unwrap(), 1);
        assert_eq!(selected.get_counts_per_feature(), vec![4, 3]);
    }

    #[rstest]
    fn test_select_out_of_bounds(wide_matrix: CountMatrix) {
        assert_eq!(
            wide_matrix.select_barcodes(&[5]).err(),
            Some(MatrixError::Bounds { index: 5, len: 5 })
        );
    }

    #[rstest]
    fn test_select_by_gem_group(wide_matrix: CountMatrix) {
        let selected = wide_matrix.select_barcodes_by_gem_group(2).unwrap();
        assert_eq!(selected.bcs(), &strings(&["GGGG-2", "TTTT-2"])[..]);
        assert_eq!(selected.sum(None), Reduced::Scalar(3));
    }

    #[rstest]
    fn test_select_by_genome_and_type(wide_matrix: CountMatrix) {
        let human = wide_matrix.select_features_by_genome("hg19").unwrap();
        assert_eq!(human.feature_ref().ids(), strings(&["g1", "g3"]));

        let none = wide_matrix.select_features_by_type("Antibody Capture").unwrap();
        assert_eq!(none.shape(), (0, 5));
        assert_eq!(wide_matrix.get_genomes(), strings(&["hg19", "mm10"]));
    }

    #[rstest]
    fn test_filter_barcodes(wide_matrix: CountMatrix) {
        let mut calls = HashMap::new();
        calls.insert("hg19".to_string(), strings(&["TTTT-2", "AAAA-1"]));
        calls.insert("mm10".to_string(), strings(&["AAAA-1"]));

        let filtered = wide_matrix.filter_barcodes(&calls).unwrap();
        assert_eq!(filtered.bcs(), &strings(&["AAAA-1", "TTTT-2"])[..]);
    }

    #[rstest]
    fn test_merge(wide_matrix: CountMatrix) {
        let mut merged = wide_matrix.clone();
        merged.merge(&wide_matrix).unwrap();

        assert_eq!(merged.layout(), Layout::Csc);
        assert_eq!(merged.get("g2", "ACGT-1").unwrap(), 6);
        assert_eq!(merged.sum(None), Reduced::Scalar(28));
    }

    #[rstest]
    fn test_merge_is_commutative_and_associative(wide_matrix: CountMatrix) {
        let a = wide_matrix.clone();
        let b = wide_matrix.select_barcodes(&[0, 1, 2, 3, 4]).unwrap();
        let mut c = CountMatrix::empty(a.feature_ref().clone(), a.bcs().to_vec());
        c.add("g3", "ACGT-1", 9).unwrap();

        let mut ab = a.clone();
        ab.merge(&b).unwrap();
        let mut ba = b.clone();
        ba.merge(&a).unwrap();
        assert_eq!(ab.storage().sorted_entries(), ba.storage().sorted_entries());

        let mut ab_c = ab.clone();
        ab_c.merge(&c).unwrap();
        let mut bc = b.clone();
        bc.merge(&c).unwrap();
        let mut a_bc = a.clone();
        a_bc.merge(&bc).unwrap();
        assert_eq!(ab_c.storage().sorted_entries(), a_bc.storage().sorted_entries());
    }

    #[rstest]
    fn test_merge_shape_mismatch(wide_matrix: CountMatrix) {
        let mut m = wide_matrix.clone();
        let other = wide_matrix.select_features(&[0]).unwrap();
        assert!(matches!(m.merge(&other), Err(MatrixError::ShapeMismatch { .. })));
    }

    #[rstest]
    fn test_nonzero_counts(wide_matrix: CountMatrix) {
        assert_eq!(wide_matrix.get_numbcs_per_feature(), vec![2, 2, 2]);
        assert_eq!(wide_matrix.get_unique_features_per_bc(), vec![1, 2, 1, 1, 1]);
    }

    #[rstest]
    #[case(1, vec![1])]
    #[case(2, vec![0, 1, 4])]
    #[case(4, vec![0, 1, 3, 4])]
    #[case(0, vec![1])]
    #[case(100, vec![0, 1, 2, 3, 4])]
    fn test_top_bcs(wide_matrix: CountMatrix, #[case] cutoff: usize, #[case] expected: Vec<usize>) {
        // per-barcode totals are [3, 5, 1, 2, 3]
        assert_eq!(wide_matrix.get_top_bcs(cutoff), expected);
    }

    #[rstest]
    fn test_top_bcs_includes_ties(wide_matrix: CountMatrix) {
        // The 2nd and 3rd largest totals are both 3, shared by barcodes 0 and 4.
        assert_eq!(wide_matrix.get_top_bcs(2), wide_matrix.get_top_bcs(3));
        assert_eq!(wide_matrix.get_top_bcs(2).len(), 3);
    }

    #[rstest]
    fn test_id_conversions(wide_matrix: CountMatrix) {
        assert_eq!(wide_matrix.feature_ids_to_ints(&["g3", "g1"]).unwrap(), vec![0, 2]);
        assert_eq!(wide_matrix.bcs_to_ints(&["TTTT-2", "CCCC-1"]).unwrap(), vec![1, 3]);
        assert_eq!(wide_matrix.ints_to_bcs(&[2]).unwrap(), strings(&["GGGG-2"]));
        assert_eq!(wide_matrix.int_to_feature_name(1).unwrap(), "Gene2");
        assert!(wide_matrix.int_to_bc(9).is_err());
    }

    #[rstest]
    fn test_duplicate_barcodes_last_wins(feature_ref: FeatureReference) {
        let m: CountMatrix = CountMatrix::empty(feature_ref, strings(&["AAAA-1", "AAAA-1"]));
        assert_eq!(m.bcs_dim(), 2);
        assert_eq!(m.bc_to_int("AAAA-1").unwrap(), 1);
    }

    #[rstest]
    fn test_display(small_matrix: CountMatrix) {
        assert_eq!(
            small_matrix.to_string(),
            "CountMatrix with 3 features x 2 barcodes (2 stored entries, lil)."
        );
    }
}
