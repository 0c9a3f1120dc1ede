//!
//! Column-range loads: read a contiguous block of barcodes from a container without reading the
//! numeric payload of any other column.
//!
use std::path::Path;

use hdf5::{File, Group, H5Type};
use log::debug;

use countmat_core::{CountMatrix, CountValue, MatrixError, MatrixStorage};

use crate::consts::{BCS_DATASET, DATA_DATASET, INDICES_DATASET, INDPTR_DATASET};
use crate::error::{MatrixIoError, Result};
use crate::h5::codec::{load_feature_ref_from_h5_group, open_matrix_group, read_shape};
use crate::h5::{open_dataset, read_string_range};

fn read_range<T: H5Type>(group: &Group, name: &str, start: usize, end: usize) -> Result<Vec<T>> {
    if start >= end {
        return Ok(Vec::new());
    }
    Ok(open_dataset(group, name)?
        .read_slice_1d::<T, _>(start..end)?
        .to_vec())
}

fn to_offset(value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        MatrixIoError::Matrix(MatrixError::CorruptData(format!(
            "negative offset {} in compressed column arrays",
            value
        )))
    })
}

fn corrupt_slice(col_start: usize, col_end: usize) -> MatrixIoError {
    MatrixIoError::Matrix(MatrixError::CorruptData(format!(
        "{} is not monotonically non-decreasing between columns {} and {}",
        INDPTR_DATASET, col_start, col_end
    )))
}

/// The loaded `indptr` slice must be non-decreasing and stay within `[ind_start, ind_end]`.
fn check_indptr_slice(
    indptr: &[usize],
    ind_start: usize,
    ind_end: usize,
    col_start: usize,
    col_end: usize,
) -> Result<()> {
    if ind_end < ind_start
        || indptr.windows(2).any(|w| w[0] > w[1])
        || indptr.iter().any(|&p| p < ind_start || p > ind_end)
    {
        return Err(corrupt_slice(col_start, col_end));
    }
    Ok(())
}

///
/// Load the barcodes `[col_start, col_end)` of a `matrix` group as a standalone matrix.
///
/// Reads the full feature reference, the barcode slice, `indptr[col_start..=col_end]` and only
/// the `data`/`indices` entries of the requested columns. An empty range gives a matrix with
/// no barcodes.
///
/// # Arguments
/// - group: the `matrix` group of a container
/// - col_start: first barcode to load
/// - col_end: one past the last barcode to load
pub fn load_chunk<T: CountValue + H5Type>(
    group: &Group,
    col_start: usize,
    col_end: usize,
) -> Result<CountMatrix<T>> {
    let (rows, cols) = read_shape(group)?;
    if col_start > col_end || col_end > cols {
        return Err(MatrixIoError::Bounds {
            start: col_start,
            end: col_end,
            cols,
        });
    }

    let feature_ref = load_feature_ref_from_h5_group(group)?;
    let bcs_ds = open_dataset(group, BCS_DATASET)?;
    if bcs_ds.size() != cols {
        return Err(MatrixIoError::InvalidFormat(format!(
            "{} barcodes stored for {} columns",
            bcs_ds.size(),
            cols
        )));
    }
    let bcs = read_string_range(&bcs_ds, col_start, col_end)?;

    let indptr = read_range::<i64>(group, INDPTR_DATASET, col_start, col_end + 1)?
        .into_iter()
        .map(to_offset)
        .collect::<Result<Vec<usize>>>()?;
    let ind_start = indptr.first().copied().unwrap_or_default();
    let ind_end = if col_end < cols {
        indptr.last().copied().unwrap_or_default()
    } else {
        open_dataset(group, DATA_DATASET)?.size()
    };
    check_indptr_slice(&indptr, ind_start, ind_end, col_start, col_end)?;

    let data = read_range::<T>(group, DATA_DATASET, ind_start, ind_end)?;
    let indices = read_range::<i64>(group, INDICES_DATASET, ind_start, ind_end)?
        .into_iter()
        .map(to_offset)
        .collect::<Result<Vec<usize>>>()?;

    // rebase onto the loaded slice, with the computed end offset closing the last column
    let mut chunk_indptr = indptr[..col_end - col_start]
        .iter()
        .map(|&p| {
            p.checked_sub(ind_start)
                .ok_or_else(|| corrupt_slice(col_start, col_end))
        })
        .collect::<Result<Vec<usize>>>()?;
    chunk_indptr.push(ind_end - ind_start);

    debug!(
        "Loaded columns [{}, {}) with {} entries",
        col_start,
        col_end,
        data.len()
    );

    let storage =
        MatrixStorage::from_csc_parts((rows, col_end - col_start), chunk_indptr, indices, data)?;
    Ok(CountMatrix::new(feature_ref, bcs, storage)?)
}

///
/// Open a container file and load the barcodes `[col_start, col_end)`.
///
pub fn load_chunk_from_h5<T, P>(path: P, col_start: usize, col_end: usize) -> Result<CountMatrix<T>>
where
    T: CountValue + H5Type,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    let group = open_matrix_group(&file)?;
    load_chunk(&group, col_start, col_end)
}

///
/// Load several column ranges of the same container.
///
/// With the `parallel` feature, every range is read through its own file handle on the rayon
/// thread pool; results keep the order of `ranges`.
///
#[cfg(feature = "parallel")]
pub fn load_chunks_from_h5<T, P>(path: P, ranges: &[(usize, usize)]) -> Result<Vec<CountMatrix<T>>>
where
    T: CountValue + H5Type,
    P: AsRef<Path> + Sync,
{
    use rayon::prelude::*;

    ranges
        .par_iter()
        .map(|&(start, end)| load_chunk_from_h5(&path, start, end))
        .collect()
}

///
/// Load several column ranges of the same container, one after the other.
///
#[cfg(not(feature = "parallel"))]
pub fn load_chunks_from_h5<T, P>(path: P, ranges: &[(usize, usize)]) -> Result<Vec<CountMatrix<T>>>
where
    T: CountValue + H5Type,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    let group = open_matrix_group(&file)?;
    ranges
        .iter()
        .map(|&(start, end)| load_chunk(&group, start, end))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    use std::path::PathBuf;

    use countmat_core::{FeatureDef, FeatureReference};

    use crate::h5::attrs::MatrixAttrs;
    use crate::h5::codec::{MatrixH5Write, load_h5_file};

    // 2 x 5, column 2 is empty
    #[fixture]
    fn container() -> PathBuf {
        let feature_ref = FeatureReference::new(
            vec![
                FeatureDef::new("g1", "Gene1", "Gene Expression"),
                FeatureDef::new("g2", "Gene2", "Gene Expression"),
            ],
            vec![],
        );
        let bcs = ["A-1", "C-1", "G-1", "T-1", "N-1"].map(String::from).to_vec();
        let mut m: CountMatrix = CountMatrix::empty(feature_ref, bcs);
        for (f, bc, v) in [
            ("g1", "A-1", 1),
            ("g2", "A-1", 2),
            ("g2", "C-1", 3),
            ("g1", "T-1", 4),
            ("g1", "N-1", 5),
            ("g2", "N-1", 6),
        ] {
            m.add(f, bc, v).unwrap();
        }

        let dir = tempfile::tempdir().unwrap().keep();
        let path = dir.join("matrix.h5");
        m.save_h5_file(&path, &MatrixAttrs::new()).unwrap();
        path
    }

    #[rstest]
    #[case(0, 5)]
    #[case(0, 1)]
    #[case(1, 3)]
    #[case(2, 3)]
    #[case(3, 5)]
    #[case(4, 5)]
    fn test_chunk_matches_selection(container: PathBuf, #[case] start: usize, #[case] end: usize) {
        let full: CountMatrix = load_h5_file(&container).unwrap();
        let expected = full
            .select_barcodes(&(start..end).collect::<Vec<_>>())
            .unwrap();

        let chunk: CountMatrix = load_chunk_from_h5(&container, start, end).unwrap();
        assert_eq!(chunk.shape(), expected.shape());
        assert_eq!(chunk.bcs(), expected.bcs());
        assert_eq!(
            chunk.storage().sorted_entries(),
            expected.storage().sorted_entries()
        );
    }

    #[rstest]
    fn test_empty_range(container: PathBuf) {
        let chunk: CountMatrix = load_chunk_from_h5(&container, 5, 5).unwrap();
        assert_eq!(chunk.shape(), (2, 0));
        assert_eq!(chunk.nnz(), 0);
    }

    #[rstest]
    #[case(3, 2)]
    #[case(0, 6)]
    #[case(6, 6)]
    fn test_out_of_bounds(container: PathBuf, #[case] start: usize, #[case] end: usize) {
        let result: Result<CountMatrix> = load_chunk_from_h5(&container, start, end);
        assert!(matches!(result, Err(MatrixIoError::Bounds { cols: 5, .. })));
    }

    #[rstest]
    #[case(1, 3)]
    #[case(0, 3)]
    #[case(1, 2)]
    fn test_decreasing_indptr_slice(container: PathBuf, #[case] start: usize, #[case] end: usize) {
        {
            let file = File::open_rw(&container).unwrap();
            let indptr = file.dataset("matrix/indptr").unwrap();
            assert_eq!(indptr.read_raw::<i64>().unwrap(), vec![0, 2, 3, 3, 4, 6]);
            indptr.write_raw(&vec![0i64, 2, 0, 3, 4, 6]).unwrap();
        }

        let result: Result<CountMatrix> = load_chunk_from_h5(&container, start, end);
        assert!(matches!(
            result,
            Err(MatrixIoError::Matrix(MatrixError::CorruptData(_)))
        ));
    }

    #[rstest]
    fn test_load_chunks(container: PathBuf) {
        let chunks: Vec<CountMatrix> =
            load_chunks_from_h5(&container, &[(0, 2), (2, 5)]).unwrap();
        let totals: Vec<Vec<i32>> = chunks.iter().map(|c| c.get_counts_per_bc()).collect();
        assert_eq!(totals, vec![vec![3, 3], vec![0, 4, 11]]);
    }
}
