use std::fs::{create_dir_all, remove_file, rename};
use std::path::Path;

use hdf5::{File, Group, H5Type};
use log::{debug, info, warn};

use countmat_core::{CountMatrix, CountValue, FeatureReference, MatrixError, MatrixStorage};

use crate::config::{H5Config, MemoryModel};
use crate::consts::{
    BCS_DATASET, DATA_DATASET, FEATURE_REF_GROUP, FILETYPE_KEY, INDICES_DATASET, INDPTR_DATASET,
    MATRIX_GROUP, MATRIX_H5_FILETYPE, MATRIX_H5_VERSION, SHAPE_DATASET, VERSION_KEY,
};
use crate::error::{MatrixIoError, Result};
use crate::h5::attrs::{MatrixAttrs, write_attr, write_attrs, AttrValue};
use crate::h5::features::{load_feature_ref, save_feature_ref};
use crate::h5::{
    open_dataset, open_group, read_string_attr, read_string_dataset, write_numeric_dataset,
    write_string_dataset,
};
use crate::utils::with_suffix;

pub trait MatrixH5Write {
    ///
    /// Write the matrix to a container file, with the default storage settings.
    ///
    /// # Arguments
    /// - path: the path to the file to create
    /// - attrs: extra top-level metadata attributes
    fn save_h5_file<P: AsRef<Path>>(&mut self, path: P, attrs: &MatrixAttrs) -> Result<()>;

    ///
    /// Write the matrix to a container file.
    ///
    /// The container is written next to `path` and moved into place once complete, so an
    /// interrupted write never leaves a loadable partial file at `path`.
    ///
    /// # Arguments
    /// - path: the path to the file to create
    /// - attrs: extra top-level metadata attributes
    /// - config: chunking and compression settings
    fn save_h5_file_with_config<P: AsRef<Path>>(
        &mut self,
        path: P,
        attrs: &MatrixAttrs,
        config: &H5Config,
    ) -> Result<()>;

    ///
    /// Write the feature reference, barcodes and compressed-sparse-column arrays into `group`.
    /// Converts the matrix to compressed-sparse-column layout.
    ///
    fn save_h5_group(&mut self, group: &Group, config: &H5Config) -> Result<()>;
}

impl<T: CountValue + H5Type> MatrixH5Write for CountMatrix<T> {
    fn save_h5_file<P: AsRef<Path>>(&mut self, path: P, attrs: &MatrixAttrs) -> Result<()> {
        self.save_h5_file_with_config(path, attrs, &H5Config::default())
    }

    fn save_h5_file_with_config<P: AsRef<Path>>(
        &mut self,
        path: P,
        attrs: &MatrixAttrs,
        config: &H5Config,
    ) -> Result<()> {
        let path = path.as_ref();
        config.validate()?;

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        // everything is converted before the first byte is written
        self.to_csc();

        let tmp_path = with_suffix(path, ".tmp");
        if let Err(e) = write_container(self, &tmp_path, attrs, config) {
            if tmp_path.exists() && remove_file(&tmp_path).is_err() {
                warn!("Could not remove partial matrix file {}", tmp_path.display());
            }
            return Err(e);
        }
        rename(&tmp_path, path)?;

        info!(
            "Saved {} x {} matrix ({} entries) to {}",
            self.features_dim(),
            self.bcs_dim(),
            self.nnz(),
            path.display()
        );
        Ok(())
    }

    fn save_h5_group(&mut self, group: &Group, config: &H5Config) -> Result<()> {
        self.to_csc();

        let feature_group = group.create_group(FEATURE_REF_GROUP)?;
        save_feature_ref(self.feature_ref(), &feature_group)?;
        write_string_dataset(group, BCS_DATASET, self.bcs())?;

        let (rows, cols) = self.shape();
        let shape = [dim_to_i32(rows)?, dim_to_i32(cols)?];
        let (indptr, indices, data) = self.storage().csc_parts();
        let indptr: Vec<i64> = indptr.into_iter().map(|p| p as i64).collect();
        let indices: Vec<i64> = indices.into_iter().map(|i| i as i64).collect();

        write_numeric_dataset(group, DATA_DATASET, &data, config)?;
        write_numeric_dataset(group, INDICES_DATASET, &indices, config)?;
        write_numeric_dataset(group, INDPTR_DATASET, &indptr, config)?;
        write_numeric_dataset(group, SHAPE_DATASET, &shape, config)?;
        Ok(())
    }
}

fn write_container<T: CountValue + H5Type>(
    matrix: &mut CountMatrix<T>,
    path: &Path,
    attrs: &MatrixAttrs,
    config: &H5Config,
) -> Result<()> {
    let file = File::create(path)?;
    write_attr(
        &file,
        FILETYPE_KEY,
        &AttrValue::Str(MATRIX_H5_FILETYPE.to_string()),
    )?;
    write_attr(&file, VERSION_KEY, &AttrValue::Int(MATRIX_H5_VERSION))?;
    write_attrs(&file, attrs)?;

    let group = file.create_group(MATRIX_GROUP)?;
    matrix.save_h5_group(&group, config)?;
    drop(group);
    file.close()?;
    Ok(())
}

fn dim_to_i32(dim: usize) -> Result<i32> {
    i32::try_from(dim).map_err(|_| {
        MatrixIoError::Matrix(MatrixError::CorruptData(format!(
            "dimension {} does not fit the container shape type",
            dim
        )))
    })
}

fn to_usize(values: Vec<i64>, what: &str) -> Result<Vec<usize>> {
    values
        .into_iter()
        .map(|v| {
            usize::try_from(v).map_err(|_| {
                MatrixIoError::Matrix(MatrixError::CorruptData(format!(
                    "negative value {} in {}",
                    v, what
                )))
            })
        })
        .collect()
}

///
/// Check the file-type and version attributes of a container and open its `matrix` group.
///
/// A missing version attribute means version 1.
///
pub fn open_matrix_group(file: &File) -> Result<Group> {
    match read_string_attr(file, FILETYPE_KEY)? {
        Some(filetype) if filetype == MATRIX_H5_FILETYPE => {}
        Some(filetype) => {
            return Err(MatrixIoError::InvalidFormat(format!(
                "file type is '{}', expected '{}'",
                filetype, MATRIX_H5_FILETYPE
            )));
        }
        None => {
            return Err(MatrixIoError::InvalidFormat(format!(
                "missing '{}' attribute",
                FILETYPE_KEY
            )));
        }
    }

    let version = if file.attr_names()?.iter().any(|n| n == VERSION_KEY) {
        file.attr(VERSION_KEY)?.read_scalar::<i64>()?
    } else {
        1
    };
    if version > MATRIX_H5_VERSION {
        return Err(MatrixIoError::UnsupportedVersion(version));
    }
    if version < MATRIX_H5_VERSION {
        return Err(MatrixIoError::ObsoleteVersion(version));
    }

    open_group(file, MATRIX_GROUP)
}

///
/// Load a matrix from a container file.
///
/// # Arguments
/// - path: path to the container
pub fn load_h5_file<T, P>(path: P) -> Result<CountMatrix<T>>
where
    T: CountValue + H5Type,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)?;
    let group = open_matrix_group(&file)?;
    let matrix = load_h5_group(&group)?;

    info!(
        "Loaded {} x {} matrix ({} entries) from {}",
        matrix.features_dim(),
        matrix.bcs_dim(),
        matrix.nnz(),
        path.display()
    );
    Ok(matrix)
}

///
/// Load a matrix from a `matrix` group, validating its compressed-sparse-column arrays.
///
pub fn load_h5_group<T: CountValue + H5Type>(group: &Group) -> Result<CountMatrix<T>> {
    let feature_ref = load_feature_ref_from_h5_group(group)?;
    let bcs = load_bcs_from_h5_group(group)?;

    let (rows, cols) = read_shape(group)?;
    let data = open_dataset(group, DATA_DATASET)?.read_raw::<T>()?;
    let indices = to_usize(
        open_dataset(group, INDICES_DATASET)?.read_raw::<i64>()?,
        INDICES_DATASET,
    )?;
    let indptr = to_usize(
        open_dataset(group, INDPTR_DATASET)?.read_raw::<i64>()?,
        INDPTR_DATASET,
    )?;

    let storage = MatrixStorage::from_csc_parts((rows, cols), indptr, indices, data)?;
    Ok(CountMatrix::new(feature_ref, bcs, storage)?)
}

pub(crate) fn read_shape(group: &Group) -> Result<(usize, usize)> {
    let shape = to_usize(
        open_dataset(group, SHAPE_DATASET)?.read_raw::<i64>()?,
        SHAPE_DATASET,
    )?;
    match shape[..] {
        [rows, cols] => Ok((rows, cols)),
        _ => Err(MatrixIoError::InvalidFormat(format!(
            "shape has {} entries, expected 2",
            shape.len()
        ))),
    }
}

pub fn load_bcs_from_h5_group(group: &Group) -> Result<Vec<String>> {
    read_string_dataset(&open_dataset(group, BCS_DATASET)?)
}

pub fn load_feature_ref_from_h5_group(group: &Group) -> Result<FeatureReference> {
    load_feature_ref(&open_group(group, FEATURE_REF_GROUP)?)
}

///
/// Matrix dimensions without loading the matrix.
///
/// # Returns
/// - `(features, barcodes, stored entries)`
pub fn load_dims(group: &Group) -> Result<(usize, usize, usize)> {
    let (rows, cols) = read_shape(group)?;
    let entries = open_dataset(group, DATA_DATASET)?.size();
    Ok((rows, cols, entries))
}

pub fn load_dims_from_h5<P: AsRef<Path>>(path: P) -> Result<(usize, usize, usize)> {
    let file = File::open(path.as_ref())?;
    load_dims(&open_group(&file, MATRIX_GROUP)?)
}

/// Estimated memory (GB) to load a matrix of the given size, with the default memory model.
pub fn get_mem_gb_from_matrix_dim(num_barcodes: usize, nonzero_entries: usize) -> u64 {
    MemoryModel::default().mem_gb(num_barcodes, nonzero_entries)
}

pub fn get_mem_gb_from_group(group: &Group) -> Result<u64> {
    let (_, num_bcs, nonzero_entries) = load_dims(group)?;
    Ok(get_mem_gb_from_matrix_dim(num_bcs, nonzero_entries))
}

pub fn get_mem_gb_from_matrix_h5<P: AsRef<Path>>(path: P) -> Result<u64> {
    let file = File::open(path.as_ref())?;
    get_mem_gb_from_group(&open_group(&file, MATRIX_GROUP)?)
}

/// Number of barcodes of a container. Doublets count once per barcode.
pub fn count_cells_from_h5<P: AsRef<Path>>(path: P) -> Result<usize> {
    let (_, bcs, _) = load_dims_from_h5(path)?;
    Ok(bcs)
}

/// Distinct genomes of the gene expression features of a container.
pub fn get_genomes_from_h5<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let file = File::open(path.as_ref())?;
    let feature_ref = load_feature_ref_from_h5_group(&open_group(&file, MATRIX_GROUP)?)?;
    Ok(feature_ref.genomes())
}

///
/// Load every container and add them together, elementwise.
///
/// All containers must share the same shape. The result is in compressed-sparse-column layout,
/// `None` when `paths` is empty.
///
pub fn merge_matrices<T, P>(paths: &[P]) -> Result<Option<CountMatrix<T>>>
where
    T: CountValue + H5Type,
    P: AsRef<Path>,
{
    let mut matrix: Option<CountMatrix<T>> = None;
    for path in paths {
        let other = load_h5_file(path)?;
        match matrix.as_mut() {
            None => matrix = Some(other),
            Some(m) => m.merge(&other)?,
        }
    }
    if let Some(m) = matrix.as_mut() {
        m.to_csc();
        debug!("Merged {} matrices into {}", paths.len(), m);
    }
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    use countmat_core::consts::{DEFAULT_LIBRARY_TYPE, GENOME_TAG};
    use countmat_core::{FeatureDef, Layout};

    use crate::consts::CHEMISTRY_DESC_KEY;
    use crate::h5::attrs::{load_chemistry_from_h5, make_matrix_attrs_count};

    #[fixture]
    fn matrix() -> CountMatrix {
        let feature_ref = FeatureReference::new(
            vec![
                FeatureDef::new("g1", "Gene1", DEFAULT_LIBRARY_TYPE).with_tag(GENOME_TAG, "hg19"),
                FeatureDef::new("g2", "Gene2", DEFAULT_LIBRARY_TYPE).with_tag(GENOME_TAG, "mm10"),
                FeatureDef::new("g3", "Gene3", DEFAULT_LIBRARY_TYPE).with_tag(GENOME_TAG, "hg19"),
            ],
            vec![GENOME_TAG.to_string()],
        );
        let bcs = ["AAAA-1", "CCCC-1", "GGGG-1"].map(String::from).to_vec();
        let mut m = CountMatrix::empty(feature_ref, bcs);
        m.add("g1", "AAAA-1", 5).unwrap();
        m.add("g2", "CCCC-1", 2).unwrap();
        m.add("g3", "CCCC-1", 7).unwrap();
        m
    }

    #[rstest]
    fn test_save_and_load(mut matrix: CountMatrix) {
        let dir = tempfile::tempdir().unwrap().keep();
        let path = dir.join("nested").join("matrix.h5");

        matrix.save_h5_file(&path, &MatrixAttrs::new()).unwrap();
        assert_eq!(matrix.layout(), Layout::Csc);
        assert!(!with_suffix(&path, ".tmp").exists());

        let loaded: CountMatrix = load_h5_file(&path).unwrap();
        assert_eq!(loaded.shape(), (3, 3));
        assert_eq!(loaded.bcs(), matrix.bcs());
        assert_eq!(loaded.feature_ref(), matrix.feature_ref());
        assert_eq!(
            loaded.storage().sorted_entries(),
            matrix.storage().sorted_entries()
        );
    }

    #[rstest]
    fn test_dims_and_helpers(mut matrix: CountMatrix) {
        let dir = tempfile::tempdir().unwrap().keep();
        let path = dir.join("matrix.h5");
        let attrs = make_matrix_attrs_count("sample", &[1], "Single Cell 3' v2");
        matrix.save_h5_file(&path, &attrs).unwrap();

        assert_eq!(load_dims_from_h5(&path).unwrap(), (3, 3, 3));
        assert_eq!(count_cells_from_h5(&path).unwrap(), 3);
        assert_eq!(get_mem_gb_from_matrix_h5(&path).unwrap(), 2);
        assert_eq!(get_genomes_from_h5(&path).unwrap(), vec!["hg19", "mm10"]);
        assert_eq!(load_chemistry_from_h5(&path).unwrap(), "Single Cell 3' v2");
        assert!(crate::h5::attrs::get_matrix_attrs(&path)
            .unwrap()
            .contains_key(CHEMISTRY_DESC_KEY));
    }

    #[rstest]
    fn test_load_rejects_wrong_filetype() {
        let dir = tempfile::tempdir().unwrap().keep();
        let path = dir.join("other.h5");
        {
            let file = File::create(&path).unwrap();
            write_attr(&file, FILETYPE_KEY, &AttrValue::Str("molecule".to_string())).unwrap();
        }
        let result: Result<CountMatrix> = load_h5_file(&path);
        assert!(matches!(result, Err(MatrixIoError::InvalidFormat(_))));
    }

    #[rstest]
    fn test_missing_version_is_obsolete() {
        let dir = tempfile::tempdir().unwrap().keep();
        let path = dir.join("v1.h5");
        {
            let file = File::create(&path).unwrap();
            write_attr(&file, FILETYPE_KEY, &AttrValue::Str(MATRIX_H5_FILETYPE.to_string())).unwrap();
        }
        let result: Result<CountMatrix> = load_h5_file(&path);
        assert!(matches!(result, Err(MatrixIoError::ObsoleteVersion(1))));
    }

    #[rstest]
    fn test_missing_matrix_group() {
        let dir = tempfile::tempdir().unwrap().keep();
        let path = dir.join("nogroup.h5");
        {
            let file = File::create(&path).unwrap();
            write_attr(&file, FILETYPE_KEY, &AttrValue::Str(MATRIX_H5_FILETYPE.to_string())).unwrap();
            write_attr(&file, VERSION_KEY, &AttrValue::Int(MATRIX_H5_VERSION)).unwrap();
        }
        let result: Result<CountMatrix> = load_h5_file(&path);
        assert!(matches!(result, Err(MatrixIoError::InvalidFormat(_))));
    }

    #[rstest]
    fn test_save_with_custom_config(mut matrix: CountMatrix) {
        let dir = tempfile::tempdir().unwrap().keep();
        let path = dir.join("small_chunks.h5");
        let config = H5Config {
            chunk_size: 2,
            compression_level: None,
            ..H5Config::default()
        };
        matrix
            .save_h5_file_with_config(&path, &MatrixAttrs::new(), &config)
            .unwrap();

        let loaded: CountMatrix = load_h5_file(&path).unwrap();
        assert_eq!(loaded.get_counts_per_bc(), vec![5, 9, 0]);
    }

    #[rstest]
    fn test_invalid_config_writes_nothing(mut matrix: CountMatrix) {
        let dir = tempfile::tempdir().unwrap().keep();
        let path = dir.join("never.h5");
        let config = H5Config {
            chunk_size: 0,
            ..H5Config::default()
        };
        assert!(matrix
            .save_h5_file_with_config(&path, &MatrixAttrs::new(), &config)
            .is_err());
        assert!(!path.exists());
    }

    #[rstest]
    fn test_merge_matrices(mut matrix: CountMatrix) {
        let dir = tempfile::tempdir().unwrap().keep();
        let a = dir.join("a.h5");
        let b = dir.join("b.h5");
        matrix.save_h5_file(&a, &MatrixAttrs::new()).unwrap();
        matrix.save_h5_file(&b, &MatrixAttrs::new()).unwrap();

        let merged: CountMatrix = merge_matrices(&[&a, &b]).unwrap().unwrap();
        assert_eq!(merged.layout(), Layout::Csc);
        assert_eq!(merged.get_counts_per_bc(), vec![10, 18, 0]);

        let none: Option<CountMatrix> = merge_matrices::<i32, &Path>(&[]).unwrap();
        assert!(none.is_none());
    }

    #[rstest]
    fn test_float_matrix_round_trip() {
        let feature_ref = FeatureReference::new(
            vec![FeatureDef::new("g1", "Gene1", DEFAULT_LIBRARY_TYPE)],
            vec![],
        );
        let mut m: CountMatrix<f64> = CountMatrix::empty(feature_ref, vec!["A-1".to_string()]);
        m.add("g1", "A-1", 0.25).unwrap();

        let dir = tempfile::tempdir().unwrap().keep();
        let path = dir.join("float.h5");
        m.save_h5_file(&path, &MatrixAttrs::new()).unwrap();

        let loaded: CountMatrix<f64> = load_h5_file(&path).unwrap();
        assert_eq!(loaded.get("g1", "A-1").unwrap(), 0.25);
    }
}
