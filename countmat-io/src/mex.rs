//!
//! MatrixMarket export of count matrices and streaming concatenation of `.mtx` files.
//!
use std::fs::create_dir_all;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::info;

use countmat_core::{CountMatrix, CountValue, FeatureReference};

use crate::consts::{
    BARCODES_FILENAME, FEATURES_FILENAME, GZ_SUFFIX, MTX_FILENAME, MTX_HEADER,
};
use crate::error::{MatrixIoError, Result};
use crate::utils::{OutputWriter, get_dynamic_reader, read_trimmed_line};

fn output_path(base_dir: &Path, name: &str, compress: bool) -> PathBuf {
    match compress {
        true => base_dir.join(format!("{}{}", name, GZ_SUFFIX)),
        false => base_dir.join(name),
    }
}

pub trait MexWrite {
    ///
    /// Write the matrix as a MatrixMarket directory: `matrix.mtx`, `barcodes.tsv`, and a feature
    /// listing written by `save_features`.
    ///
    /// Only integer matrices can be written. The matrix is converted to coordinate layout and
    /// entries are written in the order that layout holds them.
    ///
    /// # Arguments
    /// - base_dir: output directory, created if needed
    /// - save_features: writes the feature listing, given the feature reference, `base_dir` and
    ///   `compress`
    /// - compress: gzip every file and add a `.gz` suffix
    fn save_mex<P, F>(&mut self, base_dir: P, save_features: F, compress: bool) -> Result<()>
    where
        P: AsRef<Path>,
        F: FnOnce(&FeatureReference, &Path, bool) -> Result<()>;
}

impl<T: CountValue> MexWrite for CountMatrix<T> {
    fn save_mex<P, F>(&mut self, base_dir: P, save_features: F, compress: bool) -> Result<()>
    where
        P: AsRef<Path>,
        F: FnOnce(&FeatureReference, &Path, bool) -> Result<()>,
    {
        if !T::DTYPE.is_integer() {
            return Err(MatrixIoError::UnsupportedDtype(T::DTYPE));
        }
        let base_dir = base_dir.as_ref();
        create_dir_all(base_dir)?;

        self.to_coo();
        let (rows, cols) = self.shape();
        let mtx_path = output_path(base_dir, MTX_FILENAME, compress);
        let mut writer = OutputWriter::create(&mtx_path, compress)?;

        writeln!(writer, "{}", MTX_HEADER)?;
        writeln!(writer, "%%")?;
        writeln!(writer, "{} {} {}", rows, cols, self.nnz())?;
        if let Some(coo) = self.storage().as_coo() {
            for ((r, c), v) in coo.row_inds().iter().zip(coo.col_inds()).zip(coo.data()) {
                writeln!(writer, "{} {} {}", r + 1, c + 1, v)?;
            }
        }
        writer.finish()?;

        save_features(self.feature_ref(), base_dir, compress)?;

        let mut writer = OutputWriter::create(&output_path(base_dir, BARCODES_FILENAME, compress), compress)?;
        for bc in self.bcs() {
            writeln!(writer, "{}", bc)?;
        }
        writer.finish()?;

        info!(
            "Wrote {} x {} MatrixMarket matrix to {}",
            rows,
            cols,
            base_dir.display()
        );
        Ok(())
    }
}

///
/// Default feature listing: one `id<TAB>name<TAB>feature_type` line per feature, in
/// `features.tsv` (or `features.tsv.gz`).
///
pub fn write_features_tsv(feature_ref: &FeatureReference, base_dir: &Path, compress: bool) -> Result<()> {
    let mut writer = OutputWriter::create(&output_path(base_dir, FEATURES_FILENAME, compress), compress)?;
    for def in feature_ref.iter() {
        writeln!(writer, "{}\t{}\t{}", def.id, def.name, def.feature_type)?;
    }
    writer.finish()
}

/// Parsed `rows cols entries` line of a MatrixMarket file.
fn parse_dims(line: &str, path: &Path) -> Result<(u64, u64, u64)> {
    let fields = line
        .split_whitespace()
        .map(|f| f.parse::<u64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| MatrixIoError::InvalidMtx(format!("{}: {}", path.display(), e)))?;
    match fields[..] {
        [rows, cols, entries] => Ok((rows, cols, entries)),
        _ => Err(MatrixIoError::InvalidMtx(format!(
            "{}: expected 'rows cols entries', found '{}'",
            path.display(),
            line
        ))),
    }
}

fn read_header_line<R: io::BufRead>(reader: &mut R, path: &Path) -> Result<String> {
    read_trimmed_line(reader)?.ok_or_else(|| {
        MatrixIoError::InvalidMtx(format!("{}: truncated header", path.display()))
    })
}

///
/// Concatenate MatrixMarket files sharing the same dimensions into one file, without parsing
/// their entries.
///
/// The two header lines and the dimensions of the first file are kept, with the entry count
/// replaced by the sum over all inputs. Bodies are then copied in input order. Dimensions of
/// the other inputs are trusted, not checked. Inputs and output ending in `.gz` are gzip
/// compressed. An empty input list writes nothing.
///
pub fn concatenate_mtx<P: AsRef<Path>, Q: AsRef<Path>>(inputs: &[P], output: Q) -> Result<()> {
    let Some(first) = inputs.first() else {
        return Ok(());
    };
    let output = output.as_ref();

    let first = first.as_ref();
    let mut reader = get_dynamic_reader(first)?;
    let header = read_header_line(&mut reader, first)?;
    let comment = read_header_line(&mut reader, first)?;
    let (rows, cols, mut entries) = parse_dims(&read_header_line(&mut reader, first)?, first)?;

    for input in inputs.iter().skip(1) {
        let input = input.as_ref();
        let mut reader = get_dynamic_reader(input)?;
        read_header_line(&mut reader, input)?;
        read_header_line(&mut reader, input)?;
        let (_, _, other_entries) = parse_dims(&read_header_line(&mut reader, input)?, input)?;
        entries += other_entries;
    }

    let mut writer = OutputWriter::create_dynamic(output)?;
    writeln!(writer, "{}", header)?;
    writeln!(writer, "{}", comment)?;
    writeln!(writer, "{} {} {}", rows, cols, entries)?;

    for input in inputs {
        let input = input.as_ref();
        let mut reader = get_dynamic_reader(input)?;
        for _ in 0..3 {
            read_header_line(&mut reader, input)?;
        }
        io::copy(&mut reader, &mut writer)?;
    }
    writer.finish()?;

    info!(
        "Concatenated {} MatrixMarket files ({} entries) into {}",
        inputs.len(),
        entries,
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    use std::fs::{read_to_string, write};
    use std::io::Read;

    use countmat_core::consts::DEFAULT_LIBRARY_TYPE;
    use countmat_core::FeatureDef;

    fn read_all(path: &Path) -> String {
        let mut contents = String::new();
        get_dynamic_reader(path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        contents
    }

    #[fixture]
    fn matrix() -> CountMatrix {
        let feature_ref = FeatureReference::new(
            vec![
                FeatureDef::new("g1", "Gene1", DEFAULT_LIBRARY_TYPE),
                FeatureDef::new("g2", "Gene2", DEFAULT_LIBRARY_TYPE),
                FeatureDef::new("g3", "Gene3", DEFAULT_LIBRARY_TYPE),
            ],
            vec![],
        );
        let bcs = ["AAAA-1", "CCCC-1"].map(String::from).to_vec();
        let mut m = CountMatrix::empty(feature_ref, bcs);
        m.add("g1", "AAAA-1", 5).unwrap();
        m.add("g3", "CCCC-1", 2).unwrap();
        m
    }

    #[rstest]
    #[case(false)]
    #[case(true)]
    fn test_save_mex(mut matrix: CountMatrix, #[case] compress: bool) {
        let dir = tempfile::tempdir().unwrap().keep().join("mex");
        matrix.save_mex(&dir, write_features_tsv, compress).unwrap();

        let suffix = if compress { ".gz" } else { "" };
        let mtx = read_all(&dir.join(format!("matrix.mtx{}", suffix)));
        let mut lines = mtx.lines();
        assert_eq!(lines.next(), Some(MTX_HEADER));
        assert_eq!(lines.next(), Some("%%"));
        assert_eq!(lines.next(), Some("3 2 2"));
        let mut entries: Vec<&str> = lines.collect();
        entries.sort();
        assert_eq!(entries, vec!["1 1 5", "3 2 2"]);

        assert_eq!(
            read_all(&dir.join(format!("barcodes.tsv{}", suffix))),
            "AAAA-1\nCCCC-1\n"
        );
        assert_eq!(
            read_all(&dir.join(format!("features.tsv{}", suffix))).lines().next(),
            Some("g1\tGene1\tGene Expression")
        );
    }

    #[rstest]
    fn test_save_mex_rejects_floats() {
        let feature_ref = FeatureReference::new(vec![FeatureDef::new("g1", "Gene1", DEFAULT_LIBRARY_TYPE)], vec![]);
        let mut m: CountMatrix<f32> = CountMatrix::empty(feature_ref, vec!["A-1".to_string()]);
        let dir = tempfile::tempdir().unwrap().keep();

        let result = m.save_mex(&dir, write_features_tsv, false);
        assert!(matches!(result, Err(MatrixIoError::UnsupportedDtype(_))));
        assert!(!dir.join("matrix.mtx").exists());
    }

    #[rstest]
    fn test_save_mex_custom_feature_writer(mut matrix: CountMatrix) {
        let dir = tempfile::tempdir().unwrap().keep();
        matrix
            .save_mex(
                &dir,
                |feature_ref: &FeatureReference, base_dir: &Path, _compress: bool| {
                    write(base_dir.join("genes.tsv"), feature_ref.ids().join("\n"))?;
                    Ok(())
                },
                false,
            )
            .unwrap();
        assert_eq!(read_to_string(dir.join("genes.tsv")).unwrap(), "g1\ng2\ng3");
    }

    #[rstest]
    fn test_concatenate_mtx() {
        let dir = tempfile::tempdir().unwrap().keep();
        let a = dir.join("a.mtx");
        let b = dir.join("b.mtx");
        write(&a, format!("{}\n%%\n3 2 2\n1 1 5\n2 1 1\n", MTX_HEADER)).unwrap();
        write(&b, format!("{}\n%%\n3 2 2\n3 2 2\n1 2 7\n", MTX_HEADER)).unwrap();

        let out = dir.join("out.mtx");
        concatenate_mtx(&[&a, &b], &out).unwrap();

        assert_eq!(
            read_to_string(&out).unwrap(),
            format!("{}\n%%\n3 2 4\n1 1 5\n2 1 1\n3 2 2\n1 2 7\n", MTX_HEADER)
        );
    }

    #[rstest]
    fn test_concatenate_gzipped(mut matrix: CountMatrix) {
        let dir = tempfile::tempdir().unwrap().keep();
        matrix.save_mex(dir.join("x"), write_features_tsv, true).unwrap();
        matrix.save_mex(dir.join("y"), write_features_tsv, true).unwrap();

        let out = dir.join("merged.mtx.gz");
        concatenate_mtx(
            &[dir.join("x/matrix.mtx.gz"), dir.join("y/matrix.mtx.gz")],
            &out,
        )
        .unwrap();

        let merged = read_all(&out);
        assert_eq!(merged.lines().nth(2), Some("3 2 4"));
        assert_eq!(merged.lines().count(), 7);
    }

    #[rstest]
    fn test_concatenate_nothing() {
        let dir = tempfile::tempdir().unwrap().keep();
        let out = dir.join("out.mtx");
        concatenate_mtx::<PathBuf, _>(&[], &out).unwrap();
        assert!(!out.exists());
    }

    #[rstest]
    fn test_concatenate_bad_header() {
        let dir = tempfile::tempdir().unwrap().keep();
        let a = dir.join("a.mtx");
        write(&a, format!("{}\n%%\n3 two 2\n", MTX_HEADER)).unwrap();

        let result = concatenate_mtx(&[&a], dir.join("out.mtx"));
        assert!(matches!(result, Err(MatrixIoError::InvalidMtx(_))));
    }
}
