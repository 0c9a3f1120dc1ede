//!
//! Dense CSV export, for small matrices and debugging.
//!
use std::path::Path;

use log::debug;

use countmat_core::{CountMatrix, CountValue};

use crate::error::Result;

///
/// Write the matrix as a dense CSV table: one row per feature, one column per barcode.
///
/// The header row is an empty cell followed by the barcodes; every following row starts with
/// the feature id. Absent entries are written as zeros.
///
/// # Arguments
/// - matrix: matrix to export
/// - path: output CSV file
pub fn save_dense_csv<T: CountValue, P: AsRef<Path>>(matrix: &CountMatrix<T>, path: P) -> Result<()> {
    let (rows, cols) = matrix.shape();
    let mut dense = vec![T::zero(); rows * cols];
    matrix.storage().for_each_entry(|r, c, v| dense[r * cols + c] += v);

    let mut writer = csv::Writer::from_path(path.as_ref())?;
    writer.write_record(std::iter::once("").chain(matrix.bcs().iter().map(|s| s.as_str())))?;

    for (def, row) in matrix.feature_ref().iter().zip(dense.chunks(cols.max(1))) {
        let mut record = Vec::with_capacity(cols + 1);
        record.push(def.id.to_owned());
        record.extend(row.iter().take(cols).map(|v| v.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;

    debug!("Wrote dense {} x {} table to {}", rows, cols, path.as_ref().display());
    Ok(())
}
