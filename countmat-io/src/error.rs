use std::io;
use thiserror::Error;

use countmat_core::{DType, MatrixError};

use crate::config::H5ConfigError;

/// Error type for countmat-io operations.
#[derive(Error, Debug)]
pub enum MatrixIoError {
    /// Error raised by the in-memory matrix (lookup, shape, corrupt structure...).
    #[error(transparent)]
    Matrix(#[from] MatrixError),

    /// IO error occurred during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Config(#[from] H5ConfigError),

    /// Missing or wrong file-type tag, or a missing required group or dataset.
    #[error("HDF5 file is not a valid matrix HDF5 file: {0}")]
    InvalidFormat(String),

    #[error(
        "Matrix HDF5 file format version ({0}) is a newer version that is not supported by this version of the software."
    )]
    UnsupportedVersion(i64),

    #[error(
        "Matrix HDF5 file format version ({0}) is an older version that is no longer supported."
    )]
    ObsoleteVersion(i64),

    /// Invalid column range for a chunked load.
    #[error("Column range [{start}, {end}) is out of bounds for a matrix with {cols} columns")]
    Bounds {
        start: usize,
        end: usize,
        cols: usize,
    },

    #[error("Unsupported dtype {0}: only integer matrices can be written as MatrixMarket")]
    UnsupportedDtype(DType),

    /// A label cannot be stored as an HDF5 string (e.g. it contains a NUL byte).
    #[error("Invalid string for HDF5 storage: {0}")]
    InvalidString(String),

    /// Malformed MatrixMarket input.
    #[error("Invalid MatrixMarket file: {0}")]
    InvalidMtx(String),
}

/// Result type alias for countmat-io operations.
pub type Result<T> = std::result::Result<T, MatrixIoError>;
