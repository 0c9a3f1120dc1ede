use thiserror::Error;

/// Error type for in-memory count matrix operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    /// Lookup of a feature id that is not on the feature axis.
    #[error("Specified feature ID not found in matrix: {0}")]
    FeatureNotFound(String),

    /// Lookup of a barcode sequence that is not on the barcode axis.
    #[error("Specified barcode not found in matrix: {0}")]
    BarcodeNotFound(String),

    #[error("Shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Numeric storage violates a structural invariant (e.g. a decreasing column pointer).
    #[error("Corrupt matrix data: {0}")]
    CorruptData(String),

    #[error("Index {index} is out of bounds for axis of length {len}")]
    Bounds { index: usize, len: usize },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Duplicate label on axis: {0}")]
    DuplicateLabel(String),
}

/// Result type alias for countmat-core operations.
pub type Result<T> = std::result::Result<T, MatrixError>;
