//! # Persistence for count matrices.
//!
//! This crate reads and writes [countmat_core::CountMatrix] values:
//!
//! - the HDF5 matrix container (save, load, column-range load, dims and memory estimates,
//!   metadata attributes and merging), see [h5];
//! - MatrixMarket directories and streaming `.mtx` concatenation, see [mex];
//! - dense CSV tables, see [dense].
//!
//! ```no_run
//! use countmat_core::CountMatrix;
//! use countmat_io::{MatrixAttrs, MatrixH5Write, load_h5_file, load_chunk_from_h5};
//!
//! let mut matrix: CountMatrix = load_h5_file("filtered_matrix.h5").unwrap();
//! matrix.save_h5_file("copy.h5", &MatrixAttrs::new()).unwrap();
//!
//! // first 1000 barcodes only
//! let chunk: CountMatrix = load_chunk_from_h5("filtered_matrix.h5", 0, 1000).unwrap();
//! ```
//!
pub mod config;
pub mod consts;
pub mod dense;
pub mod error;
pub mod h5;
pub mod mex;
pub mod utils;

// re-expose core functions
pub use config::*;
pub use dense::*;
pub use error::*;
pub use h5::*;
pub use mex::*;
