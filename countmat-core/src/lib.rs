//! # countmat-core
//!
//! In-memory engine for sparse feature x barcode count matrices.
//!
//! ## Main Components
//!
//! - **`CountMatrix`**: a sparse matrix whose rows are labelled by a `FeatureReference` and
//!   whose columns are labelled by barcode sequences. Built incrementally with `add`, merged
//!   elementwise with `merge`, and sub-selected into new matrices.
//! - **`MatrixView`**: a borrowed, masked overlay that computes sums and counts over a logical
//!   sub-matrix without copying numeric data.
//! - **`MatrixStorage`**: the numeric storage, held in one of three layouts (list-of-lists,
//!   coordinate, compressed sparse column) with explicit conversions between them.
//! - **`AxisIndex`**: label to position lookup for either axis.
//!
//! ## Example
//!
//! ```rust
//! use countmat_core::{CountMatrix, FeatureDef, FeatureReference};
//!
//! let feature_ref = FeatureReference::new(
//!     vec![
//!         FeatureDef::new("g1", "Gene1", "Gene Expression"),
//!         FeatureDef::new("g2", "Gene2", "Gene Expression"),
//!     ],
//!     vec![],
//! );
//! let bcs = vec!["AAAA-1".to_string(), "CCCC-1".to_string()];
//!
//! let mut matrix: CountMatrix = CountMatrix::empty(feature_ref, bcs);
//! matrix.add("g1", "AAAA-1", 5).unwrap();
//! matrix.add("g2", "CCCC-1", 2).unwrap();
//!
//! assert_eq!(matrix.get_counts_per_bc(), vec![5, 2]);
//! ```
//!
pub mod consts;
pub mod errors;
pub mod matrix;
pub mod models;
pub mod storage;
pub mod utils;
pub mod value;
pub mod view;

// re-expose core types
pub use errors::*;
pub use matrix::CountMatrix;
pub use models::*;
pub use storage::{Axis, Layout, LilMatrix, MatrixStorage, Reduced};
pub use value::{CountValue, DType};
pub use view::MatrixView;
