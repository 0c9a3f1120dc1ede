// top-level container attributes
pub const FILETYPE_KEY: &str = "filetype";
pub const MATRIX_H5_FILETYPE: &str = "matrix";
pub const VERSION_KEY: &str = "version";
pub const MATRIX_H5_VERSION: i64 = 2;

// optional metadata attributes
pub const CHEMISTRY_DESC_KEY: &str = "chemistry_description";
pub const LIBRARY_ID_MAPPING_KEY: &str = "library_ids";
pub const ORIG_GEM_GROUP_MAPPING_KEY: &str = "original_gem_groups";
pub const METADATA_ATTRS: [&str; 3] = [
    CHEMISTRY_DESC_KEY,
    LIBRARY_ID_MAPPING_KEY,
    ORIG_GEM_GROUP_MAPPING_KEY,
];
pub const UNKNOWN_CHEMISTRY: &str = "Unknown";

// matrix group layout
pub const MATRIX_GROUP: &str = "matrix";
pub const FEATURE_REF_GROUP: &str = "features";
pub const BCS_DATASET: &str = "barcodes";
pub const DATA_DATASET: &str = "data";
pub const INDICES_DATASET: &str = "indices";
pub const INDPTR_DATASET: &str = "indptr";
pub const SHAPE_DATASET: &str = "shape";

// feature reference layout
pub const FEATURE_ID_DATASET: &str = "id";
pub const FEATURE_NAME_DATASET: &str = "name";
pub const FEATURE_TYPE_DATASET: &str = "feature_type";
pub const FEATURE_TAG_KEYS_DATASET: &str = "_all_tag_keys";

// storage defaults
pub const HDF5_CHUNK_SIZE: usize = 80_000;
pub const HDF5_COMPRESSION_LEVEL: u8 = 4;
pub const NUM_MATRIX_ENTRIES_PER_MEM_GB: f64 = 50e6;
pub const NUM_MATRIX_BARCODES_PER_MEM_GB: f64 = 2e6;
pub const MATRIX_MEM_GB_MULTIPLIER: u64 = 2;

// MatrixMarket export
pub const MTX_HEADER: &str = "%%MatrixMarket matrix coordinate integer general";
pub const MTX_FILENAME: &str = "matrix.mtx";
pub const BARCODES_FILENAME: &str = "barcodes.tsv";
pub const FEATURES_FILENAME: &str = "features.tsv";
pub const GZ_SUFFIX: &str = ".gz";
