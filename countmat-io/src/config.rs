use std::fs::read_to_string;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{
    HDF5_CHUNK_SIZE, HDF5_COMPRESSION_LEVEL, MATRIX_MEM_GB_MULTIPLIER,
    NUM_MATRIX_BARCODES_PER_MEM_GB, NUM_MATRIX_ENTRIES_PER_MEM_GB,
};

///
/// Linear model used to estimate the memory needed to load a matrix.
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MemoryModel {
    pub entries_per_gb: f64,
    pub barcodes_per_gb: f64,
    pub multiplier: u64,
}

impl Default for MemoryModel {
    fn default() -> Self {
        MemoryModel {
            entries_per_gb: NUM_MATRIX_ENTRIES_PER_MEM_GB,
            barcodes_per_gb: NUM_MATRIX_BARCODES_PER_MEM_GB,
            multiplier: MATRIX_MEM_GB_MULTIPLIER,
        }
    }
}

impl MemoryModel {
    ///
    /// Estimate the memory (in GB) needed to load a matrix: stored entries plus a fixed cost per
    /// barcode, rounded up to a whole GB and scaled by the multiplier.
    ///
    pub fn mem_gb(&self, num_barcodes: usize, nonzero_entries: usize) -> u64 {
        let gb = nonzero_entries as f64 / self.entries_per_gb
            + num_barcodes as f64 / self.barcodes_per_gb;
        self.multiplier * gb.ceil() as u64
    }
}

///
/// Storage settings for writing matrix containers.
///
/// The defaults are the values of the container format; a TOML file only needs to list the
/// fields it overrides:
///
/// ```toml
/// chunk_size = 80000
/// compression_level = 4
///
/// [memory]
/// multiplier = 3
/// ```
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct H5Config {
    /// Number of elements per chunk of every numeric dataset
    pub chunk_size: usize,
    /// gzip level (0-9) of every numeric dataset, `None` to disable compression
    pub compression_level: Option<u8>,
    pub memory: MemoryModel,
}

impl Default for H5Config {
    fn default() -> Self {
        H5Config {
            chunk_size: HDF5_CHUNK_SIZE,
            compression_level: Some(HDF5_COMPRESSION_LEVEL),
            memory: MemoryModel::default(),
        }
    }
}

#[derive(Error, Debug)]
pub enum H5ConfigError {
    #[error("Invalid matrix storage config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

pub type H5ConfigResult<T> = std::result::Result<T, H5ConfigError>;

impl H5Config {
    pub fn validate(&self) -> H5ConfigResult<()> {
        if self.chunk_size == 0 {
            return Err(H5ConfigError::Invalid("chunk_size must be positive".to_string()));
        }
        if let Some(level) = self.compression_level {
            if level > 9 {
                return Err(H5ConfigError::Invalid(format!(
                    "compression_level must be between 0 and 9, got {}",
                    level
                )));
            }
        }
        if self.memory.entries_per_gb <= 0.0 || self.memory.barcodes_per_gb <= 0.0 {
            return Err(H5ConfigError::Invalid(
                "memory model rates must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl TryFrom<&Path> for H5Config {
    type Error = H5ConfigError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let toml_str = read_to_string(path)?;
        let config: H5Config = toml::from_str(&toml_str)?;
        config.validate()?;
        Ok(config)
    }
}
