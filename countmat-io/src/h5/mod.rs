//!
//! HDF5 container codec for count matrices.
//!
//! A container file carries two top-level attributes, `filetype = "matrix"` and `version = 2`,
//! optional metadata attributes, and a single `matrix` group:
//!
//! ```text
//! /matrix
//!     features/      feature reference (id, name, feature_type, _all_tag_keys, one dataset per tag)
//!     barcodes       string[bcs_dim]
//!     data           T[nnz]
//!     indices        i64[nnz]
//!     indptr         i64[bcs_dim + 1]
//!     shape          i32[2]
//! ```
//!
//! Numeric datasets are chunked, gzip compressed and extensible. Strings are written as
//! variable-length UTF-8; fixed-length ASCII or UTF-8 strings, as written by older tools, are
//! accepted on read.
//!
pub mod attrs;
pub mod chunk;
pub mod codec;
pub mod features;

use std::str::FromStr;

use hdf5::types::{FixedAscii, FixedUnicode, TypeDescriptor, VarLenAscii, VarLenUnicode};
use hdf5::{Dataset, Group, H5Type, Location};

use crate::config::H5Config;
use crate::error::{MatrixIoError, Result};

pub use self::attrs::*;
pub use self::chunk::*;
pub use self::codec::*;
pub use self::features::*;

/// Widest fixed-length string accepted on read, in bytes.
pub(crate) const MAX_FIXED_STRING_WIDTH: usize = 4096;

// Evaluate `$body` with `$alias` naming a `$kind` string type at least `$size` bytes wide.
// HDF5 pads narrower stored strings with NULs when converting to the wider type.
macro_rules! with_fixed_width {
    ($size:expr, $kind:ident, $alias:ident => $body:expr) => {
        match $size {
            0..=64 => {
                type $alias = $kind<64>;
                $body
            }
            65..=256 => {
                type $alias = $kind<256>;
                $body
            }
            257..=$crate::h5::MAX_FIXED_STRING_WIDTH => {
                type $alias = $kind<4096>;
                $body
            }
            other => Err($crate::error::MatrixIoError::InvalidFormat(format!(
                "fixed-length strings of {} bytes are not supported",
                other
            ))),
        }
    };
}
pub(crate) use with_fixed_width;

/// Fixed-length strings are NUL padded.
pub(crate) fn trim_padding(s: &str) -> String {
    s.trim_end_matches('\0').to_string()
}

pub(crate) fn to_varlen(values: &[String]) -> Result<Vec<VarLenUnicode>> {
    values
        .iter()
        .map(|s| VarLenUnicode::from_str(s).map_err(|_| MatrixIoError::InvalidString(s.to_owned())))
        .collect()
}

pub(crate) fn write_string_dataset(group: &Group, name: &str, values: &[String]) -> Result<()> {
    let values = to_varlen(values)?;
    let ds = group
        .new_dataset::<VarLenUnicode>()
        .shape(values.len())
        .create(name)?;
    if !values.is_empty() {
        ds.write_raw(&values)?;
    }
    Ok(())
}

///
/// Write a one dimensional numeric dataset, chunked, compressed and extensible.
///
pub(crate) fn write_numeric_dataset<T: H5Type>(
    group: &Group,
    name: &str,
    values: &[T],
    config: &H5Config,
) -> Result<Dataset> {
    let builder = group.new_dataset::<T>().chunk(config.chunk_size);
    let builder = match config.compression_level {
        Some(level) => builder.deflate(level),
        None => builder,
    };
    let ds = builder.shape(values.len()..).create(name)?;
    if !values.is_empty() {
        ds.write_raw(values)?;
    }
    Ok(ds)
}

pub(crate) fn open_dataset(group: &Group, name: &str) -> Result<Dataset> {
    if !group.link_exists(name) {
        return Err(MatrixIoError::InvalidFormat(format!(
            "missing dataset '{}' in group {}",
            name,
            group.name()
        )));
    }
    Ok(group.dataset(name)?)
}

pub(crate) fn open_group(group: &Group, name: &str) -> Result<Group> {
    if !group.link_exists(name) {
        return Err(MatrixIoError::InvalidFormat(format!(
            "could not find the '{}' group inside {}",
            name,
            group.name()
        )));
    }
    Ok(group.group(name)?)
}

///
/// Read a one dimensional string dataset.
///
/// Variable-length and fixed-length strings (UTF-8 or ASCII) are supported; fixed-length
/// padding is removed.
///
pub(crate) fn read_string_dataset(ds: &Dataset) -> Result<Vec<String>> {
    read_string_range(ds, 0, ds.size())
}

///
/// Read the strings `[start, end)` of a one dimensional string dataset.
///
pub(crate) fn read_string_range(ds: &Dataset, start: usize, end: usize) -> Result<Vec<String>> {
    if start >= end {
        return Ok(Vec::new());
    }
    match ds.dtype()?.to_descriptor()? {
        TypeDescriptor::VarLenUnicode => Ok(ds
            .read_slice_1d::<VarLenUnicode, _>(start..end)?
            .iter()
            .map(|s| s.as_str().to_string())
            .collect()),
        TypeDescriptor::VarLenAscii => Ok(ds
            .read_slice_1d::<VarLenAscii, _>(start..end)?
            .iter()
            .map(|s| s.as_str().to_string())
            .collect()),
        TypeDescriptor::FixedAscii(size) => with_fixed_width!(size, FixedAscii, S => Ok(ds
            .read_slice_1d::<S, _>(start..end)?
            .iter()
            .map(|s| trim_padding(s.as_str()))
            .collect())),
        TypeDescriptor::FixedUnicode(size) => with_fixed_width!(size, FixedUnicode, S => Ok(ds
            .read_slice_1d::<S, _>(start..end)?
            .iter()
            .map(|s| trim_padding(s.as_str()))
            .collect())),
        other => Err(MatrixIoError::InvalidFormat(format!(
            "dataset {} holds {:?}, expected strings",
            ds.name(),
            other
        ))),
    }
}

///
/// Read a scalar string attribute, `None` if the attribute doesn't exist.
///
pub(crate) fn read_string_attr(loc: &Location, name: &str) -> Result<Option<String>> {
    if !loc.attr_names()?.iter().any(|n| n == name) {
        return Ok(None);
    }
    let attr = loc.attr(name)?;
    let value = match attr.dtype()?.to_descriptor()? {
        TypeDescriptor::VarLenAscii => attr.read_scalar::<VarLenAscii>()?.as_str().to_string(),
        TypeDescriptor::VarLenUnicode => attr.read_scalar::<VarLenUnicode>()?.as_str().to_string(),
        TypeDescriptor::FixedAscii(size) => {
            with_fixed_width!(size, FixedAscii, S => Ok(trim_padding(attr.read_scalar::<S>()?.as_str())))?
        }
        TypeDescriptor::FixedUnicode(size) => {
            with_fixed_width!(size, FixedUnicode, S => Ok(trim_padding(attr.read_scalar::<S>()?.as_str())))?
        }
        other => {
            return Err(MatrixIoError::InvalidFormat(format!(
                "attribute '{}' holds {:?}, expected a string",
                name, other
            )));
        }
    };
    Ok(Some(value))
}
