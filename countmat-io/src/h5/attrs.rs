use std::collections::BTreeMap;
use std::path::Path;

use hdf5::types::{FixedAscii, FixedUnicode, TypeDescriptor, VarLenAscii, VarLenUnicode};
use hdf5::{Attribute, File, Location};

use crate::consts::{
    CHEMISTRY_DESC_KEY, LIBRARY_ID_MAPPING_KEY, METADATA_ATTRS, ORIG_GEM_GROUP_MAPPING_KEY,
    UNKNOWN_CHEMISTRY,
};
use crate::error::{MatrixIoError, Result};
use crate::h5::{read_string_attr, to_varlen, trim_padding, with_fixed_width};

///
/// Value of a container metadata attribute.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Str(String),
    StrList(Vec<String>),
    Int(i64),
    IntList(Vec<i64>),
}

/// Metadata attributes of a container, keyed by attribute name.
pub type MatrixAttrs = BTreeMap<String, AttrValue>;

/// Gem group mapping: new gem group (1-based) to `(library id, original gem group)`.
pub type GemGroupIndex = BTreeMap<usize, (String, i64)>;

pub(crate) fn write_attr(loc: &Location, key: &str, value: &AttrValue) -> Result<()> {
    match value {
        AttrValue::Str(s) => {
            let v = to_varlen(std::slice::from_ref(s))?;
            loc.new_attr::<VarLenUnicode>().create(key)?.write_scalar(&v[0])?;
        }
        AttrValue::StrList(values) => {
            let v = to_varlen(values)?;
            let attr = loc.new_attr::<VarLenUnicode>().shape(v.len()).create(key)?;
            if !v.is_empty() {
                attr.write_raw(&v)?;
            }
        }
        AttrValue::Int(i) => {
            loc.new_attr::<i64>().create(key)?.write_scalar(i)?;
        }
        AttrValue::IntList(values) => {
            let attr = loc.new_attr::<i64>().shape(values.len()).create(key)?;
            if !values.is_empty() {
                attr.write_raw(values)?;
            }
        }
    }
    Ok(())
}

pub(crate) fn write_attrs(loc: &Location, attrs: &MatrixAttrs) -> Result<()> {
    for (key, value) in attrs.iter() {
        write_attr(loc, key, value)?;
    }
    Ok(())
}

pub(crate) fn read_attr(attr: &Attribute) -> Result<AttrValue> {
    let descriptor = attr.dtype()?.to_descriptor()?;
    let value = match (descriptor, attr.is_scalar()) {
        (TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_), true) => {
            AttrValue::Int(attr.read_scalar::<i64>()?)
        }
        (TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_), false) => {
            AttrValue::IntList(attr.read_raw::<i64>()?)
        }
        (TypeDescriptor::VarLenUnicode, true) => {
            AttrValue::Str(attr.read_scalar::<VarLenUnicode>()?.as_str().to_string())
        }
        (TypeDescriptor::VarLenUnicode, false) => AttrValue::StrList(
            attr.read_raw::<VarLenUnicode>()?
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
        ),
        (TypeDescriptor::VarLenAscii, true) => {
            AttrValue::Str(attr.read_scalar::<VarLenAscii>()?.as_str().to_string())
        }
        (TypeDescriptor::VarLenAscii, false) => AttrValue::StrList(
            attr.read_raw::<VarLenAscii>()?
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
        ),
        (TypeDescriptor::FixedAscii(size), true) => AttrValue::Str(with_fixed_width!(
            size, FixedAscii, S => Ok(trim_padding(attr.read_scalar::<S>()?.as_str()))
        )?),
        (TypeDescriptor::FixedAscii(size), false) => AttrValue::StrList(with_fixed_width!(
            size, FixedAscii, S => Ok(attr
                .read_raw::<S>()?
                .iter()
                .map(|s| trim_padding(s.as_str()))
                .collect())
        )?),
        (TypeDescriptor::FixedUnicode(size), true) => AttrValue::Str(with_fixed_width!(
            size, FixedUnicode, S => Ok(trim_padding(attr.read_scalar::<S>()?.as_str()))
        )?),
        (TypeDescriptor::FixedUnicode(size), false) => AttrValue::StrList(with_fixed_width!(
            size, FixedUnicode, S => Ok(attr
                .read_raw::<S>()?
                .iter()
                .map(|s| trim_padding(s.as_str()))
                .collect())
        )?),
        (other, _) => {
            return Err(MatrixIoError::InvalidFormat(format!(
                "unsupported attribute type {:?} for '{}'",
                other,
                attr.name()
            )));
        }
    };
    Ok(value)
}

///
/// Read the well-known metadata attributes (chemistry, library ids, original gem groups) of a
/// container. Absent attributes are left out of the map.
///
pub fn get_matrix_attrs(path: &Path) -> Result<MatrixAttrs> {
    let file = File::open(path)?;
    let names = file.attr_names()?;

    let mut attrs = MatrixAttrs::new();
    for key in METADATA_ATTRS {
        if names.iter().any(|n| n == key) {
            attrs.insert(key.to_string(), read_attr(&file.attr(key)?)?);
        }
    }
    Ok(attrs)
}

///
/// Library map of a single-sample run: one library id per distinct gem group.
///
/// # Arguments:
/// - `sample_id`: library id of every gem group
/// - `gem_groups`: gem groups present in the sample, in any order, possibly repeated
///
pub fn make_library_map_count(sample_id: &str, gem_groups: &[i64]) -> MatrixAttrs {
    let mut unique: Vec<i64> = gem_groups.to_vec();
    unique.sort_unstable();
    unique.dedup();

    let mut attrs = MatrixAttrs::new();
    attrs.insert(
        LIBRARY_ID_MAPPING_KEY.to_string(),
        AttrValue::StrList(vec![sample_id.to_string(); unique.len()]),
    );
    attrs.insert(
        ORIG_GEM_GROUP_MAPPING_KEY.to_string(),
        AttrValue::IntList(unique),
    );
    attrs
}

pub fn make_matrix_attrs_count(sample_id: &str, gem_groups: &[i64], chemistry: &str) -> MatrixAttrs {
    let mut attrs = make_library_map_count(sample_id, gem_groups);
    attrs.insert(
        CHEMISTRY_DESC_KEY.to_string(),
        AttrValue::Str(chemistry.to_string()),
    );
    attrs
}

///
/// Library map of an aggregated run, ordered by new gem group.
///
pub fn make_library_map_aggr(gem_group_index: &GemGroupIndex) -> MatrixAttrs {
    let (library_ids, original_gem_groups): (Vec<String>, Vec<i64>) =
        gem_group_index.values().cloned().unzip();

    let mut attrs = MatrixAttrs::new();
    attrs.insert(
        LIBRARY_ID_MAPPING_KEY.to_string(),
        AttrValue::StrList(library_ids),
    );
    attrs.insert(
        ORIG_GEM_GROUP_MAPPING_KEY.to_string(),
        AttrValue::IntList(original_gem_groups),
    );
    attrs
}

///
/// Rebuild the gem group mapping stored in a container, `None` if the container has none.
///
pub fn get_gem_group_index(path: &Path) -> Result<Option<GemGroupIndex>> {
    let attrs = get_matrix_attrs(path)?;
    let (library_ids, original_gem_groups) = match (
        attrs.get(LIBRARY_ID_MAPPING_KEY),
        attrs.get(ORIG_GEM_GROUP_MAPPING_KEY),
    ) {
        (Some(AttrValue::StrList(ids)), Some(AttrValue::IntList(groups))) => (ids, groups),
        (None, _) | (_, None) => return Ok(None),
        _ => {
            return Err(MatrixIoError::InvalidFormat(
                "gem group mapping attributes have unexpected types".to_string(),
            ));
        }
    };

    Ok(Some(
        library_ids
            .iter()
            .zip(original_gem_groups)
            .enumerate()
            .map(|(i, (lid, &og))| (i + 1, (lid.to_owned(), og)))
            .collect(),
    ))
}

/// Chemistry description of a container, `"Unknown"` if not recorded.
pub fn load_chemistry_from_h5(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    Ok(read_string_attr(&file, CHEMISTRY_DESC_KEY)?.unwrap_or_else(|| UNKNOWN_CHEMISTRY.to_string()))
}
