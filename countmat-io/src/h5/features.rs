use std::collections::HashMap;

use hdf5::Group;

use countmat_core::{FeatureDef, FeatureReference};

use crate::consts::{
    FEATURE_ID_DATASET, FEATURE_NAME_DATASET, FEATURE_TAG_KEYS_DATASET, FEATURE_TYPE_DATASET,
};
use crate::error::{MatrixIoError, Result};
use crate::h5::{open_dataset, read_string_dataset, write_string_dataset};

///
/// Write a feature reference into `group`: one string dataset per column (`id`, `name`,
/// `feature_type`), the list of tag keys, and one string dataset per tag key. Features missing
/// a tag are written with an empty string.
///
pub fn save_feature_ref(feature_ref: &FeatureReference, group: &Group) -> Result<()> {
    let ids: Vec<String> = feature_ref.iter().map(|f| f.id.to_owned()).collect();
    let names: Vec<String> = feature_ref.iter().map(|f| f.name.to_owned()).collect();
    let types: Vec<String> = feature_ref.iter().map(|f| f.feature_type.to_owned()).collect();

    write_string_dataset(group, FEATURE_ID_DATASET, &ids)?;
    write_string_dataset(group, FEATURE_NAME_DATASET, &names)?;
    write_string_dataset(group, FEATURE_TYPE_DATASET, &types)?;
    write_string_dataset(group, FEATURE_TAG_KEYS_DATASET, &feature_ref.all_tag_keys)?;

    for key in feature_ref.all_tag_keys.iter() {
        let values: Vec<String> = feature_ref
            .iter()
            .map(|def| def.tags.get(key).cloned().unwrap_or_default())
            .collect();
        write_string_dataset(group, key, &values)?;
    }
    Ok(())
}

///
/// Read a feature reference written by [save_feature_ref]. Empty tag values are dropped.
///
pub fn load_feature_ref(group: &Group) -> Result<FeatureReference> {
    let ids = read_string_dataset(&open_dataset(group, FEATURE_ID_DATASET)?)?;
    let names = read_string_dataset(&open_dataset(group, FEATURE_NAME_DATASET)?)?;
    let types = read_string_dataset(&open_dataset(group, FEATURE_TYPE_DATASET)?)?;
    let all_tag_keys = read_string_dataset(&open_dataset(group, FEATURE_TAG_KEYS_DATASET)?)?;

    if names.len() != ids.len() || types.len() != ids.len() {
        return Err(MatrixIoError::InvalidFormat(format!(
            "feature columns have different lengths ({} ids, {} names, {} types)",
            ids.len(),
            names.len(),
            types.len()
        )));
    }

    let mut tag_columns: HashMap<&str, Vec<String>> = HashMap::new();
    for key in all_tag_keys.iter() {
        let values = read_string_dataset(&open_dataset(group, key)?)?;
        if values.len() != ids.len() {
            return Err(MatrixIoError::InvalidFormat(format!(
                "feature tag '{}' has {} values for {} features",
                key,
                values.len(),
                ids.len()
            )));
        }
        tag_columns.insert(key.as_str(), values);
    }

    let feature_defs = ids
        .iter()
        .zip(names.iter())
        .zip(types.iter())
        .enumerate()
        .map(|(i, ((id, name), feature_type))| {
            let mut def = FeatureDef::new(id, name, feature_type);
            for (key, values) in tag_columns.iter() {
                if !values[i].is_empty() {
                    def.tags.insert(key.to_string(), values[i].to_owned());
                }
            }
            def
        })
        .collect();

    Ok(FeatureReference::new(feature_defs, all_tag_keys.clone()))
}
