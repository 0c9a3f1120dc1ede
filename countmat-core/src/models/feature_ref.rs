use std::collections::HashMap;
use std::fmt::{self, Display};

use crate::consts::{DEFAULT_LIBRARY_TYPE, GENOME_TAG};
use crate::errors::{MatrixError, Result};

///
/// A single row entity of a count matrix: a gene, a probe, an antibody tag...
///
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureDef {
    /// Position of the feature on the feature axis
    pub index: usize,
    /// Unique feature id (e.g. an Ensembl gene id)
    pub id: String,
    /// Human readable name
    pub name: String,
    /// Library type this feature belongs to (e.g. "Gene Expression")
    pub feature_type: String,
    /// Free-form tags, e.g. `genome`
    pub tags: HashMap<String, String>,
}

impl FeatureDef {
    pub fn new(id: &str, name: &str, feature_type: &str) -> Self {
        FeatureDef {
            index: 0,
            id: id.to_string(),
            name: name.to_string(),
            feature_type: feature_type.to_string(),
            tags: HashMap::new(),
        }
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    /// The `genome` tag of a gene expression feature.
    pub fn genome(&self) -> Option<&str> {
        if self.feature_type == DEFAULT_LIBRARY_TYPE {
            self.tags.get(GENOME_TAG).map(|s| s.as_str())
        } else {
            None
        }
    }
}

///
/// FeatureReference struct, the ordered catalog of features that labels the rows of a matrix.
///
/// Every `FeatureDef::index` equals the position of the definition in `feature_defs`; the
/// constructors re-number definitions to keep that true.
///
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureReference {
    pub feature_defs: Vec<FeatureDef>,
    pub all_tag_keys: Vec<String>,
}

impl FeatureReference {
    pub fn new(feature_defs: Vec<FeatureDef>, all_tag_keys: Vec<String>) -> Self {
        let feature_defs = feature_defs
            .into_iter()
            .enumerate()
            .map(|(index, mut def)| {
                def.index = index;
                def
            })
            .collect();

        FeatureReference {
            feature_defs,
            all_tag_keys,
        }
    }

    pub fn len(&self) -> usize {
        self.feature_defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feature_defs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureDef> {
        self.feature_defs.iter()
    }

    pub fn ids(&self) -> Vec<String> {
        self.feature_defs.iter().map(|f| f.id.to_owned()).collect()
    }

    pub fn get(&self, index: usize) -> Option<&FeatureDef> {
        self.feature_defs.get(index)
    }

    ///
    /// Build a new reference holding only the features at `indices`, in the given order.
    ///
    /// # Arguments:
    /// - `indices`: positions into this reference
    ///
    pub fn subset(&self, indices: &[usize]) -> Result<FeatureReference> {
        let mut defs = Vec::with_capacity(indices.len());
        for &i in indices {
            let def = self.feature_defs.get(i).ok_or(MatrixError::Bounds {
                index: i,
                len: self.len(),
            })?;
            defs.push(def.clone());
        }
        Ok(FeatureReference::new(defs, self.all_tag_keys.clone()))
    }

    /// Positions of all features of the given type.
    pub fn indices_by_type(&self, feature_type: &str) -> Vec<usize> {
        self.feature_defs
            .iter()
            .filter(|f| f.feature_type == feature_type)
            .map(|f| f.index)
            .collect()
    }

    /// Positions of the gene expression features of the given genome.
    pub fn indices_by_genome(&self, genome: &str) -> Vec<usize> {
        self.feature_defs
            .iter()
            .filter(|f| f.genome() == Some(genome))
            .map(|f| f.index)
            .collect()
    }

    ///
    /// Get the distinct genomes of the gene expression features, in first-seen order.
    ///
    pub fn genomes(&self) -> Vec<String> {
        let mut genomes: Vec<String> = Vec::new();
        for genome in self.feature_defs.iter().filter_map(|f| f.genome()) {
            if !genomes.iter().any(|g| g == genome) {
                genomes.push(genome.to_string());
            }
        }
        genomes
    }
}

impl Display for FeatureReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeatureReference with {} features.", self.len())
    }
}
