//!
//! This module defines the `AxisIndex` struct, the bidirectional lookup between the string labels
//! of one matrix axis (feature ids or barcode sequences) and their integer positions.
//!
//! Both axes of a [crate::CountMatrix] are backed by an `AxisIndex`. Construction via
//! [AxisIndex::new] keeps every label in order but, when a label repeats, the lookup map
//! resolves it to the *last* position holding it. Callers that want duplicates to be an
//! error use [AxisIndex::try_new_unique].
//!
use fxhash::FxHashMap;

use crate::errors::{MatrixError, Result};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AxisIndex {
    labels: Vec<String>,
    label_to_id: FxHashMap<String, usize>,
}

impl AxisIndex {
    ///
    /// Build an index over the given labels. Duplicate labels are kept on the axis, and the
    /// lookup map points at the last occurrence.
    ///
    /// # Arguments:
    /// - `labels`: the ordered axis labels
    ///
    pub fn new(labels: Vec<String>) -> Self {
        let mut label_to_id = FxHashMap::default();
        for (i, label) in labels.iter().enumerate() {
            label_to_id.insert(label.to_owned(), i);
        }
        AxisIndex {
            labels,
            label_to_id,
        }
    }

    ///
    /// Build an index, failing on the first repeated label.
    ///
    pub fn try_new_unique(labels: Vec<String>) -> Result<Self> {
        let index = AxisIndex::new(labels);
        if index.has_duplicates() {
            let mut seen = FxHashMap::default();
            for label in index.labels.iter() {
                if seen.insert(label.as_str(), ()).is_some() {
                    return Err(MatrixError::DuplicateLabel(label.to_owned()));
                }
            }
        }
        Ok(index)
    }

    ///
    /// Convert a label to its position, or `None` if it isn't on the axis.
    ///
    pub fn get(&self, label: &str) -> Option<usize> {
        self.label_to_id.get(label).copied()
    }

    ///
    /// Convert a position back to its label.
    ///
    pub fn label(&self, id: usize) -> Option<&str> {
        self.labels.get(id).map(|s| s.as_str())
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.label_to_id.contains_key(label)
    }

    /// True when at least one label appears more than once.
    pub fn has_duplicates(&self) -> bool {
        self.label_to_id.len() != self.labels.len()
    }

    pub fn into_labels(self) -> Vec<String> {
        self.labels
    }
}

impl From<Vec<String>> for AxisIndex {
    fn from(labels: Vec<String>) -> Self {
        AxisIndex::new(labels)
    }
}
