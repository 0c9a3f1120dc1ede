pub mod axis_index;
pub mod feature_ref;

// re-export for cleaner imports
pub use self::axis_index::AxisIndex;
pub use self::feature_ref::{FeatureDef, FeatureReference};
