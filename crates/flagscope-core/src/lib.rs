//! Flagscope core domain data
//!
//! The flag reference catalog, typed class keys and the HSV color classifier
//! shared by every calculation stage.

pub mod color;
pub mod flags;
pub mod numeric;

pub use color::{
    distribution_similarity, proportion_similarity, ColorDistribution, ColorLabel, Hsv, HsvRange,
    HsvRangeTable,
};
pub use flags::{AspectRatio, ClassKey, FlagCatalog, FlagClass, FlagReferenceEntry, LinePattern};
