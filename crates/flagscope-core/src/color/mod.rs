//! Color labels and HSV classification

pub mod classify;
pub mod distribution;
pub mod label;

pub use classify::{HsvRange, HsvRangeTable};
pub use distribution::{ColorDistribution, distribution_similarity, proportion_similarity};
pub use label::{ColorLabel, Hsv};
