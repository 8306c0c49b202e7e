//! Calculation stages
//!
//! Each stage reads the standardized image and/or the predicted class and
//! produces one serializable section of the report. Stages never fail on
//! numeric edge cases; only native OpenCV failures are propagated.

pub mod anchors;
pub mod class_probability;
pub mod color;
pub mod confidence;
pub mod edges;
pub mod input_pixels;
pub mod pattern;
pub mod pooling;
pub mod shape;

pub use anchors::{BoundingBoxEncoding, BoxEncoder};
pub use class_probability::{ClassProbabilities, ClassProbabilityEstimator};
pub use color::{ColorAnalysis, ColorAnalyzer, DominantColor};
pub use confidence::{ConfidenceAggregator, ConfidenceComponent, FinalConfidence};
pub use edges::{ConvolutionAnalysis, EdgeSimulator};
pub use input_pixels::{InputAnalysis, PixelSample};
pub use pattern::{LineCounts, Orientation, PatternAnalysis, PatternMatcher};
pub use pooling::FeatureMapAnalysis;
pub use shape::{ShapeAnalysis, ShapeAnalyzer};
