//! Flagscope Computer Vision Library
//!
//! Reconstructs, stage by stage, approximate diagnostic scores for a flag
//! detection produced by an external inference collaborator. Every stage runs
//! on an in-memory standardized image using OpenCV.

pub mod analysis;
pub mod bbox;
pub mod calculation;
pub mod error;
pub mod inference;
pub mod utils;

// Re-export commonly used types
pub use bbox::BBox;
pub use calculation::{CalculationConfig, CalculationPipeline, CalculationReport};
pub use error::CalculationError;
pub use inference::{Prediction, PredictionLoader, PredictionSet, StaticInference};
pub use utils::{ImageUtils, NmsSimulator, StandardizedImage};

// Error handling
pub type Result<T> = std::result::Result<T, CalculationError>;

/// Core traits for the CV system
pub mod traits {
    use crate::inference::{Prediction, PredictionSet};
    use crate::utils::nms::NmsReport;
    use image::RgbImage;

    /// The external object-detection collaborator
    pub trait InferenceClient: Send + Sync {
        /// Run detection on the decoded original image
        fn detect(&self, image: &RgbImage) -> anyhow::Result<PredictionSet>;
    }

    /// Trait for non-maximum suppression implementations
    pub trait NonMaxSuppression {
        fn suppress(&self, predictions: &[Prediction]) -> NmsReport;
    }
}
