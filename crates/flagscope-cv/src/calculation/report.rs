//! The merged per-invocation report

use crate::analysis::{
    BoundingBoxEncoding, ClassProbabilities, ColorAnalysis, ConvolutionAnalysis,
    FeatureMapAnalysis, FinalConfidence, InputAnalysis, PatternAnalysis, ShapeAnalysis,
};
use crate::inference::PredictionSet;
use crate::utils::NmsReport;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EducationalNote {
    pub title: String,
    pub description: String,
}

impl Default for EducationalNote {
    fn default() -> Self {
        Self {
            title: "Educational Simulation Note".to_string(),
            description: "This is a simplified educational simulation of how CNN-based object \
                          detectors work. It doesn't represent an actual neural network \
                          implementation but rather illustrates the concepts behind object \
                          detection for learning purposes. The actual CNN process is more complex \
                          and involves millions of parameters trained on large datasets."
                .to_string(),
        }
    }
}

/// Every stage output for one image and one prediction set. Built once and
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationReport {
    /// The collaborator's response, passed through
    pub model_prediction: PredictionSet,
    /// Lower-cased label of the top prediction, or "unknown"
    pub predicted_class: String,
    pub input_analysis: InputAnalysis,
    pub color_analysis: ColorAnalysis,
    pub convolution: ConvolutionAnalysis,
    pub feature_maps: FeatureMapAnalysis,
    pub bounding_box: BoundingBoxEncoding,
    pub class_probabilities: ClassProbabilities,
    pub pattern_matching: PatternAnalysis,
    pub shape_analysis: ShapeAnalysis,
    pub nms: NmsReport,
    pub final_confidence: FinalConfidence,
    pub educational_note: EducationalNote,
}

impl CalculationReport {
    pub fn confidence(&self) -> f64 {
        self.final_confidence.confidence
    }
}
