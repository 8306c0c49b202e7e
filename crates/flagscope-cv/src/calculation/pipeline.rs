//! Stage orchestration for one image and one prediction set

use super::config::CalculationConfig;
use super::report::{CalculationReport, EducationalNote};
use crate::analysis::{
    input_pixels, pooling, BoxEncoder, ClassProbabilityEstimator, ColorAnalyzer,
    ConfidenceAggregator, EdgeSimulator, PatternMatcher, ShapeAnalyzer,
};
use crate::error::CalculationError;
use crate::inference::PredictionSet;
use crate::traits::{InferenceClient, NonMaxSuppression};
use crate::utils::{ImageUtils, NmsSimulator, StandardizedImage};
use crate::Result;
use flagscope_core::{ClassKey, FlagCatalog};
use std::fs;
use std::path::Path;

/// Runs every calculation stage against a shared read-only catalog
pub struct CalculationPipeline<'c> {
    config: CalculationConfig,
    catalog: &'c FlagCatalog,
}

impl CalculationPipeline<'static> {
    /// Default configuration over the built-in catalog
    pub fn with_defaults() -> Self {
        Self::new(CalculationConfig::default(), FlagCatalog::builtin())
    }
}

impl<'c> CalculationPipeline<'c> {
    pub fn new(config: CalculationConfig, catalog: &'c FlagCatalog) -> Self {
        Self { config, catalog }
    }

    /// Decode, ask the collaborator about the original image, standardize and
    /// calculate. Collaborator failures are returned unmodified.
    pub fn process_bytes(&self, bytes: &[u8], client: &dyn InferenceClient) -> Result<CalculationReport> {
        let original = ImageUtils::decode(bytes)?;
        let predictions = client
            .detect(&original)
            .map_err(CalculationError::Collaborator)?;

        let image = StandardizedImage::from_rgb(&original, self.config.standard_size)?;
        self.calculate(&image, &predictions)
    }

    /// Process several images; each one owns its buffers, so they may run in parallel
    pub fn process_batch(
        &self,
        images: &[Vec<u8>],
        client: &dyn InferenceClient,
    ) -> Vec<Result<CalculationReport>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            images
                .par_iter()
                .map(|bytes| self.process_bytes(bytes, client))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            images
                .iter()
                .map(|bytes| self.process_bytes(bytes, client))
                .collect()
        }
    }

    /// Run every stage over a standardized image
    pub fn calculate(&self, image: &StandardizedImage, predictions: &PredictionSet) -> Result<CalculationReport> {
        let config = &self.config;
        let top = predictions.top();
        let predicted_class = predictions.predicted_class();
        let key = ClassKey::parse(&predicted_class);

        let known_entry = self.catalog.lookup(&key);
        if known_entry.is_none() {
            log::debug!("Class {:?} is not in the catalog, using neutral reference", predicted_class);
        }
        let entry = self.catalog.resolve(&key);

        let input_analysis = input_pixels::analyze_input_pixels(image, &config.color.hsv_ranges)?;
        let color_analysis = ColorAnalyzer::new(&config.color).analyze(image, known_entry)?;
        let convolution = EdgeSimulator::new(&config.convolution).analyze(image)?;
        let feature_maps = pooling::simulate_feature_maps();
        let bounding_box =
            BoxEncoder::new(&config.grid, &config.defaults).encode(image.width, image.height, top);
        let class_probabilities = ClassProbabilityEstimator::new(&config.class_probability, self.catalog)
            .estimate(&color_analysis, &key);
        let pattern_matching =
            PatternMatcher::new(&config.pattern).analyze(image, &color_analysis, entry, &predicted_class)?;
        let shape_analysis = ShapeAnalyzer::new(&config.shape, &config.defaults).analyze(image, top, entry)?;
        let nms = NmsSimulator::new(config.nms.iou_threshold).suppress(&predictions.predictions);

        let final_confidence = ConfidenceAggregator::new(&config.confidence).aggregate(
            bounding_box.objectness,
            class_probabilities.probability_of(&key),
            pattern_matching.pattern_score,
            shape_analysis.shape_score,
        );

        log::info!(
            "Calculated {} with final confidence {}",
            predicted_class,
            final_confidence.confidence_pct
        );

        Ok(CalculationReport {
            model_prediction: predictions.clone(),
            predicted_class,
            input_analysis,
            color_analysis,
            convolution,
            feature_maps,
            bounding_box,
            class_probabilities,
            pattern_matching,
            shape_analysis,
            nms,
            final_confidence,
            educational_note: EducationalNote::default(),
        })
    }

    /// Write a report as pretty JSON
    pub fn export_json<P: AsRef<Path>>(report: &CalculationReport, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{Prediction, StaticInference};
    use image::{Rgb, RgbImage};

    fn bands() -> RgbImage {
        RgbImage::from_fn(300, 200, |_, y| {
            if y < 100 { Rgb([255, 0, 0]) } else { Rgb([255, 255, 255]) }
        })
    }

    #[test]
    fn test_calculate_without_predictions() -> Result<()> {
        let pipeline = CalculationPipeline::with_defaults();
        let image = StandardizedImage::from_rgb(&bands(), (640, 640))?;
        let report = pipeline.calculate(&image, &PredictionSet::default())?;

        assert_eq!(report.predicted_class, "unknown");
        assert!(report.bounding_box.default_box);
        assert_eq!(report.nms.kept_boxes, 0);
        // Unknown classes have no probability, so the aggregate short-circuits
        assert_eq!(report.confidence(), 0.0);
        assert!(!report.final_confidence.valid);
        Ok(())
    }

    #[test]
    fn test_calculate_with_known_prediction() -> Result<()> {
        let pipeline = CalculationPipeline::with_defaults();
        let image = StandardizedImage::from_rgb(&bands(), (640, 640))?;
        let predictions = PredictionSet::new(vec![Prediction::new(
            "Indonesia", 0.91, 320.0, 320.0, 600.0, 400.0,
        )]);
        let report = pipeline.calculate(&image, &predictions)?;

        assert_eq!(report.predicted_class, "indonesia");
        assert_eq!(report.bounding_box.objectness, 0.91);
        assert!(report.final_confidence.valid);
        assert!(report.confidence() > 0.0 && report.confidence() <= 1.0);
        assert_eq!(report.model_prediction, predictions);
        Ok(())
    }

    #[test]
    fn test_prediction_without_confidence_zeroes_result() -> Result<()> {
        let pipeline = CalculationPipeline::with_defaults();
        let image = StandardizedImage::from_rgb(&bands(), (640, 640))?;
        let predictions: PredictionSet =
            serde_json::from_str(r#"{"predictions": [{"class": "Indonesia", "x": 320, "y": 320}]}"#)?;
        let report = pipeline.calculate(&image, &predictions)?;

        assert_eq!(report.bounding_box.objectness, 0.0);
        assert!(!report.bounding_box.default_box);
        assert_eq!(report.confidence(), 0.0);
        assert!(!report.final_confidence.valid);
        Ok(())
    }

    #[test]
    fn test_collaborator_failure_propagates() {
        struct Failing;
        impl InferenceClient for Failing {
            fn detect(&self, _image: &RgbImage) -> anyhow::Result<PredictionSet> {
                anyhow::bail!("inference service timed out")
            }
        }

        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(bands())
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let err = CalculationPipeline::with_defaults()
            .process_bytes(&bytes, &Failing)
            .unwrap_err();
        match err {
            CalculationError::Collaborator(source) => {
                assert_eq!(source.to_string(), "inference service timed out")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_batch_keeps_input_order() {
        let mut good = Vec::new();
        image::DynamicImage::ImageRgb8(bands())
            .write_to(&mut std::io::Cursor::new(&mut good), image::ImageFormat::Png)
            .unwrap();
        let images = vec![good, b"garbage".to_vec()];

        let results = CalculationPipeline::with_defaults().process_batch(&images, &StaticInference::empty());
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(CalculationError::Decode(_))));
    }
}
