//! Calculation configuration
//!
//! Every hand-tuned constant of the pipeline lives here so the heuristics can
//! be audited and overridden from a JSON file.

use crate::bbox::BBox;
use anyhow::{Context, anyhow, ensure};
use flagscope_core::HsvRangeTable;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main calculation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationConfig {
    /// Size every calculation stage works on, (width, height)
    pub standard_size: (u32, u32),
    pub defaults: PredictionDefaults,
    pub color: ColorConfig,
    pub convolution: ConvolutionConfig,
    pub grid: GridConfig,
    pub class_probability: ClassProbabilityConfig,
    pub pattern: PatternConfig,
    pub shape: ShapeConfig,
    pub nms: NmsConfig,
    pub confidence: ConfidenceWeights,
}

/// Box assumed when the collaborator reports nothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionDefaults {
    pub width_fraction: f64,
    pub height_fraction: f64,
    pub confidence: f64,
}

impl PredictionDefaults {
    pub fn default_box(&self, image_width: u32, image_height: u32) -> BBox {
        BBox::centered(
            image_width as f64,
            image_height as f64,
            self.width_fraction,
            self.height_fraction,
        )
    }
}

/// Color sampling and clustering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorConfig {
    pub sample_ratio: f64,
    pub default_clusters: usize,
    pub max_clusters: usize,
    pub kmeans_attempts: i32,
    pub kmeans_max_iterations: i32,
    pub kmeans_epsilon: f64,
    pub kmeans_seed: i32,
    pub hsv_ranges: HsvRangeTable,
}

/// Gradient kernels and sampling of the convolution stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvolutionConfig {
    pub horizontal_kernel: [[i32; 3]; 3],
    pub vertical_kernel: [[i32; 3]; 3],
    pub horizontal_weight: f64,
    pub vertical_weight: f64,
    pub edge_threshold: f64,
    pub sample_points: Vec<(i32, i32)>,
}

/// Grid partition and anchor templates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub grid_size: u32,
    /// (width, height) multiples of one grid cell
    pub anchors: Vec<(f64, f64)>,
}

/// Class-probability weighting and clamping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilityConfig {
    pub distribution_weight: f64,
    pub membership_weight: f64,
    pub min_probability: f64,
    pub max_probability: f64,
}

/// Line-segment detection and pattern scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternConfig {
    pub canny_low: f64,
    pub canny_high: f64,
    pub hough_rho: f64,
    pub hough_theta_degrees: f64,
    pub hough_threshold: i32,
    pub min_line_length: f64,
    pub max_line_gap: f64,
    /// Segments within this many degrees of 0 or 180 are horizontal
    pub horizontal_tolerance_degrees: f64,
    /// Segments strictly inside this band are vertical
    pub vertical_band_degrees: (f64, f64),
    pub no_lines_score: f64,
    pub unknown_pattern_score: f64,
    pub color_weight: f64,
    pub line_weight: f64,
    pub aspect_weight: f64,
    pub orientation_weight: f64,
    /// Stand-in until the aspect ratio is measured here
    pub aspect_placeholder: f64,
    /// Stand-in until the orientation is measured here
    pub orientation_placeholder: f64,
}

/// Contour-based shape scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeConfig {
    pub binary_threshold: f64,
    pub canny_low: f64,
    pub canny_high: f64,
    pub edge_density_gain: f64,
    pub min_expected_aspect: f64,
    /// Stand-in until bilateral symmetry is measured
    pub symmetry_placeholder: f64,
    pub rectangularity_weight: f64,
    pub aspect_weight: f64,
    pub symmetry_weight: f64,
    pub edge_weight: f64,
}

/// Non-maximum suppression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NmsConfig {
    pub iou_threshold: f64,
}

/// Weights of the final weighted geometric mean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    pub objectness: f64,
    pub class_probability: f64,
    pub pattern: f64,
    pub shape: f64,
}

impl ConfidenceWeights {
    pub fn total(&self) -> f64 {
        self.objectness + self.class_probability + self.pattern + self.shape
    }
}

impl Default for CalculationConfig {
    fn default() -> Self {
        Self {
            standard_size: (640, 640),
            defaults: PredictionDefaults {
                width_fraction: 0.7,
                height_fraction: 0.5,
                confidence: 0.5,
            },
            color: ColorConfig {
                sample_ratio: 0.1,
                default_clusters: 3,
                max_clusters: 5,
                kmeans_attempts: 10,
                kmeans_max_iterations: 300,
                kmeans_epsilon: 1e-4,
                kmeans_seed: 42,
                hsv_ranges: HsvRangeTable::default(),
            },
            convolution: ConvolutionConfig {
                horizontal_kernel: [[-1, -1, -1], [0, 0, 0], [1, 1, 1]],
                vertical_kernel: [[-1, 0, 1], [-1, 0, 1], [-1, 0, 1]],
                horizontal_weight: 0.5,
                vertical_weight: 0.5,
                edge_threshold: 50.0,
                sample_points: vec![(10, 10), (320, 10), (10, 320), (320, 320)],
            },
            grid: GridConfig {
                grid_size: 13,
                anchors: vec![(1.0, 1.0), (0.8, 1.2), (1.2, 0.8)],
            },
            class_probability: ClassProbabilityConfig {
                distribution_weight: 0.7,
                membership_weight: 0.3,
                min_probability: 0.05,
                max_probability: 0.95,
            },
            pattern: PatternConfig {
                canny_low: 50.0,
                canny_high: 150.0,
                hough_rho: 1.0,
                hough_theta_degrees: 1.0,
                hough_threshold: 100,
                min_line_length: 100.0,
                max_line_gap: 10.0,
                horizontal_tolerance_degrees: 10.0,
                vertical_band_degrees: (80.0, 100.0),
                no_lines_score: 0.8,
                unknown_pattern_score: 0.5,
                color_weight: 0.4,
                line_weight: 0.4,
                aspect_weight: 0.1,
                orientation_weight: 0.1,
                aspect_placeholder: 0.95,
                orientation_placeholder: 1.0,
            },
            shape: ShapeConfig {
                binary_threshold: 127.0,
                canny_low: 100.0,
                canny_high: 200.0,
                edge_density_gain: 10.0,
                min_expected_aspect: 0.5,
                symmetry_placeholder: 0.9,
                rectangularity_weight: 0.3,
                aspect_weight: 0.4,
                symmetry_weight: 0.2,
                edge_weight: 0.1,
            },
            nms: NmsConfig { iou_threshold: 0.45 },
            confidence: ConfidenceWeights {
                objectness: 0.3,
                class_probability: 0.3,
                pattern: 0.2,
                shape: 0.2,
            },
        }
    }
}

impl CalculationConfig {
    /// Load an override file; sections left out keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config: CalculationConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make a stage divide by zero
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.standard_size.0 > 0 && self.standard_size.1 > 0,
            "standard_size must be non-zero, got {:?}",
            self.standard_size
        );
        ensure!(self.grid.grid_size > 0, "grid.grid_size must be positive");
        ensure!(!self.grid.anchors.is_empty(), "grid.anchors must not be empty");
        ensure!(
            self.color.sample_ratio > 0.0 && self.color.sample_ratio <= 1.0,
            "color.sample_ratio must be in (0, 1], got {}",
            self.color.sample_ratio
        );
        ensure!(self.color.max_clusters > 0, "color.max_clusters must be positive");

        let weights = &self.confidence;
        if [weights.objectness, weights.class_probability, weights.pattern, weights.shape]
            .iter()
            .any(|w| *w < 0.0)
            || weights.total() <= 0.0
        {
            return Err(anyhow!(
                "confidence weights must be non-negative with a positive sum, got {:?}",
                weights
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CalculationConfig::default();
        config.validate().unwrap();
        assert_eq!(config.grid.grid_size, 13);
        assert_eq!(config.nms.iou_threshold, 0.45);
        assert!((config.confidence.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_override_keeps_other_sections() {
        let config: CalculationConfig =
            serde_json::from_str(r#"{"nms": {"iou_threshold": 0.6}}"#).unwrap();
        assert_eq!(config.nms.iou_threshold, 0.6);
        assert_eq!(config.standard_size, (640, 640));
        assert_eq!(config.grid.anchors.len(), 3);
    }

    #[test]
    fn test_zero_weights_are_rejected() {
        let mut config = CalculationConfig::default();
        config.confidence = ConfidenceWeights {
            objectness: 0.0,
            class_probability: 0.0,
            pattern: 0.0,
            shape: 0.0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_anchor_list_is_rejected() {
        let mut config = CalculationConfig::default();
        config.grid.anchors.clear();
        assert!(config.validate().is_err());
    }
}
