//! Contour geometry of the predicted region

use crate::calculation::config::{PredictionDefaults, ShapeConfig};
use crate::inference::Prediction;
use crate::utils::StandardizedImage;
use crate::Result;
use flagscope_core::numeric::round_to;
use flagscope_core::FlagReferenceEntry;
use opencv::{
    core::{self, Mat, Point, Rect, Vector},
    imgproc::{self, CHAIN_APPROX_SIMPLE, RETR_EXTERNAL, THRESH_BINARY},
    prelude::*,
};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContourFeatures {
    pub contour_count: usize,
    pub largest_contour_area: f64,
    pub rectangularity: f64,
    pub solidity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeFeatures {
    pub rectangularity: f64,
    pub aspect_ratio: f64,
    pub symmetry: f64,
    pub edge_sharpness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeAnalysis {
    /// `[x, y, width, height]` of the analyzed region
    pub region: [i32; 4],
    pub contour_analysis: ContourFeatures,
    pub actual_aspect_ratio: f64,
    pub expected_aspect_ratio: f64,
    pub shape_features: ShapeFeatures,
    pub shape_score: f64,
    pub explanation: String,
}

pub struct ShapeAnalyzer<'a> {
    config: &'a ShapeConfig,
    defaults: &'a PredictionDefaults,
}

/// Features of the largest external contour of a binary plane
pub fn contour_features(binary: &Mat) -> Result<ContourFeatures> {
    let mut contours = Vector::<Vector<Point>>::new();
    imgproc::find_contours(
        binary,
        &mut contours,
        RETR_EXTERNAL,
        CHAIN_APPROX_SIMPLE,
        Point::new(0, 0),
    )?;

    let mut largest: Option<(Vector<Point>, f64)> = None;
    for contour in contours.iter() {
        let area = imgproc::contour_area(&contour, false)?;
        if largest.as_ref().is_none_or(|(_, best)| area > *best) {
            largest = Some((contour, area));
        }
    }

    let Some((contour, area)) = largest else {
        return Ok(ContourFeatures::default());
    };

    let rect = imgproc::bounding_rect(&contour)?;
    let rect_area = rect.width as f64 * rect.height as f64;

    let mut hull = Vector::<Point>::new();
    imgproc::convex_hull(&contour, &mut hull, false, true)?;
    let hull_area = imgproc::contour_area(&hull, false)?;

    Ok(ContourFeatures {
        contour_count: contours.len(),
        largest_contour_area: area,
        rectangularity: if rect_area > 0.0 { area / rect_area } else { 0.0 },
        solidity: if hull_area > 0.0 { area / hull_area } else { 0.0 },
    })
}

impl<'a> ShapeAnalyzer<'a> {
    pub fn new(config: &'a ShapeConfig, defaults: &'a PredictionDefaults) -> Self {
        Self { config, defaults }
    }

    /// `1 - min(1, |actual - expected| / max(expected, floor))`
    pub fn aspect_score(&self, actual: f64, expected: f64) -> f64 {
        1.0 - ((actual - expected).abs() / expected.max(self.config.min_expected_aspect)).min(1.0)
    }

    pub fn analyze(
        &self,
        image: &StandardizedImage,
        prediction: Option<&Prediction>,
        entry: &FlagReferenceEntry,
    ) -> Result<ShapeAnalysis> {
        let fallback = self.defaults.default_box(image.width as u32, image.height as u32);
        let bbox = prediction.map_or(fallback, |p| p.bbox_or(fallback));

        let rect = bbox
            .clip_to_image(image.width, image.height)
            .unwrap_or_else(|| Rect::new(0, 0, image.width, image.height));
        let roi = image.gray.roi(rect)?.try_clone()?;

        let mut binary = Mat::default();
        imgproc::threshold(&roi, &mut binary, self.config.binary_threshold, 255.0, THRESH_BINARY)?;
        let contours = contour_features(&binary)?;

        let actual_aspect_ratio = region_aspect(&rect);
        let expected_aspect_ratio = entry.aspect_ratio.value();
        let aspect_ratio = self.aspect_score(actual_aspect_ratio, expected_aspect_ratio);

        let mut edges = Mat::default();
        imgproc::canny(&roi, &mut edges, self.config.canny_low, self.config.canny_high, 3, false)?;
        let edge_pixels = core::count_non_zero(&edges)? as f64;
        let roi_pixels = (rect.width as f64) * (rect.height as f64);
        let edge_sharpness = (edge_pixels / roi_pixels * self.config.edge_density_gain).min(1.0);

        let rectangularity = contours.rectangularity;
        let symmetry = self.config.symmetry_placeholder;

        let overall = self.config.rectangularity_weight * rectangularity
            + self.config.aspect_weight * aspect_ratio
            + self.config.symmetry_weight * symmetry
            + self.config.edge_weight * edge_sharpness;

        log::debug!(
            "Shape: {} contours in {:?}, aspect {:.2} vs {:.2}, score {:.3}",
            contours.contour_count,
            rect,
            actual_aspect_ratio,
            expected_aspect_ratio,
            overall
        );

        Ok(ShapeAnalysis {
            region: [rect.x, rect.y, rect.width, rect.height],
            contour_analysis: contours,
            actual_aspect_ratio: round_to(actual_aspect_ratio, 2),
            expected_aspect_ratio,
            shape_features: ShapeFeatures {
                rectangularity: round_to(rectangularity, 2),
                aspect_ratio: round_to(aspect_ratio, 2),
                symmetry: round_to(symmetry, 2),
                edge_sharpness: round_to(edge_sharpness, 2),
            },
            shape_score: round_to(overall, 2),
            explanation: "Shape analysis evaluates geometric properties of the detected flag \
                          using contour analysis, aspect ratio comparison, and edge detection. \
                          Symmetry is a fixed estimate, not measured."
                .to_string(),
        })
    }
}

/// Width over height of the analyzed region
fn region_aspect(rect: &Rect) -> f64 {
    if rect.height > 0 {
        rect.width as f64 / rect.height as f64
    } else {
        1.0
    }
}
