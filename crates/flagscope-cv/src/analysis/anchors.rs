//! Grid-cell and anchor encoding of the predicted box

use crate::bbox::BBox;
use crate::calculation::config::{GridConfig, PredictionDefaults};
use crate::inference::Prediction;
use flagscope_core::numeric::round_to;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundingBoxEncoding {
    pub grid_cell: (u32, u32),
    /// Offset of the box center inside its cell, in [0, 1)
    pub x_center: f64,
    pub y_center: f64,
    /// Box size relative to the image
    pub width: f64,
    pub height: f64,
    pub objectness: f64,
    pub best_anchor: usize,
    pub anchor_iou: f64,
    pub default_box: bool,
    pub explanation: String,
}

pub struct BoxEncoder<'a> {
    grid: &'a GridConfig,
    defaults: &'a PredictionDefaults,
}

/// Cell index of `coordinate` along an axis of `cells` cells of `cell_size`
fn cell_index(coordinate: f64, cell_size: f64, cells: u32) -> u32 {
    let index = (coordinate / cell_size).floor();
    index.clamp(0.0, (cells - 1) as f64) as u32
}

impl<'a> BoxEncoder<'a> {
    pub fn new(grid: &'a GridConfig, defaults: &'a PredictionDefaults) -> Self {
        Self { grid, defaults }
    }

    /// Best anchor index and its IoU. Anchors are centered on the box, so
    /// only their shapes matter. Ties keep the lowest index.
    pub fn match_anchor(&self, bbox: &BBox, cell_width: f64, cell_height: f64) -> (usize, f64) {
        let mut best = (0, 0.0);
        for (index, (anchor_w, anchor_h)) in self.grid.anchors.iter().enumerate() {
            let anchor = BBox::new(bbox.x, bbox.y, anchor_w * cell_width, anchor_h * cell_height);
            let iou = bbox.iou(&anchor);
            if iou > best.1 {
                best = (index, iou);
            }
        }
        best
    }

    pub fn encode(&self, width: i32, height: i32, prediction: Option<&Prediction>) -> BoundingBoxEncoding {
        let (image_w, image_h) = (width as f64, height as f64);
        let fallback = self.defaults.default_box(width as u32, height as u32);

        let (bbox, confidence) = match prediction {
            Some(prediction) => (prediction.bbox_or(fallback), prediction.confidence),
            None => (fallback, self.defaults.confidence),
        };

        let cells = self.grid.grid_size;
        let cell_w = image_w / cells as f64;
        let cell_h = image_h / cells as f64;

        let grid_cell = (cell_index(bbox.x, cell_w, cells), cell_index(bbox.y, cell_h, cells));
        let x_center = bbox.x.rem_euclid(cell_w) / cell_w;
        let y_center = bbox.y.rem_euclid(cell_h) / cell_h;

        let (best_anchor, anchor_iou) = self.match_anchor(&bbox, cell_w, cell_h);

        log::debug!(
            "Box encoding: cell {:?}, anchor {} (IoU {:.3}), objectness {:.2}",
            grid_cell,
            best_anchor,
            anchor_iou,
            confidence
        );

        BoundingBoxEncoding {
            grid_cell,
            x_center: round_to(x_center, 2),
            y_center: round_to(y_center, 2),
            width: round_to(bbox.width / image_w, 2),
            height: round_to(bbox.height / image_h, 2),
            objectness: round_to(confidence, 2),
            best_anchor,
            anchor_iou: round_to(anchor_iou, 2),
            default_box: prediction.is_none(),
            explanation: format!(
                "Grid cell: Location in {cells}x{cells} feature map. (x,y)_center: Position \
                 relative to grid cell. width/height: Size relative to image. Detectors predict \
                 bounding boxes by learning offsets from anchor boxes in each grid cell."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::CalculationConfig;

    #[test]
    fn test_default_box_without_prediction() {
        let config = CalculationConfig::default();
        let encoder = BoxEncoder::new(&config.grid, &config.defaults);
        let encoding = encoder.encode(640, 640, None);

        assert!(encoding.default_box);
        assert_eq!(encoding.grid_cell, (6, 6));
        assert_eq!(encoding.x_center, 0.5);
        assert_eq!(encoding.y_center, 0.5);
        assert_eq!(encoding.width, 0.7);
        assert_eq!(encoding.height, 0.5);
        assert_eq!(encoding.objectness, 0.5);
        assert_eq!(encoding.best_anchor, 0);
        assert_eq!(encoding, encoder.encode(640, 640, None));
    }

    #[test]
    fn test_grid_cell_is_clamped() {
        let config = CalculationConfig::default();
        let encoder = BoxEncoder::new(&config.grid, &config.defaults);

        let edge = Prediction::new("laos", 0.9, 640.0, 640.0, 100.0, 100.0);
        assert_eq!(encoder.encode(640, 640, Some(&edge)).grid_cell, (12, 12));

        let outside = Prediction::new("laos", 0.9, -20.0, 5.0, 100.0, 100.0);
        assert_eq!(encoder.encode(640, 640, Some(&outside)).grid_cell, (0, 0));
    }

    #[test]
    fn test_matching_anchor_shape_wins() {
        let config = CalculationConfig::default();
        let encoder = BoxEncoder::new(&config.grid, &config.defaults);
        let cell = 640.0 / 13.0;

        let tall = Prediction::new("brunei", 0.8, 100.0, 100.0, 0.8 * cell, 1.2 * cell);
        let encoding = encoder.encode(640, 640, Some(&tall));
        assert_eq!(encoding.best_anchor, 1);
        assert_eq!(encoding.anchor_iou, 1.0);
        assert_eq!(encoding.objectness, 0.8);
    }

    #[test]
    fn test_equal_anchors_keep_lowest_index() {
        let mut config = CalculationConfig::default();
        config.grid.anchors = vec![(0.8, 1.2), (1.0, 1.0), (0.8, 1.2)];
        let encoder = BoxEncoder::new(&config.grid, &config.defaults);
        let cell = 640.0 / 13.0;

        let tall = Prediction::new("brunei", 0.8, 200.0, 200.0, 0.8 * cell, 1.2 * cell);
        let encoding = encoder.encode(640, 640, Some(&tall));
        assert_eq!(encoding.best_anchor, 0);
        assert_eq!(encoding.anchor_iou, 1.0);
    }

    #[test]
    fn test_missing_geometry_uses_default_box() {
        let config = CalculationConfig::default();
        let encoder = BoxEncoder::new(&config.grid, &config.defaults);
        let partial = Prediction {
            class: "vietnam".to_string(),
            confidence: 0.66,
            x: None,
            y: None,
            width: None,
            height: None,
        };

        let encoding = encoder.encode(640, 640, Some(&partial));
        assert_eq!(encoding.width, 0.7);
        assert_eq!(encoding.objectness, 0.66);
        assert!(!encoding.default_box);
    }
}
