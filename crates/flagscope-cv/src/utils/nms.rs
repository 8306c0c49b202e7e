//! Non-maximum suppression over the collaborator's predictions

use crate::inference::Prediction;
use crate::traits::NonMaxSuppression;
use flagscope_core::numeric::round_to;
use serde::{Serialize, Serializer};

/// Greedy confidence-ordered suppression with a fixed IoU cutoff
#[derive(Debug, Clone, Copy)]
pub struct NmsSimulator {
    threshold: f64,
}

/// What happened to one candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NmsDecision {
    /// 1-based rank after sorting by confidence
    pub box_id: usize,
    pub confidence: f64,
    /// Highest IoU against a kept box; `None` when nothing overlapped
    #[serde(rename = "iou_with_previous", serialize_with = "iou_or_dash")]
    pub max_iou: Option<f64>,
    /// 1-based index into the kept boxes
    pub overlapping_with: Option<usize>,
    pub threshold: f64,
    pub keep: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NmsReport {
    pub threshold: f64,
    pub boxes: Vec<NmsDecision>,
    pub kept_boxes: usize,
    pub explanation: String,
}

fn iou_or_dash<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(iou) => serializer.serialize_f64(*iou),
        None => serializer.serialize_str("-"),
    }
}

impl NmsSimulator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl NonMaxSuppression for NmsSimulator {
    fn suppress(&self, predictions: &[Prediction]) -> NmsReport {
        if predictions.is_empty() {
            return NmsReport {
                threshold: self.threshold,
                boxes: Vec::new(),
                kept_boxes: 0,
                explanation: "No predictions to apply NMS".to_string(),
            };
        }

        // Stable sort keeps collaborator order among equal confidences
        let mut sorted: Vec<&Prediction> = predictions.iter().collect();
        sorted.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let mut kept = Vec::new();
        let mut boxes = Vec::with_capacity(sorted.len());

        for (rank, prediction) in sorted.into_iter().enumerate() {
            let candidate = prediction.bbox();

            let mut max_iou = 0.0;
            let mut overlapping_with = None;
            for (index, kept_box) in kept.iter().enumerate() {
                let iou = candidate.iou(kept_box);
                if iou > max_iou {
                    max_iou = iou;
                    overlapping_with = Some(index + 1);
                }
            }

            let keep = max_iou <= self.threshold;
            if keep {
                kept.push(candidate);
            }

            boxes.push(NmsDecision {
                box_id: rank + 1,
                confidence: round_to(prediction.confidence, 2),
                max_iou: overlapping_with.map(|_| round_to(max_iou, 2)),
                overlapping_with,
                threshold: self.threshold,
                keep,
            });
        }

        log::debug!("NMS kept {} of {} boxes", kept.len(), boxes.len());

        NmsReport {
            threshold: self.threshold,
            boxes,
            kept_boxes: kept.len(),
            explanation: "Non-Maximum Suppression removes overlapping boxes, keeping only the \
                          highest confidence detections. In object detection, NMS prevents \
                          duplicate detections of the same object."
                .to_string(),
        }
    }
}
