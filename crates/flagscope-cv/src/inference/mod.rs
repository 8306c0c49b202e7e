//! External inference collaborator: prediction types and offline clients

pub mod loader;

pub use loader::PredictionLoader;

use crate::bbox::BBox;
use crate::traits::InferenceClient;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// One detection reported by the inference collaborator. Geometry is in
/// pixels, center format; fields the collaborator omits stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default = "unknown_class")]
    pub class: String,
    /// 0 when the response omits it, which zeroes the final confidence. Only a
    /// missing prediction falls back to the default objectness.
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

fn unknown_class() -> String {
    "unknown".to_string()
}

impl Prediction {
    pub fn new(class: &str, confidence: f64, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            class: class.to_string(),
            confidence,
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
        }
    }

    /// The predicted box, taking any missing coordinate from `fallback`.
    pub fn bbox_or(&self, fallback: BBox) -> BBox {
        BBox::new(
            self.x.unwrap_or(fallback.x),
            self.y.unwrap_or(fallback.y),
            self.width.unwrap_or(fallback.width),
            self.height.unwrap_or(fallback.height),
        )
    }

    /// The predicted box with missing coordinates treated as zero.
    pub fn bbox(&self) -> BBox {
        self.bbox_or(BBox::default())
    }
}

/// The collaborator's response. Unrecognized top-level fields are carried
/// through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictionSet {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PredictionSet {
    pub fn new(predictions: Vec<Prediction>) -> Self {
        Self {
            predictions,
            extra: serde_json::Map::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    /// Highest-confidence prediction; the first one wins a tie.
    pub fn top(&self) -> Option<&Prediction> {
        self.predictions.iter().fold(None, |best: Option<&Prediction>, p| match best {
            Some(b) if b.confidence >= p.confidence => Some(b),
            _ => Some(p),
        })
    }

    /// Lower-cased label of the top prediction, or "unknown".
    pub fn predicted_class(&self) -> String {
        self.top()
            .map(|p| p.class.trim().to_lowercase())
            .unwrap_or_else(unknown_class)
    }
}

/// Collaborator that always answers with the same prediction set.
#[derive(Debug, Clone, Default)]
pub struct StaticInference {
    predictions: PredictionSet,
}

impl StaticInference {
    pub fn new(predictions: PredictionSet) -> Self {
        Self { predictions }
    }

    /// Collaborator that never detects anything.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl InferenceClient for StaticInference {
    fn detect(&self, _image: &RgbImage) -> anyhow::Result<PredictionSet> {
        Ok(self.predictions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_collaborator_response() {
        let json = r#"{
            "time": 0.12,
            "image": {"width": 800, "height": 600},
            "predictions": [
                {"class": "Indonesia", "confidence": 0.91, "x": 320.0, "y": 300.5, "width": 400, "height": 260, "class_id": 2},
                {"class": "Singapore", "confidence": 0.40}
            ]
        }"#;

        let set: PredictionSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.predictions.len(), 2);
        assert_eq!(set.predictions[0].width, Some(400.0));
        assert_eq!(set.predictions[1].x, None);
        assert!(set.extra.contains_key("time"));
        assert_eq!(set.predicted_class(), "indonesia");
    }

    #[test]
    fn test_missing_fields_default() {
        let set: PredictionSet = serde_json::from_str(r#"{"predictions": [{}]}"#).unwrap();
        assert_eq!(set.predictions[0].class, "unknown");
        assert_eq!(set.predictions[0].confidence, 0.0);

        let empty: PredictionSet = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.predicted_class(), "unknown");
    }

    #[test]
    fn test_top_prefers_first_on_tie() {
        let set = PredictionSet::new(vec![
            Prediction::new("Laos", 0.7, 0.0, 0.0, 1.0, 1.0),
            Prediction::new("Cambodia", 0.7, 0.0, 0.0, 1.0, 1.0),
            Prediction::new("Thailand", 0.2, 0.0, 0.0, 1.0, 1.0),
        ]);
        assert_eq!(set.top().map(|p| p.class.as_str()), Some("Laos"));
    }

    #[test]
    fn test_bbox_or_fills_missing_coordinates() {
        let partial = Prediction {
            class: "Laos".into(),
            confidence: 0.5,
            x: Some(10.0),
            y: None,
            width: None,
            height: Some(4.0),
        };
        let fallback = BBox::new(1.0, 2.0, 3.0, 5.0);
        assert_eq!(partial.bbox_or(fallback), BBox::new(10.0, 2.0, 3.0, 4.0));
    }
}
