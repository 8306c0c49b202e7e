//! Weighted geometric mean of the component scores

use crate::calculation::config::ConfidenceWeights;
use flagscope_core::numeric::round_to;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceComponent {
    pub component: String,
    pub value: f64,
    pub weight: f64,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalConfidence {
    /// False when the inputs could not form a geometric mean
    pub valid: bool,
    pub confidence: f64,
    pub confidence_pct: String,
    pub component_scores: Vec<ConfidenceComponent>,
    pub explanation: String,
}

pub struct ConfidenceAggregator<'a> {
    weights: &'a ConfidenceWeights,
}

impl<'a> ConfidenceAggregator<'a> {
    pub fn new(weights: &'a ConfidenceWeights) -> Self {
        Self { weights }
    }

    fn rejected(reason: &str) -> FinalConfidence {
        FinalConfidence {
            valid: false,
            confidence: 0.0,
            confidence_pct: "0%".to_string(),
            component_scores: Vec::new(),
            explanation: reason.to_string(),
        }
    }

    pub fn aggregate(&self, objectness: f64, class_probability: f64, pattern: f64, shape: f64) -> FinalConfidence {
        if objectness <= 0.0 || class_probability <= 0.0 {
            return Self::rejected("Invalid objectness or class probability");
        }
        let total_weight = self.weights.total();
        if total_weight <= 0.0 {
            return Self::rejected("Invalid component weights");
        }

        let components = [
            ("Objectness Score", objectness, self.weights.objectness, "Confidence from bounding box detection"),
            ("Class Probability", class_probability, self.weights.class_probability, "Probability of the detected flag class"),
            ("Pattern Score", pattern, self.weights.pattern, "Score for pattern matching"),
            ("Shape Score", shape, self.weights.shape, "Score for shape characteristics"),
        ];

        let product = components
            .iter()
            .map(|(_, score, weight, _)| score.max(0.0).powf(weight / total_weight))
            .product::<f64>();
        let confidence = round_to(product, 4);

        log::debug!(
            "Final confidence {:.4} from objectness {:.2}, class {:.2}, pattern {:.2}, shape {:.2}",
            confidence,
            objectness,
            class_probability,
            pattern,
            shape
        );

        FinalConfidence {
            valid: true,
            confidence,
            confidence_pct: format!("{}%", round_to(confidence * 100.0, 2)),
            component_scores: components
                .iter()
                .map(|(name, value, weight, explanation)| ConfidenceComponent {
                    component: name.to_string(),
                    value: round_to(*value, 2),
                    weight: *weight,
                    explanation: explanation.to_string(),
                })
                .collect(),
            explanation: "Final confidence is calculated using a weighted geometric mean of all \
                          component scores, similar to how neural networks combine feature \
                          confidences but in a much simplified form."
                .to_string(),
        }
    }
}
