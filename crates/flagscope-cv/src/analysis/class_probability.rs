//! Per-class probability estimate from the observed colors

use super::color::ColorAnalysis;
use crate::calculation::config::ClassProbabilityConfig;
use flagscope_core::numeric::round_to;
use flagscope_core::{distribution_similarity, ClassKey, FlagCatalog, FlagClass, FlagReferenceEntry};
use serde::Serialize;
use std::collections::BTreeMap;

/// How a class compares with the observed colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchNote {
    #[serde(rename = "Highest match based on color distribution")]
    Predicted,
    #[serde(rename = "Very similar color profile")]
    VerySimilar,
    #[serde(rename = "Similar color profile")]
    Similar,
    #[serde(rename = "Some color similarities")]
    SomeSimilarity,
    #[serde(rename = "Low color match")]
    Low,
}

impl MatchNote {
    fn for_probability(probability: f64) -> Self {
        if probability > 0.7 {
            MatchNote::VerySimilar
        } else if probability > 0.5 {
            MatchNote::Similar
        } else if probability > 0.3 {
            MatchNote::SomeSimilarity
        } else {
            MatchNote::Low
        }
    }
}

/// Score components behind one class probability
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassScore {
    pub distribution_score: f64,
    pub membership_score: f64,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassProbabilities {
    pub probabilities: BTreeMap<FlagClass, f64>,
    /// Descending; equal probabilities keep `FlagClass` order, which is alphabetical
    pub sorted_probabilities: Vec<(FlagClass, f64)>,
    pub notes: BTreeMap<FlagClass, MatchNote>,
    pub breakdown: BTreeMap<FlagClass, ClassScore>,
    pub explanation: String,
}

impl ClassProbabilities {
    /// Probability of `key`; zero for classes outside the catalog
    pub fn probability_of(&self, key: &ClassKey) -> f64 {
        key.known()
            .and_then(|class| self.probabilities.get(&class))
            .copied()
            .unwrap_or(0.0)
    }
}

pub struct ClassProbabilityEstimator<'a> {
    config: &'a ClassProbabilityConfig,
    catalog: &'a FlagCatalog,
}

impl<'a> ClassProbabilityEstimator<'a> {
    pub fn new(config: &'a ClassProbabilityConfig, catalog: &'a FlagCatalog) -> Self {
        Self { config, catalog }
    }

    /// Raw and clamped scores of one catalog entry against the color analysis
    pub fn score(&self, entry: &FlagReferenceEntry, colors: &ColorAnalysis) -> ClassScore {
        let distribution_score =
            distribution_similarity(&entry.expected_distribution, &colors.color_percentages);

        // Counted per cluster, so repeated colors can push this above one
        let membership_score = if entry.colors.is_empty() {
            0.0
        } else {
            let matched = colors
                .dominant_colors
                .iter()
                .filter(|cluster| entry.colors.contains(&cluster.color_name))
                .count();
            matched as f64 / entry.colors.len() as f64
        };

        let combined = self.config.distribution_weight * distribution_score
            + self.config.membership_weight * membership_score;

        ClassScore {
            distribution_score,
            membership_score,
            probability: combined.clamp(self.config.min_probability, self.config.max_probability),
        }
    }

    pub fn estimate(&self, colors: &ColorAnalysis, predicted: &ClassKey) -> ClassProbabilities {
        let mut probabilities = BTreeMap::new();
        let mut sorted_probabilities = Vec::with_capacity(self.catalog.len());
        let mut notes = BTreeMap::new();
        let mut breakdown = BTreeMap::new();

        for (class, entry) in self.catalog.iter() {
            let score = self.score(entry, colors);
            let probability = round_to(score.probability, 2);

            let note = if predicted.known() == Some(class) {
                MatchNote::Predicted
            } else {
                MatchNote::for_probability(score.probability)
            };

            probabilities.insert(class, probability);
            sorted_probabilities.push((class, probability));
            notes.insert(class, note);
            breakdown.insert(class, score);
        }

        sorted_probabilities.sort_by(|a, b| b.1.total_cmp(&a.1));

        if let Some((best, probability)) = sorted_probabilities.first() {
            log::debug!("Class probabilities: best match {} ({:.2})", best, probability);
        }

        ClassProbabilities {
            probabilities,
            sorted_probabilities,
            notes,
            breakdown,
            explanation: "Probabilities are calculated based on color distribution match with \
                          known flags. Both HSV color classification and dominant color \
                          clustering are used to improve accuracy."
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::color::DominantColor;
    use crate::calculation::CalculationConfig;
    use flagscope_core::ColorLabel;

    fn observed(red: f64, white: f64, clusters: &[ColorLabel]) -> ColorAnalysis {
        let color_percentages: BTreeMap<ColorLabel, f64> = ColorLabel::ALL
            .iter()
            .map(|label| match label {
                ColorLabel::Red => (*label, red),
                ColorLabel::White => (*label, white),
                _ => (*label, 0.0),
            })
            .collect();
        ColorAnalysis {
            total_pixels: 100,
            sampled_pixels: 100,
            color_counts: BTreeMap::new(),
            color_percentages,
            expected_distribution: BTreeMap::new(),
            dominant_colors: clusters
                .iter()
                .enumerate()
                .map(|(i, label)| DominantColor {
                    cluster_id: i + 1,
                    color_name: *label,
                    percentage: 100.0 / clusters.len() as f64,
                    rgb: [0, 0, 0],
                    hsv: [0, 0, 0],
                })
                .collect(),
            color_analysis_method: String::new(),
        }
    }

    #[test]
    fn test_half_red_half_white_prefers_indonesia_over_vietnam() {
        let config = CalculationConfig::default();
        let estimator = ClassProbabilityEstimator::new(&config.class_probability, FlagCatalog::builtin());
        let colors = observed(50.0, 50.0, &[ColorLabel::Red, ColorLabel::White]);

        let result = estimator.estimate(&colors, &ClassKey::parse("unknown"));
        let indonesia = result.probabilities[&FlagClass::Indonesia];
        let vietnam = result.probabilities[&FlagClass::Vietnam];

        assert_eq!(indonesia, 0.95);
        assert!(indonesia > vietnam, "indonesia {} vietnam {}", indonesia, vietnam);
        assert_eq!(result.sorted_probabilities[0].1, 0.95);
    }

    #[test]
    fn test_probabilities_are_clamped() {
        let config = CalculationConfig::default();
        let estimator = ClassProbabilityEstimator::new(&config.class_probability, FlagCatalog::builtin());
        let colors = observed(0.0, 0.0, &[]);

        let result = estimator.estimate(&colors, &ClassKey::parse("unknown"));
        assert!(result.probabilities.values().all(|p| (0.05..=0.95).contains(p)));
        assert_eq!(result.probabilities[&FlagClass::Vietnam], 0.05);
    }

    #[test]
    fn test_ties_follow_class_order() {
        let mut config = CalculationConfig::default();
        config.class_probability.min_probability = 0.05;
        config.class_probability.max_probability = 0.05;
        let estimator = ClassProbabilityEstimator::new(&config.class_probability, FlagCatalog::builtin());
        let colors = observed(50.0, 50.0, &[ColorLabel::Red, ColorLabel::White]);

        let result = estimator.estimate(&colors, &ClassKey::parse("vietnam"));
        let order: Vec<FlagClass> = result.sorted_probabilities.iter().map(|(class, _)| *class).collect();
        assert_eq!(order, FlagClass::ALL.to_vec());
    }

    #[test]
    fn test_predicted_class_is_noted() {
        let config = CalculationConfig::default();
        let estimator = ClassProbabilityEstimator::new(&config.class_probability, FlagCatalog::builtin());
        let colors = observed(0.0, 0.0, &[]);

        let result = estimator.estimate(&colors, &ClassKey::parse("Thailand"));
        assert_eq!(result.notes[&FlagClass::Thailand], MatchNote::Predicted);
        assert_eq!(result.notes[&FlagClass::Laos], MatchNote::Low);
        assert_eq!(result.probability_of(&ClassKey::parse("atlantis")), 0.0);
    }

    #[test]
    fn test_membership_counts_each_cluster() {
        let config = CalculationConfig::default();
        let estimator = ClassProbabilityEstimator::new(&config.class_probability, FlagCatalog::builtin());
        let entry = FlagCatalog::builtin().resolve(&ClassKey::parse("indonesia"));
        let colors = observed(50.0, 50.0, &[ColorLabel::Red, ColorLabel::Red, ColorLabel::White]);

        let score = estimator.score(entry, &colors);
        assert_eq!(score.membership_score, 1.5);
        assert_eq!(score.probability, 0.95);
    }
}
