//! Color distribution and dominant color extraction

use crate::calculation::config::ColorConfig;
use crate::utils::{ImageUtils, StandardizedImage};
use crate::Result;
use flagscope_core::numeric::{percentage, round_to};
use flagscope_core::{ColorLabel, FlagReferenceEntry, Hsv};
use opencv::{
    core::{self, Mat, TermCriteria},
    prelude::*,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// One k-means cluster of the sampled HSV pixels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DominantColor {
    pub cluster_id: usize,
    pub color_name: ColorLabel,
    pub percentage: f64,
    pub rgb: [u8; 3],
    pub hsv: [u8; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorAnalysis {
    pub total_pixels: usize,
    pub sampled_pixels: usize,
    pub color_counts: BTreeMap<ColorLabel, usize>,
    /// Percentages in [0, 100], two decimals
    pub color_percentages: BTreeMap<ColorLabel, f64>,
    /// The predicted class's expectation, as percentages; empty when unknown
    pub expected_distribution: BTreeMap<ColorLabel, f64>,
    /// Largest cluster first
    pub dominant_colors: Vec<DominantColor>,
    pub color_analysis_method: String,
}

pub struct ColorAnalyzer<'a> {
    config: &'a ColorConfig,
}

impl<'a> ColorAnalyzer<'a> {
    pub fn new(config: &'a ColorConfig) -> Self {
        Self { config }
    }

    /// Stride giving roughly `sample_ratio` of `total` pixels
    pub fn sample_step(&self, total: usize) -> usize {
        let target = (total as f64 * self.config.sample_ratio) as usize;
        if target == 0 {
            return 1;
        }
        (total / target).max(1)
    }

    /// Number of clusters for a class: one per expected color plus background
    pub fn cluster_count(&self, expected: Option<&FlagReferenceEntry>) -> usize {
        match expected {
            Some(entry) => (entry.colors.len() + 1).min(self.config.max_clusters),
            None => self.config.default_clusters,
        }
    }

    pub fn analyze(
        &self,
        image: &StandardizedImage,
        expected: Option<&FlagReferenceEntry>,
    ) -> Result<ColorAnalysis> {
        let pixels = image.hsv_pixels()?;
        let total_pixels = pixels.len();
        let step = self.sample_step(total_pixels);
        let samples: Vec<Hsv> = pixels.into_iter().step_by(step).collect();

        let mut color_counts: BTreeMap<ColorLabel, usize> =
            ColorLabel::ALL.iter().map(|label| (*label, 0)).collect();
        for hsv in &samples {
            *color_counts.entry(self.config.hsv_ranges.classify(*hsv)).or_insert(0) += 1;
        }

        let sampled_pixels = samples.len();
        let color_percentages: BTreeMap<ColorLabel, f64> = color_counts
            .iter()
            .map(|(label, count)| (*label, percentage(*count, sampled_pixels)))
            .collect();

        let k = self.cluster_count(expected);
        let dominant_colors = if sampled_pixels > k {
            match self.dominant_colors(&samples, k) {
                Ok(colors) => colors,
                Err(e) => {
                    log::warn!("Color clustering failed, reporting no dominant colors: {}", e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let expected_distribution: BTreeMap<ColorLabel, f64> = expected
            .map(|entry| {
                entry
                    .expected_distribution
                    .iter()
                    .map(|(label, share)| (*label, round_to(share * 100.0, 2)))
                    .collect()
            })
            .unwrap_or_default();

        log::debug!(
            "Color analysis: {} of {} pixels sampled (step {}), {} clusters",
            sampled_pixels,
            total_pixels,
            step,
            dominant_colors.len()
        );

        Ok(ColorAnalysis {
            total_pixels,
            sampled_pixels,
            color_counts,
            color_percentages,
            expected_distribution,
            dominant_colors,
            color_analysis_method: "HSV thresholding with k-means clustering".to_string(),
        })
    }

    /// Seeded k-means over the raw HSV samples
    fn dominant_colors(&self, samples: &[Hsv], k: usize) -> Result<Vec<DominantColor>> {
        let rows: Vec<[f32; 3]> = samples
            .iter()
            .map(|hsv| [hsv.h as f32, hsv.s as f32, hsv.v as f32])
            .collect();
        let data = Mat::from_slice_2d(rows.as_slice())?;

        let criteria = TermCriteria::new(
            core::TermCriteria_COUNT + core::TermCriteria_EPS,
            self.config.kmeans_max_iterations,
            self.config.kmeans_epsilon,
        )?;
        let mut labels = Mat::default();
        let mut centers = Mat::default();

        core::set_rng_seed(self.config.kmeans_seed)?;
        core::kmeans(
            &data,
            k as i32,
            &mut labels,
            criteria,
            self.config.kmeans_attempts,
            core::KMEANS_PP_CENTERS,
            &mut centers,
        )?;

        let mut sizes = vec![0usize; k];
        for label in labels.data_typed::<i32>()? {
            if let Some(size) = usize::try_from(*label).ok().and_then(|i| sizes.get_mut(i)) {
                *size += 1;
            }
        }

        let mut clusters = Vec::with_capacity(k);
        for (index, size) in sizes.into_iter().enumerate() {
            let row = index as i32;
            let hsv = Hsv::from_centroid(
                *centers.at_2d::<f32>(row, 0)?,
                *centers.at_2d::<f32>(row, 1)?,
                *centers.at_2d::<f32>(row, 2)?,
            );
            clusters.push((size, hsv));
        }
        // Stable: equal clusters keep k-means order
        clusters.sort_by(|a, b| b.0.cmp(&a.0));

        clusters
            .into_iter()
            .enumerate()
            .map(|(rank, (size, hsv))| {
                Ok(DominantColor {
                    cluster_id: rank + 1,
                    color_name: self.config.hsv_ranges.classify(hsv),
                    percentage: percentage(size, samples.len()),
                    rgb: ImageUtils::hsv_to_rgb(hsv)?,
                    hsv: hsv.to_array(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::CalculationConfig;
    use flagscope_core::{ClassKey, FlagCatalog};
    use image::{Rgb, RgbImage};

    fn red_white_bands(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |_, y| {
            if y < height / 2 {
                Rgb([255, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    #[test]
    fn test_sample_step() {
        let config = CalculationConfig::default();
        let analyzer = ColorAnalyzer::new(&config.color);
        assert_eq!(analyzer.sample_step(409_600), 10);
        assert_eq!(analyzer.sample_step(5), 1);
        assert_eq!(analyzer.sample_step(0), 1);
    }

    #[test]
    fn test_cluster_count() {
        let config = CalculationConfig::default();
        let analyzer = ColorAnalyzer::new(&config.color);
        let catalog = FlagCatalog::builtin();

        let indonesia = catalog.lookup(&ClassKey::parse("Indonesia"));
        assert_eq!(analyzer.cluster_count(indonesia), 3);
        assert_eq!(analyzer.cluster_count(None), 3);
    }

    #[test]
    fn test_percentages_sum_to_hundred() -> Result<()> {
        let config = CalculationConfig::default();
        let image = StandardizedImage::from_rgb(&red_white_bands(60, 40), (64, 64))?;
        let analysis = ColorAnalyzer::new(&config.color).analyze(&image, None)?;

        let total: f64 = analysis.color_percentages.values().sum();
        assert!((total - 100.0).abs() < 0.1, "sum was {}", total);
        assert_eq!(analysis.total_pixels, 4096);
        assert_eq!(analysis.sampled_pixels, analysis.color_counts.values().sum::<usize>());
        assert!(analysis.expected_distribution.is_empty());
        Ok(())
    }

    #[test]
    fn test_bands_are_red_and_white() -> Result<()> {
        let config = CalculationConfig::default();
        let catalog = FlagCatalog::builtin();
        let indonesia = catalog.lookup(&ClassKey::parse("indonesia"));

        let image = StandardizedImage::from_rgb(&red_white_bands(64, 64), (64, 64))?;
        let analysis = ColorAnalyzer::new(&config.color).analyze(&image, indonesia)?;

        let red = analysis.color_percentages[&ColorLabel::Red];
        let white = analysis.color_percentages[&ColorLabel::White];
        assert!(red > 40.0 && white > 40.0, "red {} white {}", red, white);
        assert_eq!(analysis.expected_distribution[&ColorLabel::Red], 50.0);

        assert!(!analysis.dominant_colors.is_empty());
        assert_eq!(analysis.dominant_colors[0].cluster_id, 1);
        let names: Vec<ColorLabel> = analysis
            .dominant_colors
            .iter()
            .map(|color| color.color_name)
            .collect();
        assert!(names.contains(&ColorLabel::Red));
        assert!(names.contains(&ColorLabel::White));
        Ok(())
    }
}
