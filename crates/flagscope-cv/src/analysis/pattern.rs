//! Stripe pattern scoring from detected line segments

use super::color::ColorAnalysis;
use crate::calculation::config::PatternConfig;
use crate::utils::StandardizedImage;
use crate::Result;
use flagscope_core::numeric::round_to;
use flagscope_core::{distribution_similarity, FlagReferenceEntry, LinePattern};
use opencv::{
    core::{Mat, Vec4i, Vector},
    imgproc,
    prelude::*,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
    Diagonal,
}

/// A detected segment between two pixel endpoints
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: (i32, i32),
    pub end: (i32, i32),
}

impl LineSegment {
    pub fn new(start: (i32, i32), end: (i32, i32)) -> Self {
        Self { start, end }
    }

    /// Absolute angle from the horizontal axis, in [0, 180] degrees
    pub fn angle_degrees(&self) -> f64 {
        let dy = (self.end.1 - self.start.1) as f64;
        let dx = (self.end.0 - self.start.0) as f64;
        dy.atan2(dx).to_degrees().abs()
    }

    pub fn orientation(&self, config: &PatternConfig) -> Orientation {
        let angle = self.angle_degrees();
        let tolerance = config.horizontal_tolerance_degrees;
        let (low, high) = config.vertical_band_degrees;

        if angle < tolerance || angle > 180.0 - tolerance {
            Orientation::Horizontal
        } else if angle > low && angle < high {
            Orientation::Vertical
        } else {
            Orientation::Diagonal
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineCounts {
    pub horizontal: u32,
    pub vertical: u32,
    pub diagonal: u32,
}

impl LineCounts {
    pub fn tally<'s>(segments: impl IntoIterator<Item = &'s LineSegment>, config: &PatternConfig) -> Self {
        let mut counts = LineCounts::default();
        for segment in segments {
            match segment.orientation(config) {
                Orientation::Horizontal => counts.horizontal += 1,
                Orientation::Vertical => counts.vertical += 1,
                Orientation::Diagonal => counts.diagonal += 1,
            }
        }
        counts
    }
}

/// `1 - min(1, |actual - expected| / max(1, expected))`
fn count_match(actual: u32, expected: u32) -> f64 {
    let diff = (actual as f64 - expected as f64).abs();
    1.0 - (diff / (expected.max(1) as f64)).min(1.0)
}

/// Penalty for lines running across the expected direction
fn cross_penalty(cross: u32, along: u32) -> f64 {
    (1.0 - (cross as f64 / along.max(1) as f64) * 0.5).max(0.0)
}

/// Agreement between the detected line counts and a class's line pattern
pub fn line_pattern_score(
    pattern: LinePattern,
    counts: &LineCounts,
    expected_lines: u32,
    config: &PatternConfig,
) -> f64 {
    match pattern {
        LinePattern::Horizontal => {
            count_match(counts.horizontal, expected_lines)
                * cross_penalty(counts.vertical, counts.horizontal)
        }
        LinePattern::Vertical => {
            count_match(counts.vertical, expected_lines)
                * cross_penalty(counts.horizontal, counts.vertical)
        }
        LinePattern::Diagonal => count_match(counts.diagonal, expected_lines),
        // One horizontal and one diagonal edge
        LinePattern::HorizontalDiagonal => {
            (count_match(counts.horizontal, 1) + count_match(counts.diagonal, 1)) / 2.0
        }
        LinePattern::NoLines => config.no_lines_score,
        LinePattern::Unknown => config.unknown_pattern_score,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineDetection {
    pub total_lines_detected: usize,
    pub horizontal_lines: u32,
    pub vertical_lines: u32,
    pub diagonal_lines: u32,
    pub expected_pattern: LinePattern,
    pub expected_line_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternScores {
    pub color_distribution: f64,
    pub line_pattern_match: f64,
    pub aspect_ratio: f64,
    pub orientation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternAnalysis {
    pub expected_pattern: String,
    pub line_detection: LineDetection,
    pub component_scores: PatternScores,
    pub pattern_score: f64,
    pub explanation: String,
}

pub struct PatternMatcher<'a> {
    config: &'a PatternConfig,
}

impl<'a> PatternMatcher<'a> {
    pub fn new(config: &'a PatternConfig) -> Self {
        Self { config }
    }

    /// Canny edges followed by the probabilistic Hough transform
    pub fn detect_segments(&self, gray: &Mat) -> Result<Vec<LineSegment>> {
        let mut edges = Mat::default();
        imgproc::canny(gray, &mut edges, self.config.canny_low, self.config.canny_high, 3, false)?;

        let mut lines = Vector::<Vec4i>::new();
        imgproc::hough_lines_p(
            &edges,
            &mut lines,
            self.config.hough_rho,
            self.config.hough_theta_degrees.to_radians(),
            self.config.hough_threshold,
            self.config.min_line_length,
            self.config.max_line_gap,
        )?;

        Ok(lines
            .iter()
            .map(|line| LineSegment::new((line[0], line[1]), (line[2], line[3])))
            .collect())
    }

    pub fn analyze(
        &self,
        image: &StandardizedImage,
        colors: &ColorAnalysis,
        entry: &FlagReferenceEntry,
        class_label: &str,
    ) -> Result<PatternAnalysis> {
        let segments = self.detect_segments(&image.gray)?;
        let counts = LineCounts::tally(&segments, self.config);

        let color_distribution =
            distribution_similarity(&entry.expected_distribution, &colors.color_percentages);
        let line_pattern_match =
            line_pattern_score(entry.line_pattern, &counts, entry.expected_lines, self.config);

        let overall = self.config.color_weight * color_distribution
            + self.config.line_weight * line_pattern_match
            + self.config.aspect_weight * self.config.aspect_placeholder
            + self.config.orientation_weight * self.config.orientation_placeholder;

        log::debug!(
            "Pattern: {} segments ({:?}), expected {} x{}, score {:.3}",
            segments.len(),
            counts,
            entry.line_pattern,
            entry.expected_lines,
            overall
        );

        Ok(PatternAnalysis {
            expected_pattern: entry.pattern.clone(),
            line_detection: LineDetection {
                total_lines_detected: segments.len(),
                horizontal_lines: counts.horizontal,
                vertical_lines: counts.vertical,
                diagonal_lines: counts.diagonal,
                expected_pattern: entry.line_pattern,
                expected_line_count: entry.expected_lines,
            },
            component_scores: PatternScores {
                color_distribution: round_to(color_distribution, 2),
                line_pattern_match: round_to(line_pattern_match, 2),
                aspect_ratio: self.config.aspect_placeholder,
                orientation: self.config.orientation_placeholder,
            },
            pattern_score: round_to(overall, 2),
            explanation: format!(
                "Pattern score evaluates how well the image matches the expected pattern for \
                 {class_label} flag using Hough line detection for identifying stripes and \
                 geometric patterns. Aspect ratio and orientation are fixed estimates, not \
                 measured."
            ),
        })
    }
}
