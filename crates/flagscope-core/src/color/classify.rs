//! Threshold-based HSV color classification

use super::label::{ColorLabel, Hsv};
use serde::{Deserialize, Serialize};

/// Inclusive HSV box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, hsv: Hsv) -> bool {
        hsv.to_array()
            .iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(value, (lo, hi))| lo <= value && value <= hi)
    }
}

/// Ordered classification rules. The achromatic shortcuts run first, then the
/// per-color boxes in table order; the first match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HsvRangeTable {
    /// Values strictly below this are black regardless of hue and saturation.
    pub black_value_below: u8,
    /// Saturation strictly below this combined with value strictly above
    /// `white_value_above` is white.
    pub white_saturation_below: u8,
    pub white_value_above: u8,
    pub ranges: Vec<(ColorLabel, Vec<HsvRange>)>,
}

impl Default for HsvRangeTable {
    fn default() -> Self {
        Self {
            black_value_below: 30,
            white_saturation_below: 30,
            white_value_above: 200,
            ranges: vec![
                (
                    ColorLabel::Red,
                    // Red wraps around the hue circle
                    vec![
                        HsvRange::new([0, 100, 100], [10, 255, 255]),
                        HsvRange::new([160, 100, 100], [180, 255, 255]),
                    ],
                ),
                (ColorLabel::Green, vec![HsvRange::new([35, 100, 100], [85, 255, 255])]),
                (ColorLabel::Blue, vec![HsvRange::new([100, 100, 100], [130, 255, 255])]),
                (ColorLabel::Yellow, vec![HsvRange::new([20, 100, 100], [35, 255, 255])]),
                (ColorLabel::White, vec![HsvRange::new([0, 0, 200], [180, 30, 255])]),
                (ColorLabel::Black, vec![HsvRange::new([0, 0, 0], [180, 255, 30])]),
            ],
        }
    }
}

impl HsvRangeTable {
    /// Classify one HSV sample.
    pub fn classify(&self, hsv: Hsv) -> ColorLabel {
        if hsv.v < self.black_value_below {
            return ColorLabel::Black;
        }
        if hsv.s < self.white_saturation_below && hsv.v > self.white_value_above {
            return ColorLabel::White;
        }

        self.ranges
            .iter()
            .find(|(_, boxes)| boxes.iter().any(|range| range.contains(hsv)))
            .map(|(label, _)| *label)
            .unwrap_or(ColorLabel::Other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_dark_samples_are_black() {
        let table = HsvRangeTable::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2000 {
            let hsv = Hsv::new(rng.gen_range(0..180), rng.r#gen(), rng.gen_range(0..30));
            assert_eq!(table.classify(hsv), ColorLabel::Black, "{hsv:?}");
        }
    }

    #[test]
    fn test_bright_unsaturated_samples_are_white() {
        let table = HsvRangeTable::default();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..2000 {
            let hsv = Hsv::new(rng.gen_range(0..180), rng.gen_range(0..30), rng.gen_range(201..=255));
            assert_eq!(table.classify(hsv), ColorLabel::White, "{hsv:?}");
        }
    }

    #[test]
    fn test_red_on_both_sides_of_hue_wrap() {
        let table = HsvRangeTable::default();
        assert_eq!(table.classify(Hsv::new(0, 255, 255)), ColorLabel::Red);
        assert_eq!(table.classify(Hsv::new(175, 200, 200)), ColorLabel::Red);
    }

    #[test]
    fn test_table_order_resolves_overlaps() {
        let table = HsvRangeTable::default();
        // Hue 35 sits on the green/yellow boundary; green is listed first
        assert_eq!(table.classify(Hsv::new(35, 200, 200)), ColorLabel::Green);
        assert_eq!(table.classify(Hsv::new(30, 255, 255)), ColorLabel::Yellow);
        assert_eq!(table.classify(Hsv::new(120, 255, 255)), ColorLabel::Blue);
    }

    #[test]
    fn test_unmatched_sample_is_other() {
        let table = HsvRangeTable::default();
        // Mid-grey and orange-ish hue with low saturation match nothing
        assert_eq!(table.classify(Hsv::new(90, 10, 128)), ColorLabel::Other);
        assert_eq!(table.classify(Hsv::new(15, 200, 200)), ColorLabel::Other);
    }

    #[test]
    fn test_value_thirty_falls_through_to_black_box() {
        let table = HsvRangeTable::default();
        assert_eq!(table.classify(Hsv::new(90, 10, 30)), ColorLabel::Black);
    }
}
