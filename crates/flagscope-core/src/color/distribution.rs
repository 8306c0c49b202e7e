use super::label::ColorLabel;
use std::collections::BTreeMap;

/// Expected share of each color as a proportion in [0, 1]. Shares are not
/// required to sum to one.
pub type ColorDistribution = BTreeMap<ColorLabel, f64>;

/// Agreement between an expected and an observed proportion:
/// `1 - min(1, |expected - actual| / max(expected, 0.01))`.
pub fn proportion_similarity(expected: f64, actual: f64) -> f64 {
    1.0 - ((expected - actual).abs() / expected.max(0.01)).min(1.0)
}

/// Expected-share-weighted mean of [`proportion_similarity`] over every color in
/// `expected`. `observed_pct` holds percentages (0-100); colors absent from it
/// count as 0%. An empty expectation scores 0.
pub fn distribution_similarity(
    expected: &ColorDistribution,
    observed_pct: &BTreeMap<ColorLabel, f64>,
) -> f64 {
    let mut weighted = 0.0;
    let mut total_expected = 0.0;

    for (color, &expected_share) in expected {
        let actual = observed_pct.get(color).copied().unwrap_or(0.0) / 100.0;
        weighted += proportion_similarity(expected_share, actual) * expected_share;
        total_expected += expected_share;
    }

    if total_expected > 0.0 {
        weighted / total_expected
    } else {
        0.0
    }
}
