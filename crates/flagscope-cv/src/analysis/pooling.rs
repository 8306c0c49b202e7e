//! Feature-map and pooling illustration
//!
//! The region values below are fixed demonstration numbers. They are not
//! derived from the convolution stage or from the image, so this section is
//! identical for every input and does not describe the image it accompanies.

use flagscope_core::numeric::round_to;
use serde::Serialize;

/// Named region of a 13x13 feature map with its illustrative activations
struct DemoRegion {
    position: &'static str,
    x: u32,
    y: u32,
    values: [u32; 4],
}

const DEMO_REGIONS: [DemoRegion; 5] = [
    DemoRegion { position: "top_left", x: 1, y: 1, values: [2, 3, 2, 1] },
    DemoRegion { position: "top_right", x: 40, y: 1, values: [1, 2, 0, 1] },
    DemoRegion { position: "bottom_left", x: 1, y: 40, values: [1, 0, 1, 0] },
    DemoRegion { position: "bottom_right", x: 40, y: 40, values: [3, 2, 1, 3] },
    DemoRegion { position: "center", x: 20, y: 20, values: [4, 3, 5, 4] },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolingResult {
    pub position: String,
    pub region: String,
    pub feature_values: Vec<u32>,
    pub max_value: u32,
    pub avg_value: f64,
    pub feature_map_x: u32,
    pub feature_map_y: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureMapAnalysis {
    pub feature_map_dimensions: String,
    pub pooling_results: Vec<PoolingResult>,
    pub pooling_types: Vec<String>,
    pub illustrative_only: bool,
    pub explanation: String,
}

/// Max and average pooling over the fixed demonstration regions
pub fn simulate_feature_maps() -> FeatureMapAnalysis {
    let pooling_results = DEMO_REGIONS
        .iter()
        .map(|region| {
            let max_value = region.values.iter().copied().max().unwrap_or(0);
            let sum: u32 = region.values.iter().sum();

            PoolingResult {
                position: region.position.to_string(),
                region: format!("({}:{},{}:{})", region.x, region.x + 2, region.y, region.y + 2),
                feature_values: region.values.to_vec(),
                max_value,
                avg_value: round_to(sum as f64 / region.values.len() as f64, 2),
                feature_map_x: region.x,
                feature_map_y: region.y,
            }
        })
        .collect();

    FeatureMapAnalysis {
        feature_map_dimensions: "13x13 (downsampled from 640x640)".to_string(),
        pooling_results,
        pooling_types: vec!["max".to_string(), "average".to_string()],
        illustrative_only: true,
        explanation: "Feature maps capture patterns like edges, textures, and color transitions. \
                      In a real CNN, early layers detect simple features while deeper layers \
                      detect more complex patterns. Pooling reduces dimensionality while \
                      preserving important features. The activations shown here are fixed \
                      demonstration values, not taken from the convolution output above."
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pooling_arithmetic() {
        let analysis = simulate_feature_maps();
        assert_eq!(analysis.pooling_results.len(), 5);

        let center = &analysis.pooling_results[4];
        assert_eq!(center.position, "center");
        assert_eq!(center.region, "(20:22,20:22)");
        assert_eq!(center.max_value, 5);
        assert_eq!(center.avg_value, 4.0);

        let top_right = &analysis.pooling_results[1];
        assert_eq!(top_right.max_value, 2);
        assert_eq!(top_right.avg_value, 1.0);

        let bottom_right = &analysis.pooling_results[3];
        assert_eq!(bottom_right.avg_value, 2.25);
    }

    #[test]
    fn test_identical_across_invocations() {
        assert_eq!(simulate_feature_maps(), simulate_feature_maps());
    }
}
