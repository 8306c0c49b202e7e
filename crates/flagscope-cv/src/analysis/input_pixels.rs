//! Sampling of a few fixed pixels of the standardized image

use crate::utils::StandardizedImage;
use crate::Result;
use flagscope_core::numeric::round_to;
use flagscope_core::{ColorLabel, HsvRangeTable};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PixelSample {
    pub position: String,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub h: u8,
    pub s: u8,
    pub v: u8,
    pub r_normalized: f64,
    pub color_type: ColorLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputAnalysis {
    pub image_dimensions: String,
    pub pixel_samples: Vec<PixelSample>,
    pub color_space: String,
}

/// Corners, edge midpoints and center, row by row
fn sample_points(width: i32, height: i32) -> [(i32, i32); 9] {
    let (mid_x, mid_y) = (width / 2, height / 2);
    let (last_x, last_y) = (width - 1, height - 1);
    [
        (0, 0),
        (mid_x, 0),
        (last_x, 0),
        (0, mid_y),
        (mid_x, mid_y),
        (last_x, mid_y),
        (0, last_y),
        (mid_x, last_y),
        (last_x, last_y),
    ]
}

pub fn analyze_input_pixels(image: &StandardizedImage, table: &HsvRangeTable) -> Result<InputAnalysis> {
    let mut pixel_samples = Vec::with_capacity(9);

    for (x, y) in sample_points(image.width, image.height) {
        let [r, g, b] = image.rgb_at(x, y)?;
        let hsv = image.hsv_at(x, y)?;

        pixel_samples.push(PixelSample {
            position: format!("({},{})", x, y),
            r,
            g,
            b,
            h: hsv.h,
            s: hsv.s,
            v: hsv.v,
            r_normalized: round_to(r as f64 / 255.0, 2),
            color_type: table.classify(hsv),
        });
    }

    Ok(InputAnalysis {
        image_dimensions: format!("{}x{}", image.width, image.height),
        pixel_samples,
        color_space: "RGB and HSV analyzed".to_string(),
    })
}
