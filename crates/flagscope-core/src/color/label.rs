use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discrete color category assigned to a pixel or cluster centroid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorLabel {
    Red,
    Green,
    Blue,
    Yellow,
    White,
    Black,
    Other,
}

impl ColorLabel {
    pub const ALL: [ColorLabel; 7] = [
        ColorLabel::Red,
        ColorLabel::Green,
        ColorLabel::Blue,
        ColorLabel::Yellow,
        ColorLabel::White,
        ColorLabel::Black,
        ColorLabel::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorLabel::Red => "red",
            ColorLabel::Green => "green",
            ColorLabel::Blue => "blue",
            ColorLabel::Yellow => "yellow",
            ColorLabel::White => "white",
            ColorLabel::Black => "black",
            ColorLabel::Other => "other",
        }
    }
}

impl fmt::Display for ColorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorLabel::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown color label: {s}"))
    }
}

/// An 8-bit HSV triple on the OpenCV scale: hue in [0, 180), saturation and value in [0, 255].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }

    /// Quantize a floating-point cluster centroid, truncating each channel into `u8`.
    pub fn from_centroid(h: f32, s: f32, v: f32) -> Self {
        Self::new(h as u8, s as u8, v as u8)
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.h, self.s, self.v]
    }
}
