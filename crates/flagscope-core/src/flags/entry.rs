use crate::color::{ColorDistribution, ColorLabel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stripe layout a flag is expected to show under line detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinePattern {
    #[serde(rename = "horizontal")]
    Horizontal,
    #[serde(rename = "vertical")]
    Vertical,
    #[serde(rename = "diagonal")]
    Diagonal,
    #[serde(rename = "horizontal+diagonal")]
    HorizontalDiagonal,
    #[serde(rename = "none")]
    NoLines,
    #[serde(rename = "unknown")]
    Unknown,
}

impl LinePattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinePattern::Horizontal => "horizontal",
            LinePattern::Vertical => "vertical",
            LinePattern::Diagonal => "diagonal",
            LinePattern::HorizontalDiagonal => "horizontal+diagonal",
            LinePattern::NoLines => "none",
            LinePattern::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LinePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinePattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "horizontal" => Ok(LinePattern::Horizontal),
            "vertical" => Ok(LinePattern::Vertical),
            "diagonal" => Ok(LinePattern::Diagonal),
            "horizontal+diagonal" => Ok(LinePattern::HorizontalDiagonal),
            "none" => Ok(LinePattern::NoLines),
            "unknown" => Ok(LinePattern::Unknown),
            _ => Err(format!("Unknown line pattern: {s}")),
        }
    }
}

/// Width-to-height ratio written as "W:H".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Ratio as a number; a zero height falls back to 1.5.
    pub fn value(&self) -> f64 {
        if self.height == 0 {
            return 1.5;
        }
        self.width as f64 / self.height as f64
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::new(3, 2)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(':')
            .ok_or_else(|| format!("Aspect ratio must look like W:H, got '{s}'"))?;
        let width = w.trim().parse().map_err(|e| format!("Invalid aspect width '{w}': {e}"))?;
        let height = h.trim().parse().map_err(|e| format!("Invalid aspect height '{h}': {e}"))?;
        Ok(Self::new(width, height))
    }
}

/// Reference metadata for one flag class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagReferenceEntry {
    pub name: String,
    pub colors: Vec<ColorLabel>,
    pub expected_distribution: ColorDistribution,
    pub line_pattern: LinePattern,
    pub expected_lines: u32,
    pub aspect_ratio: AspectRatio,
    pub pattern: String,
}

impl FlagReferenceEntry {
    /// Entry used for any class the catalog does not describe.
    pub fn neutral() -> Self {
        Self {
            name: "unknown".to_string(),
            colors: Vec::new(),
            expected_distribution: ColorDistribution::new(),
            line_pattern: LinePattern::Unknown,
            expected_lines: 0,
            aspect_ratio: AspectRatio::default(),
            pattern: "unknown".to_string(),
        }
    }
}
