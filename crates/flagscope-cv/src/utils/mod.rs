//! Utility modules

pub mod image;
pub mod nms;

pub use self::image::{ImageUtils, StandardizedImage};
pub use nms::{NmsDecision, NmsReport, NmsSimulator};
