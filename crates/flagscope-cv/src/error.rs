//! Error taxonomy for the calculation pipeline
//!
//! Only decoding, the external inference call and genuine native failures are
//! errors. Numeric edge cases (no contours, no samples, empty unions, unknown
//! classes) are handled inside the stages with guarded defaults.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalculationError {
    /// Image bytes could not be decoded into a raster.
    #[error("failed to decode image; the file might be corrupted or not a valid image format")]
    Decode(#[from] image::ImageError),

    /// Decoded raster has no pixels.
    #[error("decoded image has invalid dimensions {width}x{height}")]
    InvalidImage { width: u32, height: u32 },

    /// The inference collaborator failed; its error is carried unmodified.
    #[error("inference collaborator failed")]
    Collaborator(#[source] anyhow::Error),

    /// A native OpenCV call failed.
    #[error("OpenCV operation failed")]
    Vision(#[from] opencv::Error),

    /// `image` <-> `Mat` conversion failed.
    #[error("image conversion failed")]
    Conversion(#[source] anyhow::Error),

    #[error("failed to serialize report")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write report")]
    Io(#[from] std::io::Error),
}
