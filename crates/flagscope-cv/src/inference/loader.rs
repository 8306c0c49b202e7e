//! Prediction loading from recorded collaborator responses

use super::PredictionSet;
use crate::traits::InferenceClient;
use anyhow::Context;
use image::RgbImage;
use std::fs;
use std::path::{Path, PathBuf};

/// Collaborator backed by a JSON response file on disk, read on every call.
#[derive(Debug, Clone)]
pub struct PredictionLoader {
    path: PathBuf,
}

impl PredictionLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Parse a response file in the collaborator's `{"predictions": [...]}` shape
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<PredictionSet> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read predictions: {:?}", path))?;

        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse predictions: {:?}", path))
    }
}

impl InferenceClient for PredictionLoader {
    fn detect(&self, _image: &RgbImage) -> anyhow::Result<PredictionSet> {
        Self::load(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_an_error() {
        let loader = PredictionLoader::new("/nonexistent/predictions.json");
        let image = RgbImage::new(4, 4);
        let err = loader.detect(&image).unwrap_err();
        assert!(err.to_string().contains("Failed to read predictions"));
    }

    #[test]
    fn test_loads_response_file() -> anyhow::Result<()> {
        let path = std::env::temp_dir().join(format!("flagscope-predictions-{}.json", std::process::id()));
        fs::write(&path, r#"{"predictions":[{"class":"Myanmar","confidence":0.8,"x":1,"y":2,"width":3,"height":4}]}"#)?;

        let set = PredictionLoader::load(&path)?;
        fs::remove_file(&path)?;

        assert_eq!(set.predictions.len(), 1);
        assert_eq!(set.predicted_class(), "myanmar");
        Ok(())
    }
}
