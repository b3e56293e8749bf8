use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub device_id: i32,
    /// Flip frames horizontally before detection (selfie view)
    pub mirror: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub model_path: String,
    pub max_hands: usize,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ClassifierConfig {
    /// Extra normalized height a fingertip must clear above its joint
    pub vertical_margin: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    pub window_title: String,
    pub bbox_margin_px: i32,
    pub exit_key: i32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            mirror: true,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: "models/hand_landmark.onnx".to_string(),
            max_hands: 1,
            min_detection_confidence: 0.7,
            min_tracking_confidence: 0.7,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            window_title: "Hand Vectors".to_string(),
            bbox_margin_px: 30,
            exit_key: 27,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let d = &self.detector;
        if d.model_path.trim().is_empty() {
            return Err(Error::Config("model_path must not be empty".to_string()));
        }
        if d.max_hands == 0 {
            return Err(Error::Config("max_hands must be at least 1".to_string()));
        }
        for (name, value) in [
            ("min_detection_confidence", d.min_detection_confidence),
            ("min_tracking_confidence", d.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!("{name} must be in [0, 1], got {value}")));
            }
        }
        let margin = self.classifier.vertical_margin;
        if !margin.is_finite() || margin < 0.0 {
            return Err(Error::Config(format!(
                "vertical_margin must be a non-negative number, got {margin}"
            )));
        }
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}
