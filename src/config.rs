use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::integration::DetectionFilter;
use crate::tracker::TrackerConfig;

/// Application configuration for a full tracking run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tracker: TrackerConfig,
    pub filter: DetectionFilter,
    /// Physical size of one reference grid square (centimetres)
    pub grid_square_size: f32,
    /// Frame rate of the source video
    pub fps: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            filter: DetectionFilter::default(),
            grid_square_size: 10.0,
            fps: 30.0,
        }
    }
}

impl Config {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let cfg: Config = serde_json::from_str(&data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.tracker.validate()?;
        if !(self.grid_square_size.is_finite() && self.grid_square_size > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "grid_square_size must be positive, got {}",
                self.grid_square_size
            )));
        }
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "fps must be positive, got {}",
                self.fps
            )));
        }
        Ok(())
    }
}
