use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{volume::clamp_unit, Result};

/// Candidate file suffixes probed for every base name, first match wins.
pub const DEFAULT_EXTENSIONS: [&str; 5] = [".mp3", ".wav", ".m4a", ".aac", ".ogg"];

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let mut config: AppConfig = serde_json::from_str(raw)?;
        config.audio.normalize();
        Ok(config)
    }
}

/// Configuration specific to the audio subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Directory the `/audio/...` resource namespace is rooted at.
    pub asset_root: PathBuf,
    pub extensions: Vec<String>,
    pub bgm_volume: f32,
    pub sfx_volume: f32,
    pub enabled: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            bgm_volume: 0.35,
            sfx_volume: 0.70,
            enabled: true,
        }
    }
}

impl AudioConfig {
    /// Saturates gains into `[0, 1]` and drops empty extension entries.
    pub fn normalize(&mut self) {
        self.bgm_volume = clamp_unit(self.bgm_volume);
        self.sfx_volume = clamp_unit(self.sfx_volume);
        self.extensions.retain(|ext| !ext.trim().is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_keeps_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.audio.extensions.len(), DEFAULT_EXTENSIONS.len());
        assert_eq!(config.audio.extensions[0], ".mp3");
        assert!(config.audio.enabled);
        assert!((config.audio.bgm_volume - 0.35).abs() < f32::EPSILON);
    }

    #[test]
    fn loaded_volumes_are_clamped() {
        let config =
            AppConfig::from_json(r#"{ "audio": { "bgm_volume": 3.5, "sfx_volume": -2 } }"#)
                .unwrap();
        assert_eq!(config.audio.bgm_volume, 1.0);
        assert_eq!(config.audio.sfx_volume, 0.0);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = AppConfig::from_json("{ audio: ").unwrap_err();
        assert!(format!("{err}").contains("invalid configuration"));
    }
}
