/// Application settings
///
/// Stored as JSON in the user's config directory:
/// - Linux: ~/.config/lens-finder/settings.json
/// - macOS: ~/Library/Application Support/lens-finder/settings.json
/// - Windows: %APPDATA%\lens-finder\settings.json
///
/// Every field has a default, so a partial file is fine and a missing file
/// means "all defaults".

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::catalog::{AspectRatioChoice, CameraProfile, LensChoice};
use crate::camera::still::RigSettings;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine a config directory")]
    NoConfigDir,

    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Lens selected at startup, in mm
    pub default_lens_mm: f64,
    /// Crop factor selected at startup
    pub default_crop_factor: f64,
    pub default_aspect: AspectRatioChoice,
    /// Camera bodies offered in the crop factor list
    pub profiles: Vec<CameraProfile>,
    /// Devices of the desktop still rig
    pub rig: RigSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_lens_mm: LensChoice::default().mm(),
            default_crop_factor: 1.0,
            default_aspect: AspectRatioChoice::default(),
            profiles: CameraProfile::builtin(),
            rig: RigSettings::default(),
        }
    }
}

impl Settings {
    /// Get the path where the settings file lives
    pub fn path() -> Result<PathBuf, SettingsError> {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or(SettingsError::NoConfigDir)?;

        path.push("lens-finder");
        path.push("settings.json");
        Ok(path)
    }

    /// Load settings from the config directory
    ///
    /// A missing file is written out with defaults so it can be edited.
    pub fn load() -> Result<Self, SettingsError> {
        let path = Self::path()?;
        if !path.exists() {
            let settings = Self::default();
            settings.save_to(&path)?;
            tracing::info!(path = %path.display(), "📝 Wrote default settings");
            return Ok(settings);
        }
        Self::load_from(&path)
    }

    /// Load settings, falling back to defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|err| {
            tracing::warn!(%err, "⚠️  Using default settings");
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
