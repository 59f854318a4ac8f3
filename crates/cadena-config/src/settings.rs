//! Application settings (TOML).
//!
//! ```toml
//! data_file = "/home/me/.local/share/cadena/SavedData.json"
//! autosave_debounce_ms = 500
//!
//! [render]
//! block_size = 4096
//! output_dir = "/home/me/.local/share/cadena/renders"
//! ```
//!
//! Every field is optional; missing ones take their defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cadena_core::{DEFAULT_BLOCK_SIZE, RenderOptions};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::paths;

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Location of the saved-chains blob.
    pub data_file: PathBuf,
    /// Quiescence interval before an edited chain is written.
    pub autosave_debounce_ms: u64,
    /// Offline render settings.
    pub render: RenderSettings,
}

/// Offline render settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Maximum frames per offline chunk.
    pub block_size: usize,
    /// Directory rendered files are written to.
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: paths::default_data_file(),
            autosave_debounce_ms: 500,
            render: RenderSettings::default(),
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            output_dir: paths::default_render_dir(),
        }
    }
}

impl Settings {
    /// Loads settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Loads settings from `path` if it exists, else returns defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            let settings = Self::load(path)?;
            tracing::debug!("loaded settings from {}", path.display());
            Ok(settings)
        } else {
            Ok(Self::default())
        }
    }

    /// Parses settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Converts the settings to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Saves the settings to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            paths::ensure_dir(parent)?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Autosave quiescence interval.
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    /// Render options derived from these settings.
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            block_size: self.render.block_size.max(1),
            ..RenderOptions::default()
        }
    }
}
