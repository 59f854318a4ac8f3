//! Platform-specific paths for saved chains, settings and renders.
//!
//! # Directory Structure
//!
//! - **Config**: `~/.config/cadena/` (Linux), `~/Library/Application Support/cadena/` (macOS), `%APPDATA%\cadena\` (Windows)
//! - **Data**: `~/.local/share/cadena/` (Linux), `~/Library/Application Support/cadena/` (macOS), `%APPDATA%\cadena\` (Windows)
//!
//! The saved-chains blob lives in the data directory as `SavedData.json`;
//! rendered files go to `renders/` beneath it.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::repository::SAVE_KEY;

/// Application name used for directory paths.
const APP_NAME: &str = "cadena";

/// Settings file name inside the config directory.
const SETTINGS_FILE: &str = "settings.toml";

/// Subdirectory for rendered output.
const RENDERS_SUBDIR: &str = "renders";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the user-specific data directory.
///
/// Returns a fallback path if the data directory cannot be determined.
pub fn user_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default location of the settings file.
pub fn settings_path() -> PathBuf {
    user_config_dir().join(SETTINGS_FILE)
}

/// Default location of the saved-chains blob.
pub fn default_data_file() -> PathBuf {
    user_data_dir().join(format!("{SAVE_KEY}.json"))
}

/// Default directory for rendered files.
pub fn default_render_dir() -> PathBuf {
    user_data_dir().join(RENDERS_SUBDIR)
}

/// Creates `dir` (and parents) if it does not exist.
pub fn ensure_dir(dir: &Path) -> Result<(), ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::create_dir(dir, e))?;
    }
    Ok(())
}

/// Output file for rendering `source`: `<stem>-processed.wav` in `dir`.
pub fn render_output_path(dir: &Path, source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "render".to_string());
    dir.join(format!("{stem}-processed.wav"))
}
