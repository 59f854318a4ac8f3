//! Error types for persistence and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading or storing chains and settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The saved blob is not valid JSON of the expected shape
    #[error("failed to parse saved chains: {0}")]
    Json(#[from] serde_json::Error),

    /// The saved blob is JSON but not a list of chains
    #[error("saved chains are not a JSON array")]
    NotAChainList,

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Another chain already has this name
    #[error("a chain named '{0}' already exists")]
    DuplicateName(String),

    /// No chain matches the given id or name
    #[error("chain not found: {0}")]
    ChainNotFound(String),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for errors caused by malformed stored data rather than
    /// by the filesystem.
    pub fn is_corrupt_data(&self) -> bool {
        matches!(
            self,
            ConfigError::Json(_) | ConfigError::NotAChainList | ConfigError::TomlParse(_)
        )
    }
}
