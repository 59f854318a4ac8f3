//! Storage for the saved-chains blob.
//!
//! The whole collection lives in one opaque blob (a JSON array of
//! [`ChainRecord`]s). A [`Repository`] only reads and writes that blob;
//! record-level operations are provided on top.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::record::{self, ChainRecord};

/// Key under which the blob is stored; also the default file stem.
pub const SAVE_KEY: &str = "SavedData";

/// A store holding the saved-chains blob.
pub trait Repository {
    /// Reads the blob. `Ok(None)` when nothing has been stored yet.
    fn load_blob(&self) -> Result<Option<Vec<u8>>, ConfigError>;

    /// Replaces the blob.
    fn store_blob(&mut self, blob: &[u8]) -> Result<(), ConfigError>;

    /// Moves the current blob aside, keeping it, so that a new one can be
    /// stored without destroying it.
    fn set_aside_blob(&mut self) -> Result<(), ConfigError>;

    /// Reads and parses every stored record. Malformed records are repaired
    /// or skipped; see [`parse_records`](crate::parse_records).
    fn load_records(&self) -> Result<Option<Vec<ChainRecord>>, ConfigError> {
        match self.load_blob()? {
            Some(blob) => Ok(Some(record::parse_records(&blob)?)),
            None => Ok(None),
        }
    }

    /// Serializes and stores `records`, replacing the whole collection.
    fn store_records(&mut self, records: &[ChainRecord]) -> Result<(), ConfigError> {
        let blob = serde_json::to_vec_pretty(records)?;
        self.store_blob(&blob)
    }

    /// Replaces the stored record with the same id.
    ///
    /// Returns `false` and writes nothing when no stored record has that id
    /// (or nothing is stored at all): a chain must be part of the saved
    /// collection before it can be saved on its own.
    fn update(&mut self, record: &ChainRecord) -> Result<bool, ConfigError> {
        let Some(mut records) = self.load_records()? else {
            return Ok(false);
        };
        let Some(slot) = records.iter_mut().find(|r| r.id == record.id) else {
            tracing::debug!("chain {} not in saved collection, skipping save", record.id);
            return Ok(false);
        };
        *slot = record.clone();
        self.store_records(&records)?;
        Ok(true)
    }
}

/// Stores the blob in a JSON file.
#[derive(Debug, Clone)]
pub struct FileRepository {
    path: PathBuf,
}

impl FileRepository {
    /// Uses the file at `path`. Nothing is touched until the first access.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The blob's file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unreadable blob is moved: the blob's file name with
    /// `.unreadable` appended.
    pub fn set_aside_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".unreadable");
        self.path.with_file_name(name)
    }
}

impl Repository for FileRepository {
    fn load_blob(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        match std::fs::read(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConfigError::read_file(&self.path, e)),
        }
    }

    fn store_blob(&mut self, blob: &[u8]) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
        std::fs::write(&self.path, blob).map_err(|e| ConfigError::write_file(&self.path, e))?;
        tracing::debug!("stored {} bytes to {}", blob.len(), self.path.display());
        Ok(())
    }

    fn set_aside_blob(&mut self) -> Result<(), ConfigError> {
        let target = self.set_aside_path();
        match std::fs::rename(&self.path, &target) {
            Ok(()) => {
                tracing::warn!("kept unreadable saved chains as {}", target.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ConfigError::write_file(target, e)),
        }
    }
}

/// Keeps the blob in memory and counts writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    blob: Option<Vec<u8>>,
    set_aside: Option<Vec<u8>>,
    writes: usize,
}

impl MemoryRepository {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with `blob`.
    pub fn with_blob(blob: impl Into<Vec<u8>>) -> Self {
        Self {
            blob: Some(blob.into()),
            ..Self::default()
        }
    }

    /// The current blob.
    pub fn blob(&self) -> Option<&[u8]> {
        self.blob.as_deref()
    }

    /// The blob last moved aside by `set_aside_blob`.
    pub fn set_aside(&self) -> Option<&[u8]> {
        self.set_aside.as_deref()
    }

    /// Number of `store_blob` calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl Repository for MemoryRepository {
    fn load_blob(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        Ok(self.blob.clone())
    }

    fn store_blob(&mut self, blob: &[u8]) -> Result<(), ConfigError> {
        self.blob = Some(blob.to_vec());
        self.writes += 1;
        Ok(())
    }

    fn set_aside_blob(&mut self) -> Result<(), ConfigError> {
        if let Some(blob) = self.blob.take() {
            self.set_aside = Some(blob);
        }
        Ok(())
    }
}
