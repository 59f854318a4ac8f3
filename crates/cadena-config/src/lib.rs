//! Persistence and configuration for cadena.
//!
//! # Features
//!
//! - **Codec**: chains to and from the stored record format (string-valued
//!   bank maps, `file://` source URLs), recovering from malformed values
//! - **Repository**: the single saved-chains blob, file- or memory-backed
//! - **Collection**: the user's chains, default naming, first-run examples
//! - **Autosave**: debounced per-chain writes
//! - **Settings**: TOML settings and platform paths
//!
//! # Example
//!
//! ```rust,no_run
//! use cadena_config::{ChainCollection, FileRepository, Settings, paths};
//! # use cadena_core::{AudioEngine, LoadError, SourceBuffer, SourceLoader, testing::RecordingEngine};
//! # struct Loader;
//! # impl SourceLoader for Loader {
//! #     fn load(&self, _: &std::path::Path) -> Result<SourceBuffer, LoadError> { Err("none".into()) }
//! # }
//!
//! let settings = Settings::load_or_default(paths::settings_path()).unwrap();
//! let repo = FileRepository::new(&settings.data_file);
//! let factory = Box::new(|| Box::new(RecordingEngine::new().0) as Box<dyn AudioEngine>);
//! let mut chains = ChainCollection::load_all(repo, factory, Box::new(Loader)).unwrap();
//! chains.add_blank().unwrap();
//! ```

mod autosave;
mod collection;
mod error;
mod record;

/// Mapping between chains and stored records.
pub mod codec;

/// Bundled example chains.
pub mod example_chains;

/// Platform-specific paths.
pub mod paths;

/// Blob storage.
pub mod repository;

/// TOML settings.
pub mod settings;

pub use autosave::AutoSave;
pub use collection::{ChainCollection, EngineFactory, NAME_PREFIX};
pub use error::ConfigError;
pub use example_chains::{EXAMPLE_CHAIN_COUNT, example_records};
pub use record::{BankMap, ChainRecord, parse_records};
pub use repository::{FileRepository, MemoryRepository, Repository, SAVE_KEY};
pub use settings::{RenderSettings, Settings};
