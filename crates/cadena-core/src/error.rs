//! Error types for chain, engine and render operations.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by a [`SourceLoader`](crate::SourceLoader).
pub type LoadError = Box<dyn std::error::Error + Send + Sync>;

/// Failures reported by an [`AudioEngine`](crate::AudioEngine).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be started.
    #[error("failed to start audio engine: {0}")]
    Start(String),

    /// Offline (manual) rendering could not be enabled.
    #[error("failed to enable offline rendering: {0}")]
    OfflineRendering(String),

    /// An offline-only call was made while rendering interactively.
    #[error("engine is not in offline rendering mode")]
    NotOffline,

    /// The engine reported a rendering failure.
    #[error("render failed: {0}")]
    Render(String),
}

/// Errors from [`Chain`](crate::Chain) operations.
///
/// Mutations never fail for invariants the chain maintains itself; only
/// caller mistakes, source loading and the engine can produce these.
#[derive(Debug, Error)]
pub enum ChainError {
    /// A slot index outside `0..SLOT_COUNT`.
    #[error("slot index {index} out of range (chain has {len} slots)")]
    SlotOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of slots in the chain.
        len: usize,
    },

    /// Playback or render requested with no source loaded.
    #[error("no source file loaded")]
    NoSource,

    /// The source file could not be loaded.
    #[error("failed to load source '{path}': {source}")]
    SourceLoad {
        /// Path of the source file.
        path: PathBuf,
        /// Underlying loader error.
        #[source]
        source: LoadError,
    },

    /// The engine failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Errors from an offline render.
#[derive(Debug, Error)]
pub enum RenderError {
    /// No source is loaded, so there is nothing to render.
    #[error("no source file loaded")]
    NoSource,

    /// The engine failed to enter offline mode, start, or render a chunk.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The render sink failed.
    #[error("failed to write render output: {0}")]
    Sink(#[source] LoadError),

    /// The render was cancelled before completion.
    #[error("render cancelled")]
    Cancelled,

    /// The engine stopped producing audio.
    #[error("render stalled after {attempts} attempts without progress")]
    Stalled {
        /// Consecutive attempts that produced no audio.
        attempts: usize,
    },

    /// The render worker thread could not be spawned.
    #[error("failed to spawn render worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// The render worker thread panicked.
    #[error("render worker panicked")]
    WorkerPanicked,
}

impl RenderError {
    /// Wraps a sink error.
    pub fn sink(err: impl Into<LoadError>) -> Self {
        RenderError::Sink(err.into())
    }
}
