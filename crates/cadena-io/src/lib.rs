//! Audio I/O layer for cadena.
//!
//! This crate provides:
//!
//! - **WAV sources**: [`WavLoader`] decodes a file into a
//!   [`SourceBuffer`](cadena_core::SourceBuffer), keeping every channel
//! - **WAV output**: [`WavSink`] receives rendered chunks and discards the
//!   partial file when a render is aborted
//! - **Offline engine**: [`OfflineEngine`] walks the chain's routing in
//!   process and renders it chunk by chunk, with pluggable
//!   [`NodeProcessor`]s per effect node
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cadena_core::{CancelToken, Chain, EffectKind, EffectType, RenderOptions};
//! use cadena_io::{OfflineEngine, WavLoader, WavSink};
//!
//! let mut chain = Chain::new(Box::new(OfflineEngine::new()));
//! chain.load_file("input.wav".as_ref(), &WavLoader).unwrap();
//! chain.insert_effect(0, EffectKind::new(EffectType::Delay)).unwrap();
//!
//! let format = chain.format().unwrap();
//! let mut sink = WavSink::create("input-processed.wav", format).unwrap();
//! chain
//!     .render(&mut sink, &RenderOptions::default(), &CancelToken::new(), &mut |_| {})
//!     .unwrap();
//! ```

mod engine;
mod sink;
mod wav;

pub use engine::{NodeProcessor, OfflineEngine, Passthrough, ProcessorFactory, passthrough};
pub use sink::WavSink;
pub use wav::{WavLoader, WavSpec, read_wav, write_wav};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// The file's sample layout cannot be used as a source.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// The sink was written to after it was finished or aborted.
    #[error("WAV output already closed: {0}")]
    Closed(std::path::PathBuf),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
