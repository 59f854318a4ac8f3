//! Effect-chain editing model for cadena.
//!
//! A [`Chain`] is an ordered, fixed-capacity sequence of six [`EffectSlot`]s
//! applied to one audio source. Each slot is empty or holds one effect
//! ([`EffectKind`]: reverb, distortion, delay or equalizer) with its
//! parameters and a bypass flag.
//!
//! The chain does no signal processing itself. After every structural edit
//! it recomputes a linear [`Routing`] (source → active effects in slot order
//! → output) and hands it to its [`AudioEngine`], which owns playback and
//! offline rendering.
//!
//! # Features
//!
//! - **Slot editing**: insert, clear, reorder, bypass, parameter edits with
//!   range clamping
//! - **Routing rebuild**: full recompute after each change, bypass-aware
//! - **Transport**: play / pause with loop or interrupt playback
//! - **Offline render**: chunked, cancellable, on the caller's thread or a
//!   worker ([`RenderTask`])
//! - **Debounce**: [`Debouncer`] for coalescing saves
//!
//! The `testing` feature adds a recording engine for exercising chains
//! without audio.
//!
//! # Example
//!
//! ```rust
//! use cadena_core::{Chain, EffectKind, EffectType, testing::RecordingEngine};
//!
//! let (engine, _probe) = RecordingEngine::new();
//! let mut chain = Chain::new(Box::new(engine));
//!
//! let reverb = chain.insert_effect(0, EffectKind::new(EffectType::Reverb)).unwrap();
//! chain.insert_effect(1, EffectKind::new(EffectType::Delay)).unwrap();
//! assert_eq!(chain.routing().effect_types(), [EffectType::Reverb, EffectType::Delay]);
//!
//! chain.toggle_bypass(reverb);
//! assert_eq!(chain.routing().effect_types(), [EffectType::Delay]);
//! ```

mod chain;
mod debounce;
mod effect;
mod engine;
mod error;
mod id;
mod render;
mod routing;
mod slot;
mod transport;

pub use chain::{Chain, ChainParts, DEFAULT_CHAIN_NAME, DEFAULT_NYQUIST, SLOT_COUNT};
pub use debounce::{DEFAULT_DEBOUNCE, Debouncer};
pub use effect::{
    DelayParams, DistortionParams, DistortionPreset, EffectKind, EffectType, EqBand,
    EqFilterType, EqualizerParams, Param, ReverbParams, ReverbPreset,
};
pub use engine::{AudioEngine, AudioFormat, RenderStatus, SourceBuffer, SourceLoader};
#[cfg(any(test, feature = "testing"))]
pub use engine::testing;
pub use error::{ChainError, EngineError, LoadError, RenderError};
pub use id::{ChainId, SlotId};
pub use render::{
    CancelToken, DEFAULT_BLOCK_SIZE, DEFAULT_MAX_STALLS, RenderOptions, RenderOutcome,
    RenderProgress, RenderSink, RenderSummary, RenderTask,
};
pub use routing::{Endpoint, RouteNode, Routing};
pub use slot::EffectSlot;
pub use transport::{PlaybackMode, TransportState};
