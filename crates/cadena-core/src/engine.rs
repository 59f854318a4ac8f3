//! The audio engine collaborator.
//!
//! A [`Chain`](crate::Chain) does no signal processing of its own. It owns an
//! [`AudioEngine`] and hands it a linear node ordering whenever the chain
//! changes; the engine performs playback, owns any real-time thread, and
//! renders offline on request.
//!
//! ```text
//! Chain ──attach/connect──▶ AudioEngine ──▶ output device / offline chunks
//!   ▲                              ▲
//!   └── SourceLoader ──SourceBuffer┘ (schedule_source)
//! ```
//!
//! [`testing::RecordingEngine`] is a deterministic implementation for tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::effect::{EffectKind, EffectType};
use crate::error::{EngineError, LoadError};
use crate::id::SlotId;
use crate::routing::Endpoint;
use crate::transport::PlaybackMode;

/// Sample format shared by source, graph connections and render output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioFormat {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
}

impl AudioFormat {
    /// Half the sample rate.
    pub fn nyquist(&self) -> f64 {
        f64::from(self.sample_rate) / 2.0
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
        }
    }
}

/// A fully decoded source file, interleaved f32 samples.
///
/// Cloning is cheap: the sample data is shared.
#[derive(Clone, Debug)]
pub struct SourceBuffer {
    path: PathBuf,
    format: AudioFormat,
    samples: Arc<[f32]>,
}

impl SourceBuffer {
    /// Wraps decoded samples.
    pub fn new(path: impl Into<PathBuf>, format: AudioFormat, samples: Vec<f32>) -> Self {
        Self {
            path: path.into(),
            format,
            samples: samples.into(),
        }
    }

    /// Where the source was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sample format.
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Interleaved samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of sample frames.
    pub fn frames(&self) -> u64 {
        let channels = usize::from(self.format.channels.max(1));
        (self.samples.len() / channels) as u64
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / f64::from(self.format.sample_rate.max(1))
    }
}

/// Decodes audio files into [`SourceBuffer`]s.
pub trait SourceLoader {
    /// Reads and decodes the file at `path`.
    fn load(&self, path: &Path) -> Result<SourceBuffer, LoadError>;
}

/// Result of one offline render call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderStatus {
    /// The requested frames were rendered into the output buffer.
    Success,
    /// The source did not provide enough data this time.
    InsufficientData,
    /// The engine cannot render right now; try again.
    CannotDoInCurrentContext,
}

/// Signal engine driven by a chain.
///
/// Connection calls are infallible: the chain only ever asks for a linear
/// path, which is always valid. Starting the engine and entering offline
/// mode may fail and are reported as [`EngineError`]s.
pub trait AudioEngine: Send {
    /// Makes an effect node available for connection.
    fn attach(&mut self, node: SlotId, effect: &EffectKind);

    /// Pushes changed parameters to an attached node.
    fn update(&mut self, node: SlotId, effect: &EffectKind);

    /// Removes every connection and detaches every effect node.
    fn disconnect_all(&mut self);

    /// Connects two endpoints. `format` is the source format when known.
    fn connect(&mut self, from: Endpoint, to: Endpoint, format: Option<AudioFormat>);

    /// Sets the source player's volume, 0..=1.
    fn set_player_volume(&mut self, volume: f32);

    /// Queues `source` on the player from its beginning.
    fn schedule_source(&mut self, source: &SourceBuffer, mode: PlaybackMode);

    /// Starts the engine and the player.
    fn start(&mut self) -> Result<(), EngineError>;

    /// Stops the player and the engine.
    fn stop(&mut self);

    /// Returns `true` while the player still has material to play.
    fn is_playing(&self) -> bool;

    /// Switches to offline rendering with chunks of at most `max_frames`.
    fn enable_offline_rendering(
        &mut self,
        format: AudioFormat,
        max_frames: usize,
    ) -> Result<(), EngineError>;

    /// Returns to interactive rendering.
    fn disable_offline_rendering(&mut self);

    /// Renders the next `frames` frames into `out` (cleared first, filled
    /// with interleaved samples on success).
    fn render_next_chunk(
        &mut self,
        frames: usize,
        out: &mut Vec<f32>,
    ) -> Result<RenderStatus, EngineError>;

    /// Whether a bypassed node of `effect` passes signal through unmodified.
    ///
    /// The platform engine keeps processing a bypassed reverb, so by default
    /// bypassed reverbs are removed from the routing instead.
    fn honors_bypass(&self, effect: EffectType) -> bool {
        effect != EffectType::Reverb
    }
}

#[cfg(any(test, feature = "testing"))]
pub mod testing {
    //! Deterministic engine for tests. Enabled by the `testing` feature.

    use std::collections::HashMap;
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    use super::{AudioEngine, AudioFormat, RenderStatus, SourceBuffer};
    use crate::effect::{EffectKind, EffectType};
    use crate::error::EngineError;
    use crate::id::SlotId;
    use crate::routing::Endpoint;
    use crate::transport::PlaybackMode;

    /// Everything a [`RecordingEngine`] has been told.
    #[derive(Debug, Default)]
    pub struct EngineLog {
        /// Currently attached nodes and their latest parameters.
        pub attached: HashMap<SlotId, EffectKind>,
        /// Current connections, in the order they were made.
        pub connections: Vec<(Endpoint, Endpoint)>,
        /// Number of `disconnect_all` calls (one per routing rebuild).
        pub rebuilds: usize,
        /// Number of `update` calls.
        pub updates: usize,
        /// Player volume.
        pub volume: f32,
        /// Whether the engine is running.
        pub running: bool,
        /// Scheduled source frames and mode.
        pub scheduled: Option<(u64, PlaybackMode)>,
        /// Offline rendering format, when enabled.
        pub offline: Option<(AudioFormat, usize)>,
        /// Frames handed out by `render_next_chunk`.
        pub rendered_frames: u64,
    }

    /// Behaviour switches for a [`RecordingEngine`].
    #[derive(Debug, Clone, Default)]
    pub struct EngineBehavior {
        /// Make `start` fail.
        pub fail_start: bool,
        /// Make `enable_offline_rendering` fail.
        pub fail_offline: bool,
        /// Report that bypassed reverbs are silenced.
        pub honors_reverb_bypass: bool,
        /// Never produce audio offline.
        pub stall: bool,
        /// Player finishes immediately after starting (non-looping only).
        pub finish_immediately: bool,
    }

    /// Shared view of a [`RecordingEngine`]'s log, usable after the engine
    /// has been moved into a chain.
    #[derive(Clone, Debug, Default)]
    pub struct EngineProbe {
        log: Arc<Mutex<EngineLog>>,
    }

    impl EngineProbe {
        /// Locks the log.
        pub fn log(&self) -> MutexGuard<'_, EngineLog> {
            self.log.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Current connections.
        pub fn connections(&self) -> Vec<(Endpoint, Endpoint)> {
            self.log().connections.clone()
        }
    }

    /// An engine that records graph calls and renders offline by passing
    /// the scheduled source through, scaled by the player volume.
    #[derive(Debug)]
    pub struct RecordingEngine {
        log: Arc<Mutex<EngineLog>>,
        behavior: EngineBehavior,
        source: Option<SourceBuffer>,
        mode: PlaybackMode,
        position: u64,
    }

    impl RecordingEngine {
        /// Creates an engine with default behaviour and its probe.
        pub fn new() -> (Self, EngineProbe) {
            Self::with_behavior(EngineBehavior::default())
        }

        /// Creates an engine with the given behaviour and its probe.
        pub fn with_behavior(behavior: EngineBehavior) -> (Self, EngineProbe) {
            let probe = EngineProbe::default();
            probe.log().volume = 1.0;
            let engine = Self {
                log: Arc::clone(&probe.log),
                behavior,
                source: None,
                mode: PlaybackMode::Loop,
                position: 0,
            };
            (engine, probe)
        }

        fn log(&self) -> MutexGuard<'_, EngineLog> {
            self.log.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl AudioEngine for RecordingEngine {
        fn attach(&mut self, node: SlotId, effect: &EffectKind) {
            self.log().attached.insert(node, effect.clone());
        }

        fn update(&mut self, node: SlotId, effect: &EffectKind) {
            let mut log = self.log();
            log.updates += 1;
            if let Some(slot) = log.attached.get_mut(&node) {
                *slot = effect.clone();
            }
        }

        fn disconnect_all(&mut self) {
            let mut log = self.log();
            log.attached.clear();
            log.connections.clear();
            log.rebuilds += 1;
        }

        fn connect(&mut self, from: Endpoint, to: Endpoint, _format: Option<AudioFormat>) {
            self.log().connections.push((from, to));
        }

        fn set_player_volume(&mut self, volume: f32) {
            self.log().volume = volume;
        }

        fn schedule_source(&mut self, source: &SourceBuffer, mode: PlaybackMode) {
            self.source = Some(source.clone());
            self.mode = mode;
            self.position = 0;
            self.log().scheduled = Some((source.frames(), mode));
        }

        fn start(&mut self) -> Result<(), EngineError> {
            if self.behavior.fail_start {
                return Err(EngineError::Start("start refused".into()));
            }
            self.log().running = true;
            Ok(())
        }

        fn stop(&mut self) {
            self.log().running = false;
        }

        fn is_playing(&self) -> bool {
            let running = self.log().running;
            running && !(self.behavior.finish_immediately && !self.mode.is_looping())
        }

        fn enable_offline_rendering(
            &mut self,
            format: AudioFormat,
            max_frames: usize,
        ) -> Result<(), EngineError> {
            if self.behavior.fail_offline {
                return Err(EngineError::OfflineRendering("offline refused".into()));
            }
            self.log().offline = Some((format, max_frames));
            Ok(())
        }

        fn disable_offline_rendering(&mut self) {
            self.log().offline = None;
        }

        fn render_next_chunk(
            &mut self,
            frames: usize,
            out: &mut Vec<f32>,
        ) -> Result<RenderStatus, EngineError> {
            out.clear();
            let (offline, running, volume) = {
                let log = self.log();
                (log.offline, log.running, log.volume)
            };
            let Some((_, max_frames)) = offline else {
                return Err(EngineError::NotOffline);
            };
            if !running {
                return Ok(RenderStatus::CannotDoInCurrentContext);
            }
            if self.behavior.stall {
                return Ok(RenderStatus::InsufficientData);
            }
            let Some(source) = &self.source else {
                return Ok(RenderStatus::InsufficientData);
            };

            let channels = usize::from(source.format().channels.max(1));
            let frames = frames.min(max_frames);
            let start = self.position as usize * channels;
            let end = (start + frames * channels).min(source.samples().len());
            out.extend(source.samples()[start.min(end)..end].iter().map(|s| s * volume));
            out.resize(frames * channels, 0.0);

            self.position += frames as u64;
            self.log().rendered_frames += frames as u64;
            Ok(RenderStatus::Success)
        }

        fn honors_bypass(&self, effect: EffectType) -> bool {
            effect != EffectType::Reverb || self.behavior.honors_reverb_bypass
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_buffer_frames_and_duration() {
        let format = AudioFormat {
            sample_rate: 4,
            channels: 2,
        };
        let source = SourceBuffer::new("a.wav", format, vec![0.0; 16]);
        assert_eq!(source.frames(), 8);
        assert!((source.duration_secs() - 2.0).abs() < 1e-9);
        assert_eq!(source.path(), Path::new("a.wav"));
    }

    #[test]
    fn nyquist_is_half_rate() {
        let format = AudioFormat {
            sample_rate: 48000,
            channels: 1,
        };
        assert_eq!(format.nyquist(), 24000.0);
    }

    #[test]
    fn default_engine_does_not_honor_reverb_bypass() {
        let (engine, _probe) = testing::RecordingEngine::new();
        assert!(!engine.honors_bypass(EffectType::Reverb));
        assert!(engine.honors_bypass(EffectType::Delay));
    }

    #[test]
    fn recording_engine_renders_scaled_source() {
        let (mut engine, _probe) = testing::RecordingEngine::new();
        let format = AudioFormat {
            sample_rate: 8000,
            channels: 1,
        };
        let source = SourceBuffer::new("s.wav", format, vec![1.0, 1.0, 1.0]);
        engine.set_player_volume(0.5);
        engine.schedule_source(&source, PlaybackMode::Interrupt);
        engine.enable_offline_rendering(format, 2).unwrap();
        engine.start().unwrap();

        let mut out = Vec::new();
        assert_eq!(engine.render_next_chunk(2, &mut out).unwrap(), RenderStatus::Success);
        assert_eq!(out, vec![0.5, 0.5]);
        assert_eq!(engine.render_next_chunk(2, &mut out).unwrap(), RenderStatus::Success);
        assert_eq!(out, vec![0.5, 0.0]);
    }

    #[test]
    fn render_outside_offline_mode_is_an_error() {
        let (mut engine, _probe) = testing::RecordingEngine::new();
        let mut out = Vec::new();
        assert!(matches!(
            engine.render_next_chunk(16, &mut out),
            Err(EngineError::NotOffline)
        ));
    }
}
