//! Offline rendering of a chain's source through its current routing.
//!
//! [`Chain::render`] runs synchronously: it stops playback, switches the
//! engine to offline mode, pulls chunks of at most `block_size` frames until
//! the whole source has been rendered, and hands each chunk to a
//! [`RenderSink`]. The engine is returned to interactive mode afterwards,
//! whether the render succeeded or not.
//!
//! [`RenderTask`] runs the same loop on a worker thread. The task owns the
//! chain while rendering and gives it back from [`RenderTask::join`].
//! Dropping a task cancels it; a cancelled or failed render aborts its sink,
//! which discards the partial output.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;

use crate::chain::Chain;
use crate::engine::{AudioEngine, RenderStatus, SourceBuffer};
use crate::error::{LoadError, RenderError};
use crate::transport::PlaybackMode;

/// Default maximum frames per offline chunk.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Default number of consecutive non-progress chunks tolerated.
pub const DEFAULT_MAX_STALLS: usize = 64;

/// Shared cancellation flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates an untriggered token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Destination for rendered audio.
pub trait RenderSink: Send {
    /// Appends interleaved samples.
    fn write(&mut self, samples: &[f32]) -> Result<(), LoadError>;

    /// Completes the output and returns where it was written.
    fn finish(&mut self) -> Result<PathBuf, LoadError>;

    /// Discards the partial output.
    fn abort(&mut self);
}

/// Offline render settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Maximum frames per chunk.
    pub block_size: usize,
    /// Consecutive chunks without audio before giving up.
    pub max_stalls: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            max_stalls: DEFAULT_MAX_STALLS,
        }
    }
}

/// How far a render has come.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct RenderProgress {
    /// Frames rendered so far.
    pub frames_rendered: u64,
    /// Frames in the source.
    pub total_frames: u64,
}

impl RenderProgress {
    /// Completed fraction, 0..=1.
    pub fn fraction(&self) -> f64 {
        if self.total_frames == 0 {
            return 1.0;
        }
        self.frames_rendered as f64 / self.total_frames as f64
    }
}

/// A completed render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderSummary {
    /// Where the output was written.
    pub path: PathBuf,
    /// Frames written.
    pub frames: u64,
}

impl Chain {
    /// Renders the whole source through the current routing into `sink`.
    ///
    /// Playback is stopped first and the transport stays stopped. On any
    /// failure, including cancellation, the sink is aborted.
    pub fn render(
        &mut self,
        sink: &mut dyn RenderSink,
        options: &RenderOptions,
        cancel: &CancelToken,
        progress: &mut dyn FnMut(RenderProgress),
    ) -> Result<RenderSummary, RenderError> {
        self.pause();
        let Some(source) = self.source().cloned() else {
            sink.abort();
            return Err(RenderError::NoSource);
        };

        tracing::info!(
            "chain {}: rendering {} ({} frames)",
            self.id(),
            source.path().display(),
            source.frames()
        );

        let engine = self.engine_mut();
        let rendered = run_offline(engine, &source, sink, options, cancel, progress);
        engine.stop();
        engine.disable_offline_rendering();

        match rendered.and_then(|frames| {
            let path = sink.finish().map_err(RenderError::Sink)?;
            Ok(RenderSummary { path, frames })
        }) {
            Ok(summary) => {
                tracing::info!(
                    "chain {}: rendered {} frames to {}",
                    self.id(),
                    summary.frames,
                    summary.path.display()
                );
                Ok(summary)
            }
            Err(err) => {
                tracing::warn!("chain {}: render failed: {err}", self.id());
                sink.abort();
                Err(err)
            }
        }
    }
}

fn run_offline(
    engine: &mut dyn AudioEngine,
    source: &SourceBuffer,
    sink: &mut dyn RenderSink,
    options: &RenderOptions,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(RenderProgress),
) -> Result<u64, RenderError> {
    let block_size = options.block_size.max(1);
    let total_frames = source.frames();

    engine.schedule_source(source, PlaybackMode::Interrupt);
    engine.enable_offline_rendering(source.format(), block_size)?;
    engine.start()?;

    let mut buffer = Vec::with_capacity(block_size * usize::from(source.format().channels));
    let mut rendered = 0u64;
    let mut stalls = 0usize;

    while rendered < total_frames {
        if cancel.is_cancelled() {
            return Err(RenderError::Cancelled);
        }
        let frames = (total_frames - rendered).min(block_size as u64) as usize;
        match engine.render_next_chunk(frames, &mut buffer)? {
            RenderStatus::Success => {
                sink.write(&buffer).map_err(RenderError::Sink)?;
                rendered += frames as u64;
                stalls = 0;
                progress(RenderProgress {
                    frames_rendered: rendered,
                    total_frames,
                });
            }
            RenderStatus::InsufficientData | RenderStatus::CannotDoInCurrentContext => {
                stalls += 1;
                if stalls >= options.max_stalls.max(1) {
                    return Err(RenderError::Stalled { attempts: stalls });
                }
            }
        }
    }
    Ok(rendered)
}

type WorkerResult = (Chain, Result<RenderSummary, RenderError>);

/// A completed [`RenderTask`]: the chain handed back plus the render result.
#[derive(Debug)]
pub struct RenderOutcome {
    /// The chain that was rendered.
    pub chain: Chain,
    /// What the render produced.
    pub result: Result<RenderSummary, RenderError>,
}

/// A render running on a worker thread.
#[derive(Debug)]
pub struct RenderTask {
    cancel: CancelToken,
    frames_rendered: Arc<AtomicU64>,
    total_frames: u64,
    handle: Option<JoinHandle<WorkerResult>>,
}

impl RenderTask {
    /// Moves `chain` and `sink` to a worker thread and starts rendering.
    pub fn spawn<S>(mut chain: Chain, mut sink: S, options: RenderOptions) -> Result<Self, RenderError>
    where
        S: RenderSink + 'static,
    {
        let cancel = CancelToken::new();
        let frames_rendered = Arc::new(AtomicU64::new(0));
        let total_frames = chain.source().map_or(0, SourceBuffer::frames);

        let worker_cancel = cancel.clone();
        let worker_frames = Arc::clone(&frames_rendered);
        let handle = std::thread::Builder::new()
            .name("cadena-render".into())
            .spawn(move || {
                let result = chain.render(&mut sink, &options, &worker_cancel, &mut |p| {
                    worker_frames.store(p.frames_rendered, Ordering::Relaxed);
                });
                (chain, result)
            })
            .map_err(RenderError::Spawn)?;

        Ok(Self {
            cancel,
            frames_rendered,
            total_frames,
            handle: Some(handle),
        })
    }

    /// Requests cancellation. The worker stops before its next chunk.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A handle that cancels this task.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Current progress.
    pub fn progress(&self) -> RenderProgress {
        RenderProgress {
            frames_rendered: self.frames_rendered.load(Ordering::Relaxed),
            total_frames: self.total_frames,
        }
    }

    /// Returns `true` once the worker has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Waits for the worker and returns the chain with the render result.
    pub fn join(mut self) -> Result<RenderOutcome, RenderError> {
        let handle = self.handle.take().ok_or(RenderError::WorkerPanicked)?;
        let (chain, result) = handle.join().map_err(|_| RenderError::WorkerPanicked)?;
        Ok(RenderOutcome { chain, result })
    }
}

impl Drop for RenderTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.cancel.cancel();
            if handle.join().is_err() {
                tracing::warn!("render worker panicked during teardown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{EffectKind, EffectType};
    use crate::engine::testing::{EngineBehavior, EngineProbe, RecordingEngine};
    use crate::engine::{AudioFormat, SourceLoader};
    use crate::transport::TransportState;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemorySink {
        samples: Vec<f32>,
        finished: bool,
        aborted: bool,
        fail_writes: bool,
    }

    impl RenderSink for MemorySink {
        fn write(&mut self, samples: &[f32]) -> Result<(), LoadError> {
            if self.fail_writes {
                return Err("disk full".into());
            }
            self.samples.extend_from_slice(samples);
            Ok(())
        }

        fn finish(&mut self) -> Result<PathBuf, LoadError> {
            self.finished = true;
            Ok(PathBuf::from("memory"))
        }

        fn abort(&mut self) {
            self.aborted = true;
        }
    }

    struct SharedSink(Arc<Mutex<MemorySink>>);

    impl RenderSink for SharedSink {
        fn write(&mut self, samples: &[f32]) -> Result<(), LoadError> {
            std::thread::sleep(std::time::Duration::from_millis(1));
            self.0.lock().unwrap().write(samples)
        }

        fn finish(&mut self) -> Result<PathBuf, LoadError> {
            self.0.lock().unwrap().finish()
        }

        fn abort(&mut self) {
            self.0.lock().unwrap().abort();
        }
    }

    struct Ramp(usize);

    impl SourceLoader for Ramp {
        fn load(&self, path: &Path) -> Result<SourceBuffer, LoadError> {
            let format = AudioFormat {
                sample_rate: 8000,
                channels: 2,
            };
            let samples = (0..self.0 * 2).map(|i| i as f32).collect();
            Ok(SourceBuffer::new(path, format, samples))
        }
    }

    fn loaded_chain(frames: usize, behavior: EngineBehavior) -> (Chain, EngineProbe) {
        let (engine, probe) = RecordingEngine::with_behavior(behavior);
        let mut chain = Chain::new(Box::new(engine));
        chain.load_file(Path::new("ramp.wav"), &Ramp(frames)).unwrap();
        (chain, probe)
    }

    #[test]
    fn renders_whole_source_in_blocks() {
        let (mut chain, probe) = loaded_chain(10_000, EngineBehavior::default());
        chain.insert_effect(0, EffectKind::new(EffectType::Delay)).unwrap();
        let mut sink = MemorySink::default();
        let mut reports = Vec::new();

        let summary = chain
            .render(&mut sink, &RenderOptions::default(), &CancelToken::new(), &mut |p| {
                reports.push(p.frames_rendered);
            })
            .unwrap();

        assert_eq!(summary.frames, 10_000);
        assert_eq!(sink.samples.len(), 20_000);
        assert_eq!(sink.samples[19_999], 19_999.0);
        assert!(sink.finished && !sink.aborted);
        assert_eq!(reports, vec![4096, 8192, 10_000]);

        let log = probe.log();
        assert!(log.offline.is_none());
        assert!(!log.running);
        drop(log);
        assert_eq!(chain.transport(), TransportState::Stopped);
    }

    #[test]
    fn render_without_source_fails() {
        let (engine, _probe) = RecordingEngine::new();
        let mut chain = Chain::new(Box::new(engine));
        let mut sink = MemorySink::default();
        let err = chain
            .render(&mut sink, &RenderOptions::default(), &CancelToken::new(), &mut |_| {})
            .unwrap_err();
        assert!(matches!(err, RenderError::NoSource));
        assert_eq!(chain.transport(), TransportState::Stopped);
    }

    #[test]
    fn render_stops_live_playback() {
        let (mut chain, _probe) = loaded_chain(100, EngineBehavior::default());
        chain.play().unwrap();
        let mut sink = MemorySink::default();
        chain
            .render(&mut sink, &RenderOptions::default(), &CancelToken::new(), &mut |_| {})
            .unwrap();
        assert!(!chain.is_playing());
    }

    #[test]
    fn offline_failure_aborts_sink() {
        let behavior = EngineBehavior {
            fail_offline: true,
            ..EngineBehavior::default()
        };
        let (mut chain, _probe) = loaded_chain(100, behavior);
        let mut sink = MemorySink::default();
        let err = chain
            .render(&mut sink, &RenderOptions::default(), &CancelToken::new(), &mut |_| {})
            .unwrap_err();
        assert!(matches!(err, RenderError::Engine(_)));
        assert!(sink.aborted);
    }

    #[test]
    fn stalled_engine_gives_up() {
        let behavior = EngineBehavior {
            stall: true,
            ..EngineBehavior::default()
        };
        let (mut chain, _probe) = loaded_chain(100, behavior);
        let mut sink = MemorySink::default();
        let options = RenderOptions {
            max_stalls: 5,
            ..RenderOptions::default()
        };
        let err = chain
            .render(&mut sink, &options, &CancelToken::new(), &mut |_| {})
            .unwrap_err();
        assert!(matches!(err, RenderError::Stalled { attempts: 5 }));
        assert!(sink.aborted);
    }

    #[test]
    fn sink_failure_is_reported() {
        let (mut chain, _probe) = loaded_chain(100, EngineBehavior::default());
        let mut sink = MemorySink {
            fail_writes: true,
            ..MemorySink::default()
        };
        let err = chain
            .render(&mut sink, &RenderOptions::default(), &CancelToken::new(), &mut |_| {})
            .unwrap_err();
        assert!(matches!(err, RenderError::Sink(_)));
        assert!(sink.aborted);
    }

    #[test]
    fn pre_cancelled_render_writes_nothing() {
        let (mut chain, _probe) = loaded_chain(100, EngineBehavior::default());
        let mut sink = MemorySink::default();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = chain
            .render(&mut sink, &RenderOptions::default(), &cancel, &mut |_| {})
            .unwrap_err();
        assert!(matches!(err, RenderError::Cancelled));
        assert!(sink.samples.is_empty());
        assert!(sink.aborted);
    }

    #[test]
    fn task_returns_chain_and_result() {
        let (chain, _probe) = loaded_chain(1000, EngineBehavior::default());
        let id = chain.id().clone();
        let shared = Arc::new(Mutex::new(MemorySink::default()));
        let task = RenderTask::spawn(chain, SharedSink(Arc::clone(&shared)), RenderOptions::default())
            .unwrap();
        let outcome = task.join().unwrap();
        assert_eq!(outcome.chain.id(), &id);
        assert_eq!(outcome.result.unwrap().frames, 1000);
        assert!(shared.lock().unwrap().finished);
    }

    #[test]
    fn dropping_task_cancels_and_aborts() {
        let (chain, _probe) = loaded_chain(4096 * 200, EngineBehavior::default());
        let shared = Arc::new(Mutex::new(MemorySink::default()));
        let task = RenderTask::spawn(chain, SharedSink(Arc::clone(&shared)), RenderOptions::default())
            .unwrap();
        drop(task);
        let sink = shared.lock().unwrap();
        assert!(sink.aborted);
        assert!(!sink.finished);
    }

    #[test]
    fn progress_fraction() {
        let p = RenderProgress {
            frames_rendered: 1,
            total_frames: 4,
        };
        assert_eq!(p.fraction(), 0.25);
        assert_eq!(RenderProgress::default().fraction(), 1.0);
    }
}
