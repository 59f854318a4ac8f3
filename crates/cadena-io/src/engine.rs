//! In-process engine that renders a chain's routing offline.
//!
//! [`OfflineEngine`] keeps the nodes the chain attaches and the connections
//! it makes, and on each [`render_next_chunk`](AudioEngine::render_next_chunk)
//! walks them from the source to the output: the player reads the next
//! frames (looping or padding with silence), applies the player volume, then
//! every node on the path processes the block in place.
//!
//! What a node does to the signal is decided by a [`ProcessorFactory`].
//! The default factory passes audio through unchanged. A bypassed node is
//! skipped without calling its processor, for every effect type, so this
//! engine honours reverb bypass and bypassed reverbs stay routed.
//!
//! There is no output device. Starting the engine outside offline mode only
//! marks it running.

use std::collections::HashMap;

use cadena_core::{
    AudioEngine, AudioFormat, EffectKind, EffectType, EngineError, Endpoint, PlaybackMode,
    RenderStatus, SlotId, SourceBuffer,
};

/// Signal processing for one effect node.
pub trait NodeProcessor: Send {
    /// Processes `block` (interleaved, `format.channels` per frame) in place.
    fn process(&mut self, block: &mut [f32], format: AudioFormat);

    /// Applies changed parameters.
    fn update(&mut self, effect: &EffectKind);

    /// Clears internal state such as delay lines.
    fn reset(&mut self) {}
}

/// Builds the processor for a newly attached node.
pub type ProcessorFactory = Box<dyn Fn(&EffectKind) -> Box<dyn NodeProcessor> + Send>;

/// A processor that leaves the signal untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl NodeProcessor for Passthrough {
    fn process(&mut self, _block: &mut [f32], _format: AudioFormat) {}

    fn update(&mut self, _effect: &EffectKind) {}
}

/// Factory producing [`Passthrough`] for every effect.
pub fn passthrough() -> ProcessorFactory {
    Box::new(|_| Box::new(Passthrough))
}

struct Node {
    effect: EffectKind,
    processor: Box<dyn NodeProcessor>,
}

/// The player: the scheduled source and the read position in frames.
#[derive(Default)]
struct Player {
    source: Option<SourceBuffer>,
    mode: PlaybackMode,
    position: u64,
    volume: f32,
}

impl Player {
    fn finished(&self) -> bool {
        match &self.source {
            Some(source) => !self.mode.is_looping() && self.position >= source.frames(),
            None => true,
        }
    }

    /// Reads `frames` frames into `out`, scaled by the volume.
    fn read(&mut self, frames: usize, out: &mut Vec<f32>) -> bool {
        let Some(source) = &self.source else {
            return false;
        };
        let channels = usize::from(source.format().channels.max(1));
        let total = source.frames();
        let samples = source.samples();

        for _ in 0..frames {
            let frame = if self.mode.is_looping() && total > 0 {
                self.position % total
            } else {
                self.position
            };
            if frame < total {
                let start = frame as usize * channels;
                out.extend(samples[start..start + channels].iter().map(|s| s * self.volume));
            } else {
                out.extend(std::iter::repeat_n(0.0, channels));
            }
            self.position += 1;
        }
        true
    }
}

/// Engine that processes the routing in the calling thread.
pub struct OfflineEngine {
    factory: ProcessorFactory,
    nodes: HashMap<SlotId, Node>,
    connections: Vec<(Endpoint, Endpoint)>,
    player: Player,
    running: bool,
    offline: Option<(AudioFormat, usize)>,
}

impl OfflineEngine {
    /// An engine whose nodes pass audio through.
    pub fn new() -> Self {
        Self::with_processors(passthrough())
    }

    /// An engine whose nodes are built by `factory`.
    pub fn with_processors(factory: ProcessorFactory) -> Self {
        Self {
            factory,
            nodes: HashMap::new(),
            connections: Vec::new(),
            player: Player {
                volume: 1.0,
                ..Player::default()
            },
            running: false,
            offline: None,
        }
    }

    /// Nodes on the path from source to output, in signal order.
    ///
    /// Empty when the source reaches the output directly or is not connected.
    pub fn signal_path(&self) -> Vec<SlotId> {
        let mut path = Vec::new();
        let mut at = Endpoint::Source;
        // A linear path visits each connection at most once.
        for _ in 0..self.connections.len() {
            let Some(&(_, next)) = self.connections.iter().find(|(from, _)| *from == at) else {
                return Vec::new();
            };
            match next {
                Endpoint::Node(slot) => path.push(slot),
                Endpoint::Output => return path,
                Endpoint::Source => break,
            }
            at = next;
        }
        tracing::warn!("routing does not reach the output");
        Vec::new()
    }

    /// Whether the source is connected through to the output.
    pub fn is_connected(&self) -> bool {
        !self.connections.is_empty()
            && (!self.signal_path().is_empty()
                || self.connections.contains(&(Endpoint::Source, Endpoint::Output)))
    }

    fn process(&mut self, block: &mut [f32], format: AudioFormat) {
        for slot in self.signal_path() {
            let Some(node) = self.nodes.get_mut(&slot) else {
                tracing::warn!("connection to unattached node {slot}");
                continue;
            };
            if !node.effect.is_bypassed() {
                node.processor.process(block, format);
            }
        }
    }
}

impl Default for OfflineEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine for OfflineEngine {
    fn attach(&mut self, node: SlotId, effect: &EffectKind) {
        let processor = (self.factory)(effect);
        self.nodes.insert(
            node,
            Node {
                effect: effect.clone(),
                processor,
            },
        );
    }

    fn update(&mut self, node: SlotId, effect: &EffectKind) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.effect = effect.clone();
            n.processor.update(effect);
        }
    }

    fn disconnect_all(&mut self) {
        self.connections.clear();
        self.nodes.clear();
    }

    fn connect(&mut self, from: Endpoint, to: Endpoint, _format: Option<AudioFormat>) {
        self.connections.retain(|(f, _)| *f != from);
        self.connections.push((from, to));
    }

    fn set_player_volume(&mut self, volume: f32) {
        self.player.volume = volume.clamp(0.0, 1.0);
    }

    fn schedule_source(&mut self, source: &SourceBuffer, mode: PlaybackMode) {
        self.player.source = Some(source.clone());
        self.player.mode = mode;
        self.player.position = 0;
        for node in self.nodes.values_mut() {
            node.processor.reset();
        }
    }

    fn start(&mut self) -> Result<(), EngineError> {
        if !self.is_connected() {
            return Err(EngineError::Start("source is not connected to the output".into()));
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn is_playing(&self) -> bool {
        self.running && !self.player.finished()
    }

    fn enable_offline_rendering(
        &mut self,
        format: AudioFormat,
        max_frames: usize,
    ) -> Result<(), EngineError> {
        if format.channels == 0 || format.sample_rate == 0 {
            return Err(EngineError::OfflineRendering(format!(
                "unsupported format {} ch @ {} Hz",
                format.channels, format.sample_rate
            )));
        }
        if max_frames == 0 {
            return Err(EngineError::OfflineRendering(
                "maximum chunk size must be positive".into(),
            ));
        }
        self.offline = Some((format, max_frames));
        Ok(())
    }

    fn disable_offline_rendering(&mut self) {
        self.offline = None;
    }

    fn render_next_chunk(
        &mut self,
        frames: usize,
        out: &mut Vec<f32>,
    ) -> Result<RenderStatus, EngineError> {
        out.clear();
        let Some((format, max_frames)) = self.offline else {
            return Err(EngineError::NotOffline);
        };
        if !self.running {
            return Ok(RenderStatus::CannotDoInCurrentContext);
        }
        if let Some(source) = &self.player.source
            && source.format().channels != format.channels
        {
            return Err(EngineError::Render(format!(
                "source has {} channels, render format {}",
                source.format().channels,
                format.channels
            )));
        }
        if !self.player.read(frames.min(max_frames), out) {
            return Ok(RenderStatus::InsufficientData);
        }
        self.process(out, format);
        Ok(RenderStatus::Success)
    }

    fn honors_bypass(&self, _effect: EffectType) -> bool {
        true
    }
}

impl std::fmt::Debug for OfflineEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineEngine")
            .field("nodes", &self.nodes.len())
            .field("connections", &self.connections)
            .field("running", &self.running)
            .field("offline", &self.offline)
            .finish_non_exhaustive()
    }
}
