//! The effect chain: six slots, a source, and the routing between them.
//!
//! Every structural change (insert, clear, reorder, bypass toggle, file
//! load) recomputes the full [`Routing`] from slot order and rewires the
//! engine. Parameter edits are pushed to the engine in place.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::effect::{EffectKind, Param};
use crate::engine::{AudioEngine, AudioFormat, SourceBuffer, SourceLoader};
use crate::error::ChainError;
use crate::id::{ChainId, SlotId};
use crate::routing::Routing;
use crate::slot::EffectSlot;
use crate::transport::{PlaybackMode, TransportState};

/// Number of slots in every chain.
pub const SLOT_COUNT: usize = 6;

/// Name given to chains created from scratch.
pub const DEFAULT_CHAIN_NAME: &str = "New editor";

/// Nyquist frequency assumed while no source is loaded (44.1 kHz material).
pub const DEFAULT_NYQUIST: f64 = 22050.0;

/// Engine-independent snapshot of a chain's persisted state.
///
/// Produced by [`Chain::to_parts`] and consumed by [`Chain::from_parts`];
/// the persistence codec maps it to and from the stored record shape.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainParts {
    /// Durable chain id.
    pub id: ChainId,
    /// Display name.
    pub name: String,
    /// Player volume, 0..=1.
    pub volume: f32,
    /// Last opened source file.
    pub source_ref: Option<PathBuf>,
    /// Slot contents in order.
    pub slots: Vec<EffectKind>,
}

impl ChainParts {
    /// State of a chain created from scratch: fresh id, default name, full
    /// volume, no source, six empty slots.
    pub fn blank() -> Self {
        Self {
            id: ChainId::generate(),
            name: DEFAULT_CHAIN_NAME.to_string(),
            volume: 1.0,
            source_ref: None,
            slots: vec![EffectKind::Empty; SLOT_COUNT],
        }
    }
}

/// An ordered, fixed-capacity effect chain driving one [`AudioEngine`].
pub struct Chain {
    id: ChainId,
    name: String,
    volume: f32,
    source_ref: Option<PathBuf>,
    source: Option<SourceBuffer>,
    slots: Vec<EffectSlot>,
    playback_mode: PlaybackMode,
    transport: TransportState,
    routing: Routing,
    engine: Box<dyn AudioEngine>,
    revision: u64,
}

impl Chain {
    /// Creates a blank chain: fresh id, six empty slots, full volume,
    /// looping playback.
    pub fn new(engine: Box<dyn AudioEngine>) -> Self {
        Self::from_parts(ChainParts::blank(), engine)
    }

    /// Restores a chain from saved state.
    ///
    /// Slot lists shorter than [`SLOT_COUNT`] are padded with empty slots and
    /// longer ones truncated. Every slot gets a fresh id. The source file is
    /// remembered but not loaded; see [`restore_source`](Self::restore_source).
    pub fn from_parts(parts: ChainParts, engine: Box<dyn AudioEngine>) -> Self {
        let ChainParts {
            id,
            name,
            volume,
            source_ref,
            mut slots,
        } = parts;

        if slots.len() > SLOT_COUNT {
            tracing::warn!(
                "chain {id}: dropping {} slots beyond capacity",
                slots.len() - SLOT_COUNT
            );
            slots.truncate(SLOT_COUNT);
        }
        slots.resize(SLOT_COUNT, EffectKind::Empty);

        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            tracing::warn!("chain {id}: invalid volume {volume}, using full volume");
            1.0
        };

        let mut chain = Self {
            id,
            name,
            volume,
            source_ref,
            source: None,
            slots: slots.into_iter().map(EffectSlot::with_kind).collect(),
            playback_mode: PlaybackMode::Loop,
            transport: TransportState::Stopped,
            routing: Routing::default(),
            engine,
            revision: 0,
        };
        chain.engine.set_player_volume(chain.volume);
        chain.rebuild_routing();
        chain
    }

    /// Snapshot of the persisted state.
    pub fn to_parts(&self) -> ChainParts {
        ChainParts {
            id: self.id.clone(),
            name: self.name.clone(),
            volume: self.volume,
            source_ref: self.source_ref.clone(),
            slots: self.slots.iter().map(|s| s.kind().clone()).collect(),
        }
    }

    // --- accessors -------------------------------------------------------

    /// The durable chain id.
    pub fn id(&self) -> &ChainId {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Player volume, 0..=1.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Path of the source file, if one is set.
    pub fn source_ref(&self) -> Option<&Path> {
        self.source_ref.as_deref()
    }

    /// The decoded source, if loaded.
    pub fn source(&self) -> Option<&SourceBuffer> {
        self.source.as_ref()
    }

    /// Format of the loaded source.
    pub fn format(&self) -> Option<AudioFormat> {
        self.source.as_ref().map(SourceBuffer::format)
    }

    /// All slots in order. Always [`SLOT_COUNT`] long.
    pub fn slots(&self) -> &[EffectSlot] {
        &self.slots
    }

    /// The slot with the given id.
    pub fn slot(&self, id: SlotId) -> Option<&EffectSlot> {
        self.slots.iter().find(|s| s.id() == id)
    }

    /// The slot at an ordinal position.
    pub fn slot_at(&self, index: usize) -> Option<&EffectSlot> {
        self.slots.get(index)
    }

    /// Ordinal position of a slot.
    pub fn position(&self, id: SlotId) -> Option<usize> {
        self.slots.iter().position(|s| s.id() == id)
    }

    /// What happens at the end of the source.
    pub fn playback_mode(&self) -> PlaybackMode {
        self.playback_mode
    }

    /// Interactive playback state.
    pub fn transport(&self) -> TransportState {
        self.transport
    }

    /// Returns `true` while playing.
    pub fn is_playing(&self) -> bool {
        self.transport == TransportState::Playing
    }

    /// The routing computed by the last rebuild.
    pub fn routing(&self) -> &Routing {
        &self.routing
    }

    /// Counter bumped by every change to persisted state.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of slots holding an effect.
    pub fn active_slot_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_active()).count()
    }

    /// The slot offered for the next insertion: the first empty one.
    pub fn next_insert_index(&self) -> Option<usize> {
        self.slots.iter().position(|s| !s.is_active())
    }

    /// Nyquist frequency used to bound frequency parameters.
    pub fn nyquist(&self) -> f64 {
        self.format().map_or(DEFAULT_NYQUIST, |f| f.nyquist())
    }

    // --- slot mutation ---------------------------------------------------

    /// Places `kind` in the slot at `index`, replacing whatever it held.
    ///
    /// The new effect starts un-bypassed. Returns the slot's id.
    pub fn insert_effect(&mut self, index: usize, kind: EffectKind) -> Result<SlotId, ChainError> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(ChainError::SlotOutOfRange { index, len })?;
        slot.set_effect(kind);
        let id = slot.id();
        tracing::debug!("chain {}: insert {} at {index}", self.id, slot.kind().summary());
        self.touch();
        self.rebuild_routing();
        Ok(id)
    }

    /// Clears the slot with `id`.
    ///
    /// The slot is removed and a fresh empty slot is inserted at the first
    /// empty position (or appended), keeping the chain at [`SLOT_COUNT`].
    /// Returns `false` if no slot has that id.
    pub fn clear_slot(&mut self, id: SlotId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.slots.remove(index);
        let fresh = EffectSlot::empty();
        match self.slots.iter().position(|s| !s.is_active()) {
            Some(at) => self.slots.insert(at, fresh),
            None => self.slots.push(fresh),
        }
        tracing::debug!("chain {}: cleared {id}", self.id);
        self.touch();
        self.rebuild_routing();
        true
    }

    /// Moves the slot with `id` to position `to`, shifting the slots in
    /// between. Positions past the end move the slot to the end.
    ///
    /// Returns `false` if no slot has that id or it is already there.
    pub fn reorder(&mut self, id: SlotId, to: usize) -> bool {
        let Some(from) = self.position(id) else {
            return false;
        };
        let to = to.min(self.slots.len() - 1);
        if from == to {
            return false;
        }
        let slot = self.slots.remove(from);
        self.slots.insert(to, slot);
        tracing::debug!("chain {}: move {id} {from} → {to}", self.id);
        self.touch();
        self.rebuild_routing();
        true
    }

    /// Index-based variant of [`reorder`](Self::reorder).
    pub fn move_slot(&mut self, from: usize, to: usize) -> Result<bool, ChainError> {
        let len = self.slots.len();
        if to >= len {
            return Err(ChainError::SlotOutOfRange { index: to, len });
        }
        let id = self
            .slot_at(from)
            .map(EffectSlot::id)
            .ok_or(ChainError::SlotOutOfRange { index: from, len })?;
        Ok(self.reorder(id, to))
    }

    /// Flips the bypass flag of the slot with `id` and rebuilds the routing.
    ///
    /// Returns the new bypass state, or `None` for an unknown or empty slot.
    pub fn toggle_bypass(&mut self, id: SlotId) -> Option<bool> {
        let bypassed = self.slots.iter_mut().find(|s| s.id() == id)?.toggle_bypass()?;
        self.touch();
        self.rebuild_routing();
        Some(bypassed)
    }

    /// Sets one parameter of the effect in slot `id`, clamped to the
    /// parameter's range.
    ///
    /// Returns `false` when the slot is unknown, its effect has no such
    /// parameter, or `value` is not finite.
    pub fn set_parameter(&mut self, id: SlotId, param: Param, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        let nyquist = self.nyquist();
        let Some(slot) = self.slots.iter_mut().find(|s| s.id() == id) else {
            return false;
        };
        let Some(range) = slot
            .effect_type()
            .and_then(|t| t.param_range(param, nyquist))
        else {
            return false;
        };
        let value = value.clamp(*range.start(), *range.end());
        if !slot.set_param(param, value) {
            return false;
        }
        if self.routing.contains(id) {
            self.engine.update(id, slot.kind());
        }
        self.touch();
        true
    }

    // --- track state -----------------------------------------------------

    /// Sets the player volume, clamped to 0..=1.
    ///
    /// A non-finite `volume` is ignored and `false` returned.
    pub fn set_volume(&mut self, volume: f32) -> bool {
        if !volume.is_finite() {
            return false;
        }
        self.volume = volume.clamp(0.0, 1.0);
        self.engine.set_player_volume(self.volume);
        self.touch();
        true
    }

    /// Sets what happens at the end of the source. Takes effect the next
    /// time playback starts.
    pub fn set_playback_mode(&mut self, mode: PlaybackMode) {
        self.playback_mode = mode;
    }

    /// Renames the chain.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    /// Stops playback and loads a new source file.
    ///
    /// On failure the chain is left with no source and the error is
    /// returned. The routing is rebuilt either way.
    pub fn load_file(&mut self, path: &Path, loader: &dyn SourceLoader) -> Result<(), ChainError> {
        self.pause();
        let result = match loader.load(path) {
            Ok(source) => {
                tracing::info!(
                    "chain {}: loaded {} ({} frames @ {} Hz)",
                    self.id,
                    path.display(),
                    source.frames(),
                    source.format().sample_rate
                );
                self.source = Some(source);
                self.source_ref = Some(path.to_path_buf());
                Ok(())
            }
            Err(source) => {
                tracing::warn!("chain {}: cannot load {}: {source}", self.id, path.display());
                self.source = None;
                self.source_ref = None;
                Err(ChainError::SourceLoad {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        self.touch();
        self.rebuild_routing();
        result
    }

    /// Loads the remembered source file, if any. Does nothing when no file
    /// is remembered.
    pub fn restore_source(&mut self, loader: &dyn SourceLoader) -> Result<(), ChainError> {
        match self.source_ref.clone() {
            Some(path) => self.load_file(&path, loader),
            None => Ok(()),
        }
    }

    // --- routing ---------------------------------------------------------

    /// Recomputes the routing from slot order and rewires the engine.
    ///
    /// Stops playback. Calling it twice with no change in between yields the
    /// same routing.
    pub fn rebuild_routing(&mut self) -> &Routing {
        if self.transport == TransportState::Playing {
            self.engine.stop();
            self.transport = TransportState::Stopped;
        }

        let engine = &self.engine;
        let routing = Routing::compute(&self.slots, |effect| engine.honors_bypass(effect));

        self.engine.disconnect_all();
        for node in routing.nodes() {
            if let Some(slot) = self.slots.iter().find(|s| s.id() == node.slot) {
                self.engine.attach(node.slot, slot.kind());
            }
        }
        let format = self.format();
        for (from, to) in routing.connections() {
            tracing::debug!("graph_connect: {from:?} → {to:?}");
            self.engine.connect(from, to, format);
        }

        tracing::debug!(
            "chain {}: routing rebuilt, {} active nodes",
            self.id,
            routing.nodes().len()
        );
        self.routing = routing;
        &self.routing
    }

    // --- transport -------------------------------------------------------

    /// Schedules the source and starts playback.
    pub fn play(&mut self) -> Result<(), ChainError> {
        let source = self.source.as_ref().ok_or(ChainError::NoSource)?;
        self.engine.schedule_source(source, self.playback_mode);
        self.engine.start()?;
        self.transport = TransportState::Playing;
        Ok(())
    }

    /// Stops playback.
    pub fn pause(&mut self) {
        self.engine.stop();
        self.transport = TransportState::Stopped;
    }

    /// Toggles between playing and stopped, returning the new state.
    pub fn play_pause(&mut self) -> Result<TransportState, ChainError> {
        if self.is_playing() {
            self.pause();
        } else {
            self.play()?;
        }
        Ok(self.transport)
    }

    /// Picks up natural completion: once the engine's player has run out of
    /// material the transport returns to stopped.
    pub fn sync_transport(&mut self) -> TransportState {
        if self.is_playing() && !self.engine.is_playing() {
            self.pause();
        }
        self.transport
    }

    pub(crate) fn engine_mut(&mut self) -> &mut dyn AudioEngine {
        self.engine.as_mut()
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("volume", &self.volume)
            .field("source_ref", &self.source_ref)
            .field("slots", &self.slots)
            .field("playback_mode", &self.playback_mode)
            .field("transport", &self.transport)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{EffectType, ReverbParams};
    use crate::engine::testing::{EngineBehavior, EngineProbe, RecordingEngine};
    use crate::error::LoadError;
    use crate::routing::Endpoint;

    fn chain() -> (Chain, EngineProbe) {
        let (engine, probe) = RecordingEngine::new();
        (Chain::new(Box::new(engine)), probe)
    }

    struct FixedLoader(Option<SourceBuffer>);

    impl SourceLoader for FixedLoader {
        fn load(&self, path: &Path) -> Result<SourceBuffer, LoadError> {
            match &self.0 {
                Some(buf) => Ok(SourceBuffer::new(path, buf.format(), buf.samples().to_vec())),
                None => Err("unreadable".into()),
            }
        }
    }

    fn tone(sample_rate: u32) -> FixedLoader {
        let format = AudioFormat {
            sample_rate,
            channels: 1,
        };
        FixedLoader(Some(SourceBuffer::new("", format, vec![0.25; 64])))
    }

    #[test]
    fn new_chain_is_blank() {
        let (chain, probe) = chain();
        assert_eq!(chain.slots().len(), SLOT_COUNT);
        assert_eq!(chain.active_slot_count(), 0);
        assert_eq!(chain.next_insert_index(), Some(0));
        assert_eq!(chain.name(), DEFAULT_CHAIN_NAME);
        assert!(chain.routing().is_passthrough());
        assert_eq!(probe.connections(), vec![(Endpoint::Source, Endpoint::Output)]);
    }

    #[test]
    fn insert_out_of_range_is_an_error() {
        let (mut chain, _probe) = chain();
        let err = chain
            .insert_effect(SLOT_COUNT, EffectKind::new(EffectType::Delay))
            .unwrap_err();
        assert!(matches!(err, ChainError::SlotOutOfRange { index: 6, len: 6 }));
    }

    #[test]
    fn insert_wires_engine() {
        let (mut chain, probe) = chain();
        let id = chain
            .insert_effect(0, EffectKind::new(EffectType::Delay))
            .unwrap();
        assert_eq!(
            probe.connections(),
            vec![
                (Endpoint::Source, Endpoint::Node(id)),
                (Endpoint::Node(id), Endpoint::Output),
            ]
        );
        assert!(probe.log().attached.contains_key(&id));
    }

    #[test]
    fn clear_keeps_capacity_and_compacts() {
        let (mut chain, _probe) = chain();
        let a = chain.insert_effect(0, EffectKind::new(EffectType::Reverb)).unwrap();
        let b = chain.insert_effect(1, EffectKind::new(EffectType::Delay)).unwrap();
        assert!(chain.clear_slot(a));
        assert_eq!(chain.slots().len(), SLOT_COUNT);
        assert_eq!(chain.position(b), Some(0));
        assert!(!chain.slot_at(1).unwrap().is_active());
        assert!(!chain.clear_slot(a));
    }

    #[test]
    fn clear_with_full_chain_appends() {
        let (mut chain, _probe) = chain();
        for i in 0..SLOT_COUNT {
            chain.insert_effect(i, EffectKind::new(EffectType::Delay)).unwrap();
        }
        let first = chain.slot_at(0).unwrap().id();
        chain.clear_slot(first);
        assert_eq!(chain.active_slot_count(), SLOT_COUNT - 1);
        assert!(!chain.slot_at(SLOT_COUNT - 1).unwrap().is_active());
    }

    #[test]
    fn reorder_shifts_intervening_slots() {
        let (mut chain, _probe) = chain();
        let a = chain.insert_effect(0, EffectKind::new(EffectType::Reverb)).unwrap();
        chain.insert_effect(1, EffectKind::new(EffectType::Distortion)).unwrap();
        chain.insert_effect(2, EffectKind::new(EffectType::Delay)).unwrap();

        assert!(chain.reorder(a, 2));
        assert_eq!(
            chain.routing().effect_types(),
            vec![EffectType::Distortion, EffectType::Delay, EffectType::Reverb]
        );
        assert!(!chain.reorder(a, 2));
        assert!(chain.reorder(a, 99));
        assert_eq!(chain.position(a), Some(SLOT_COUNT - 1));
    }

    #[test]
    fn move_slot_checks_bounds() {
        let (mut chain, _probe) = chain();
        assert!(chain.move_slot(0, 6).is_err());
        assert!(chain.move_slot(7, 0).is_err());
        assert!(chain.move_slot(0, 3).unwrap());
    }

    #[test]
    fn toggle_bypass_removes_reverb_only() {
        let (mut chain, _probe) = chain();
        let reverb = chain.insert_effect(0, EffectKind::new(EffectType::Reverb)).unwrap();
        let delay = chain.insert_effect(1, EffectKind::new(EffectType::Delay)).unwrap();

        assert_eq!(chain.toggle_bypass(reverb), Some(true));
        assert_eq!(chain.toggle_bypass(delay), Some(true));
        assert_eq!(chain.routing().effect_types(), vec![EffectType::Delay]);

        assert_eq!(chain.toggle_bypass(reverb), Some(false));
        assert_eq!(
            chain.routing().effect_types(),
            vec![EffectType::Reverb, EffectType::Delay]
        );
    }

    #[test]
    fn toggle_bypass_on_empty_slot_does_nothing() {
        let (mut chain, _probe) = chain();
        let empty = chain.slot_at(0).unwrap().id();
        let revision = chain.revision();
        assert_eq!(chain.toggle_bypass(empty), None);
        assert_eq!(chain.revision(), revision);
    }

    #[test]
    fn set_parameter_clamps_and_updates_engine() {
        let (mut chain, probe) = chain();
        let id = chain.insert_effect(0, EffectKind::new(EffectType::Delay)).unwrap();

        assert!(chain.set_parameter(id, Param::Feedback, 250.0));
        assert_eq!(chain.slot(id).unwrap().kind().param(Param::Feedback), Some(100.0));
        assert_eq!(probe.log().updates, 1);

        assert!(chain.set_parameter(id, Param::LowPassCutoff, 1.0e6));
        assert_eq!(
            chain.slot(id).unwrap().kind().param(Param::LowPassCutoff),
            Some(DEFAULT_NYQUIST)
        );
    }

    #[test]
    fn set_parameter_ignores_mismatched_kind() {
        let (mut chain, _probe) = chain();
        let id = chain.insert_effect(0, EffectKind::new(EffectType::Equalizer)).unwrap();
        assert!(!chain.set_parameter(id, Param::Feedback, 10.0));
        assert!(!chain.set_parameter(SlotId::next(), Param::Gain, 1.0));
    }

    #[test]
    fn frequency_bound_follows_source_rate() {
        let (mut chain, _probe) = chain();
        chain.load_file(Path::new("tone.wav"), &tone(16000)).unwrap();
        let id = chain.insert_effect(0, EffectKind::new(EffectType::Equalizer)).unwrap();
        chain.set_parameter(id, Param::Frequency, 20000.0);
        assert_eq!(chain.slot(id).unwrap().kind().param(Param::Frequency), Some(8000.0));
    }

    #[test]
    fn volume_is_clamped_and_forwarded() {
        let (mut chain, probe) = chain();
        chain.set_volume(1.5);
        assert_eq!(chain.volume(), 1.0);
        chain.set_volume(0.25);
        assert_eq!(probe.log().volume, 0.25);
    }

    #[test]
    fn non_finite_parameter_values_are_rejected() {
        let (mut chain, probe) = chain();
        let id = chain.insert_effect(0, EffectKind::new(EffectType::Reverb)).unwrap();
        let (revision, updates) = (chain.revision(), probe.log().updates);
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(!chain.set_parameter(id, Param::WetDryMix, value));
        }
        assert_eq!(chain.slot(id).unwrap().kind().param(Param::WetDryMix), Some(50.0));
        assert_eq!(chain.revision(), revision);
        assert_eq!(probe.log().updates, updates);
    }

    #[test]
    fn non_finite_volume_is_ignored() {
        let (mut chain, probe) = chain();
        chain.set_volume(0.4);
        assert!(!chain.set_volume(f32::NAN));
        assert!(!chain.set_volume(f32::INFINITY));
        assert_eq!(chain.volume(), 0.4);
        assert_eq!(probe.log().volume, 0.4);
    }

    #[test]
    fn restored_nan_volume_becomes_full_volume() {
        let parts = ChainParts {
            volume: f32::NAN,
            ..ChainParts::blank()
        };
        let chain = Chain::from_parts(parts, Box::new(RecordingEngine::new().0));
        assert_eq!(chain.volume(), 1.0);
        assert_eq!(chain.to_parts().volume, 1.0);
    }

    #[test]
    fn play_without_source_fails() {
        let (mut chain, _probe) = chain();
        assert!(matches!(chain.play(), Err(ChainError::NoSource)));
        assert_eq!(chain.transport(), TransportState::Stopped);
    }

    #[test]
    fn play_pause_cycles_transport() {
        let (mut chain, probe) = chain();
        chain.load_file(Path::new("tone.wav"), &tone(44100)).unwrap();
        assert_eq!(chain.play_pause().unwrap(), TransportState::Playing);
        assert!(probe.log().running);
        assert_eq!(chain.play_pause().unwrap(), TransportState::Stopped);
        assert!(!probe.log().running);
    }

    #[test]
    fn engine_start_failure_is_returned() {
        let (engine, _probe) = RecordingEngine::with_behavior(EngineBehavior {
            fail_start: true,
            ..EngineBehavior::default()
        });
        let mut chain = Chain::new(Box::new(engine));
        chain.load_file(Path::new("tone.wav"), &tone(44100)).unwrap();
        assert!(matches!(chain.play(), Err(ChainError::Engine(_))));
        assert!(!chain.is_playing());
    }

    #[test]
    fn rebuild_stops_playback() {
        let (mut chain, _probe) = chain();
        chain.load_file(Path::new("tone.wav"), &tone(44100)).unwrap();
        chain.play().unwrap();
        chain.insert_effect(0, EffectKind::new(EffectType::Delay)).unwrap();
        assert_eq!(chain.transport(), TransportState::Stopped);
    }

    #[test]
    fn natural_completion_stops_transport() {
        let (engine, _probe) = RecordingEngine::with_behavior(EngineBehavior {
            finish_immediately: true,
            ..EngineBehavior::default()
        });
        let mut chain = Chain::new(Box::new(engine));
        chain.load_file(Path::new("tone.wav"), &tone(44100)).unwrap();

        chain.play().unwrap();
        assert_eq!(chain.sync_transport(), TransportState::Playing);

        chain.set_playback_mode(PlaybackMode::Interrupt);
        chain.play().unwrap();
        assert_eq!(chain.sync_transport(), TransportState::Stopped);
    }

    #[test]
    fn failed_load_clears_source() {
        let (mut chain, _probe) = chain();
        chain.load_file(Path::new("tone.wav"), &tone(44100)).unwrap();
        let err = chain
            .load_file(Path::new("missing.wav"), &FixedLoader(None))
            .unwrap_err();
        assert!(matches!(err, ChainError::SourceLoad { .. }));
        assert!(chain.source().is_none());
        assert!(chain.source_ref().is_none());
        assert_eq!(
            chain.routing().connections(),
            vec![(Endpoint::Source, Endpoint::Output)]
        );
    }

    #[test]
    fn from_parts_pads_and_keeps_bypass() {
        let (engine, _probe) = RecordingEngine::new();
        let parts = ChainParts {
            id: ChainId::from("A"),
            name: "Saved".into(),
            volume: 0.5,
            source_ref: None,
            slots: vec![EffectKind::Reverb(ReverbParams {
                bypass: true,
                ..ReverbParams::default()
            })],
        };
        let chain = Chain::from_parts(parts.clone(), Box::new(engine));
        assert_eq!(chain.slots().len(), SLOT_COUNT);
        assert!(chain.slot_at(0).unwrap().kind().is_bypassed());
        assert!(chain.routing().is_passthrough());

        let mut restored = chain.to_parts();
        restored.slots.truncate(1);
        assert_eq!(restored, parts);
    }

    #[test]
    fn from_parts_truncates_extra_slots() {
        let (engine, _probe) = RecordingEngine::new();
        let parts = ChainParts {
            id: ChainId::from("B"),
            name: "Long".into(),
            volume: 1.0,
            source_ref: None,
            slots: vec![EffectKind::new(EffectType::Delay); 9],
        };
        let chain = Chain::from_parts(parts, Box::new(engine));
        assert_eq!(chain.slots().len(), SLOT_COUNT);
        assert_eq!(chain.active_slot_count(), SLOT_COUNT);
        assert_eq!(chain.next_insert_index(), None);
    }

    #[test]
    fn revision_tracks_persisted_changes() {
        let (mut chain, _probe) = chain();
        let r0 = chain.revision();
        chain.rename("Drums");
        assert!(chain.revision() > r0);
        let r1 = chain.revision();
        chain.set_playback_mode(PlaybackMode::Interrupt);
        chain.rebuild_routing();
        assert_eq!(chain.revision(), r1);
    }
}
