//! A single chain position ("bank").

use crate::effect::{EffectKind, EffectType, Param};
use crate::id::SlotId;

/// One position in a [`Chain`](crate::Chain): empty, or holding exactly one
/// effect.
///
/// Slots are never removed from a chain. Clearing resets a slot to
/// [`EffectKind::Empty`] under a fresh id so the chain keeps its fixed
/// capacity.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectSlot {
    id: SlotId,
    kind: EffectKind,
}

impl EffectSlot {
    /// Creates an empty slot with a fresh id.
    pub fn empty() -> Self {
        Self::with_kind(EffectKind::Empty)
    }

    /// Creates a slot holding `kind` exactly as given, bypass flag included.
    ///
    /// Used when restoring saved state; interactive insertion goes through
    /// [`set_effect()`](Self::set_effect).
    pub fn with_kind(kind: EffectKind) -> Self {
        Self {
            id: SlotId::next(),
            kind,
        }
    }

    /// The slot's id.
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// What the slot holds.
    pub fn kind(&self) -> &EffectKind {
        &self.kind
    }

    /// The held effect type, `None` when empty.
    pub fn effect_type(&self) -> Option<EffectType> {
        self.kind.effect_type()
    }

    /// Returns `true` when the slot holds an effect.
    pub fn is_active(&self) -> bool {
        !self.kind.is_empty()
    }

    /// Replaces whatever the slot held. Prior parameters are discarded and
    /// the new effect starts un-bypassed.
    pub fn set_effect(&mut self, kind: EffectKind) {
        self.kind = kind;
        self.kind.set_bypass(false);
    }

    /// Sets one parameter of the held effect.
    ///
    /// Silently ignored (returns `false`) when the held kind has no such
    /// parameter.
    pub fn set_param(&mut self, param: Param, value: f64) -> bool {
        self.kind.set_param(param, value)
    }

    /// Flips the bypass flag, returning the new state. `None` for an empty
    /// slot.
    pub fn toggle_bypass(&mut self) -> Option<bool> {
        if self.kind.is_empty() {
            return None;
        }
        let bypassed = !self.kind.is_bypassed();
        self.kind.set_bypass(bypassed);
        Some(bypassed)
    }
}

impl Default for EffectSlot {
    fn default() -> Self {
        Self::empty()
    }
}
