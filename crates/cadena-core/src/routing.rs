//! Linear routing derived from a chain's slot order.
//!
//! The routing is always recomputed from scratch: source → active nodes in
//! slot order → output, or source → output when nothing is active. A node is
//! active when its slot holds an effect, unless the effect is bypassed and the
//! engine would not actually silence it while bypassed; such nodes are left
//! out of the graph entirely.

use crate::effect::EffectType;
use crate::id::SlotId;
use crate::slot::EffectSlot;

/// One end of a routing connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// The chain's source player.
    Source,
    /// The effect node for a slot.
    Node(SlotId),
    /// The engine's main output.
    Output,
}

/// An effect node in the routing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteNode {
    /// The slot this node belongs to.
    pub slot: SlotId,
    /// The slot's effect type.
    pub effect: EffectType,
}

/// Ordered list of effect nodes between source and output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Routing {
    nodes: Vec<RouteNode>,
}

impl Routing {
    /// Computes the routing for `slots`.
    ///
    /// `honors_bypass` reports whether the engine silences a bypassed node of
    /// the given type; bypassed nodes it would not silence are dropped.
    pub fn compute(slots: &[EffectSlot], honors_bypass: impl Fn(EffectType) -> bool) -> Self {
        let nodes = slots
            .iter()
            .filter_map(|slot| {
                let effect = slot.effect_type()?;
                if slot.kind().is_bypassed() && !honors_bypass(effect) {
                    return None;
                }
                Some(RouteNode {
                    slot: slot.id(),
                    effect,
                })
            })
            .collect();
        Self { nodes }
    }

    /// Effect nodes in processing order.
    pub fn nodes(&self) -> &[RouteNode] {
        &self.nodes
    }

    /// Effect types in processing order.
    pub fn effect_types(&self) -> Vec<EffectType> {
        self.nodes.iter().map(|n| n.effect).collect()
    }

    /// Returns `true` when the source feeds the output directly.
    pub fn is_passthrough(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if the slot's node is part of the routing.
    pub fn contains(&self, slot: SlotId) -> bool {
        self.nodes.iter().any(|n| n.slot == slot)
    }

    /// The connections that realise this routing, in source-to-output order.
    pub fn connections(&self) -> Vec<(Endpoint, Endpoint)> {
        let points: Vec<Endpoint> = std::iter::once(Endpoint::Source)
            .chain(self.nodes.iter().map(|n| Endpoint::Node(n.slot)))
            .chain(std::iter::once(Endpoint::Output))
            .collect();
        points.windows(2).map(|w| (w[0], w[1])).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{EffectKind, ReverbParams};

    fn reverb_default_engine(effect: EffectType) -> bool {
        effect != EffectType::Reverb
    }

    fn slot(effect: Option<EffectType>) -> EffectSlot {
        match effect {
            Some(t) => EffectSlot::with_kind(EffectKind::new(t)),
            None => EffectSlot::empty(),
        }
    }

    #[test]
    fn empty_slots_route_straight_through() {
        let slots: Vec<EffectSlot> = (0..6).map(|_| EffectSlot::empty()).collect();
        let routing = Routing::compute(&slots, reverb_default_engine);
        assert!(routing.is_passthrough());
        assert_eq!(
            routing.connections(),
            vec![(Endpoint::Source, Endpoint::Output)]
        );
    }

    #[test]
    fn skips_empty_and_bypassed_reverb() {
        let bypassed_reverb = EffectSlot::with_kind(EffectKind::Reverb(ReverbParams {
            bypass: true,
            ..ReverbParams::default()
        }));
        let slots = vec![
            slot(None),
            slot(Some(EffectType::Distortion)),
            bypassed_reverb,
            slot(Some(EffectType::Delay)),
            slot(None),
            slot(None),
        ];
        let routing = Routing::compute(&slots, reverb_default_engine);
        assert_eq!(
            routing.effect_types(),
            vec![EffectType::Distortion, EffectType::Delay]
        );
    }

    #[test]
    fn bypassed_reverb_kept_when_engine_honors_it() {
        let slots = vec![EffectSlot::with_kind(EffectKind::Reverb(ReverbParams {
            bypass: true,
            ..ReverbParams::default()
        }))];
        let routing = Routing::compute(&slots, |_| true);
        assert_eq!(routing.effect_types(), vec![EffectType::Reverb]);
    }

    #[test]
    fn bypassed_non_reverb_stays_in_graph() {
        let mut delay = slot(Some(EffectType::Delay));
        delay.toggle_bypass();
        let routing = Routing::compute(std::slice::from_ref(&delay), reverb_default_engine);
        assert!(routing.contains(delay.id()));
    }

    #[test]
    fn connections_chain_nodes_in_order() {
        let slots = vec![slot(Some(EffectType::Reverb)), slot(Some(EffectType::Delay))];
        let (a, b) = (slots[0].id(), slots[1].id());
        let routing = Routing::compute(&slots, reverb_default_engine);
        assert_eq!(
            routing.connections(),
            vec![
                (Endpoint::Source, Endpoint::Node(a)),
                (Endpoint::Node(a), Endpoint::Node(b)),
                (Endpoint::Node(b), Endpoint::Output),
            ]
        );
    }
}
