//! Property-based tests for chain editing.
//!
//! Random sequences of insert / clear / reorder / bypass operations must
//! keep the chain at six slots and keep the routing equal to the active
//! slots in ordinal order.

use cadena_core::testing::RecordingEngine;
use cadena_core::{Chain, EffectKind, EffectType, SLOT_COUNT};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert(usize, usize),
    Clear(usize),
    Reorder(usize, usize),
    Bypass(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..SLOT_COUNT, 0..EffectType::ALL.len()).prop_map(|(i, t)| Op::Insert(i, t)),
        (0..SLOT_COUNT).prop_map(Op::Clear),
        (0..SLOT_COUNT, 0..SLOT_COUNT + 2).prop_map(|(f, t)| Op::Reorder(f, t)),
        (0..SLOT_COUNT).prop_map(Op::Bypass),
    ]
}

fn apply(chain: &mut Chain, op: &Op) {
    let id_at = |chain: &Chain, i: usize| chain.slot_at(i).map(|s| s.id());
    match *op {
        Op::Insert(i, t) => {
            chain
                .insert_effect(i, EffectKind::new(EffectType::ALL[t]))
                .unwrap();
        }
        Op::Clear(i) => {
            if let Some(id) = id_at(chain, i) {
                chain.clear_slot(id);
            }
        }
        Op::Reorder(from, to) => {
            if let Some(id) = id_at(chain, from) {
                chain.reorder(id, to);
            }
        }
        Op::Bypass(i) => {
            if let Some(id) = id_at(chain, i) {
                chain.toggle_bypass(id);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Any operation sequence leaves exactly six slots.
    #[test]
    fn slot_count_is_invariant(ops in prop::collection::vec(op(), 0..40)) {
        let (engine, _probe) = RecordingEngine::new();
        let mut chain = Chain::new(Box::new(engine));
        for op in &ops {
            apply(&mut chain, op);
            prop_assert_eq!(chain.slots().len(), SLOT_COUNT);
        }
    }

    /// The routing lists non-empty, non-bypassed-reverb slots in slot order.
    #[test]
    fn routing_follows_slot_order(ops in prop::collection::vec(op(), 0..40)) {
        let (engine, _probe) = RecordingEngine::new();
        let mut chain = Chain::new(Box::new(engine));
        for op in &ops {
            apply(&mut chain, op);
        }

        let expected: Vec<_> = chain
            .slots()
            .iter()
            .filter(|s| {
                s.effect_type().is_some()
                    && !(s.effect_type() == Some(EffectType::Reverb) && s.kind().is_bypassed())
            })
            .map(|s| s.id())
            .collect();
        let actual: Vec<_> = chain.routing().nodes().iter().map(|n| n.slot).collect();
        prop_assert_eq!(actual, expected);
    }
}
