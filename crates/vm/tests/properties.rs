mod common;

use proptest::prelude::*;
use types::{Category, Reg, SegmentId};
use vm::{classify, Signature, VmState};

fn category() -> impl Strategy<Value = Category> {
    prop_oneof![
        Just(Category::Integer),
        Just(Category::Null),
        Just(Category::Object),
        Just(Category::List),
        Just(Category::Node),
        Just(Category::Reference),
        Just(Category::Uninitialized),
        Just(Category::Invalid),
    ]
}

fn signature_text() -> impl Strategy<Value = String> {
    let slot = prop_oneof![
        Just("i".to_string()),
        Just("o".to_string()),
        Just("l".to_string()),
        Just(".".to_string()),
        Just("[io]".to_string()),
        Just("[ln0]".to_string()),
    ];
    (prop::collection::vec(slot.clone(), 0..4), prop::collection::vec(slot, 0..3), any::<bool>())
        .prop_map(|(mandatory, optional, more)| {
            let mut text = mandatory.concat();
            if !optional.is_empty() {
                text.push('(');
                text.push_str(&optional.concat());
                if more {
                    text.push('*');
                }
                text.push(')');
            } else if more && !mandatory.is_empty() {
                text.push('*');
            }
            text
        })
}

proptest! {
    #[test]
    fn prop_checker_is_total(text in signature_text(), args in prop::collection::vec(category(), 0..8)) {
        let signature = Signature::compile(&text).expect("generated signatures are well formed");
        let matched = signature.matches_categories(&args);
        if args.len() < signature.min_args() {
            prop_assert!(!matched);
        }
        if let Some(max) = signature.max_args() {
            if args.len() > max {
                prop_assert!(!matched);
            }
        }
        if args.contains(&Category::Invalid) {
            prop_assert!(!matched);
        }
    }

    #[test]
    fn prop_classification_is_stable(segment in 0u16..12, offset in 0u16..64) {
        let mut state = common::state();
        state.instantiate_script(17).expect("instantiate");
        let list = state.new_list().expect("list");
        state.push(list);
        let reg = Reg::from_raw(segment, offset);
        let first = classify(&state.heap, reg);
        prop_assert_eq!(first, classify(&state.heap, reg));
        if state.heap.get(SegmentId(segment)).is_none() && segment != 0 {
            prop_assert_eq!(first, Category::Invalid);
        }
    }

    #[test]
    fn prop_locker_count_law(ops in prop::collection::vec((any::<bool>(), prop::sample::select(vec![0u16, 5, 17, 20])), 0..40)) {
        let mut state: VmState = common::state();
        let mut expected = std::collections::BTreeMap::<u16, i64>::new();
        for (acquire, script) in ops {
            if acquire {
                state.instantiate_script(script).expect("instantiate");
                *expected.entry(script).or_default() += 1;
            } else if state.release_script(script).is_ok() {
                *expected.entry(script).or_default() -= 1;
            }
        }
        // Only script 17 loads nothing on behalf of other fixture scripts
        // that this test also counts, so compare it directly.
        let own = expected.get(&17).copied().unwrap_or(0);
        prop_assert_eq!(state.lockers(17) as i64, own);
        prop_assert_eq!(state.script_state(17) == vm::ScriptState::Unloaded, own == 0);
    }
}
