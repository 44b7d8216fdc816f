mod common;

use types::{Category, Reg, SegmentId};
use vm::classify;

#[test]
fn test_integers_and_null() {
    let state = common::state();
    assert_eq!(classify(&state.heap, Reg::int(0)), Category::Null);
    assert_eq!(classify(&state.heap, Reg::int(7)), Category::Integer);
    assert_eq!(classify(&state.heap, Reg::signed(-1)), Category::Integer);
}

#[test]
fn test_script_offsets() {
    let mut state = common::state();
    let id = state.instantiate_script(5).expect("load script 5");

    // Two locals, then the object count: the first object sits at byte 8.
    assert_eq!(classify(&state.heap, Reg::ptr(id, 8)), Category::Object);
    assert_eq!(classify(&state.heap, Reg::ptr(id, 9)), Category::Reference);
    assert_eq!(classify(&state.heap, Reg::ptr(id, 0)), Category::Reference);
    assert_eq!(classify(&state.heap, Reg::ptr(id, 0x4000)), Category::Invalid);

    let instance = state.script_object(5, 1).expect("instance");
    assert_eq!(classify(&state.heap, instance), Category::Object);
}

#[test]
fn test_pool_entries() {
    let mut state = common::state();
    let list = state.new_list().expect("list");
    let node = state.new_node(Reg::int(3), Reg::int(3)).expect("node");
    assert_eq!(state.classify(list), Category::List);
    assert_eq!(state.classify(node), Category::Node);

    state.heap.free_node(node);
    assert_eq!(state.classify(node), Category::Invalid);
}

#[test]
fn test_stack_slots_above_high_water_are_uninitialized() {
    let mut state = common::state();
    let written = state.push(Reg::int(1)).expect("push");
    assert_eq!(state.classify(written), Category::Reference);

    let above = state.stack_slot(10).expect("stack");
    assert_eq!(state.classify(above), Category::Uninitialized);

    state.pop();
    assert_eq!(state.classify(written), Category::Reference, "popped slots stay written");

    let beyond = state.stack_slot(64).expect("stack");
    assert_eq!(state.classify(beyond), Category::Invalid);
}

#[test]
fn test_missing_and_freed_segments_are_invalid() {
    let mut state = common::state();
    assert_eq!(state.classify(Reg::ptr(SegmentId(999), 0)), Category::Invalid);

    let id = state.instantiate_script(0).expect("load script 0");
    let class = Reg::ptr(id, 4);
    assert_eq!(state.classify(class), Category::Object);
    assert_eq!(state.classify(class), Category::Object, "classification is stable");

    state.release_script(0).expect("release");
    assert_eq!(state.classify(class), Category::Invalid);
}

#[test]
fn test_string_data_is_a_reference() {
    let mut state = common::state();
    let fragment = state.intern_string(b"hello").expect("fragment");
    assert_eq!(state.classify(fragment), Category::Reference);
    assert_eq!(state.read_cstring(fragment), Some(b"hello".to_vec()));
}
