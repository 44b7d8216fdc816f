mod common;

use std::io::Cursor;

use state::{
    encode_save, query_save_metadata, restore_game, save_game, SaveError, CURRENT_SAVE_REVISION,
};
use types::{Category, Reg, SegmentKind};
use vm::ScriptState;

fn save_bytes(state: &vm::VmState) -> Vec<u8> {
    let mut out = Vec::new();
    save_game(&mut out, state, &common::metadata("slot 1")).expect("save");
    out
}

fn restore(bytes: &[u8]) -> Result<vm::VmState, SaveError> {
    restore_game(&mut Cursor::new(bytes), common::resources()).map(|(state, _)| state)
}

#[test]
fn test_round_trip_preserves_objects_lists_and_stack() {
    let original = common::busy_state();
    let restored = restore(&save_bytes(&original)).expect("restore");

    let actor = original.script_object(5, 1).expect("actor");
    assert_eq!(restored.script_object(5, 1), Some(actor));
    assert_eq!(restored.property(actor, 2), Some(actor));
    assert_eq!(restored.lockers(5), original.lockers(5));
    assert_eq!(restored.script_state(0), ScriptState::Resident);
    assert_eq!(restored.random_seed, 0xdead_beef);

    let lists = original.heap.ids_of_kind(SegmentKind::Lists);
    let list = Reg::ptr(lists[0], 0);
    assert_eq!(restored.list_values(list), original.list_values(list));
    let clone = original.list_values(list)[1];
    assert_eq!(restored.classify(clone), Category::Object);
    assert_eq!(restored.property(clone, 0), Some(Reg::int(99)));
    assert_eq!(restored.object_script_number(clone), Some(5));

    let stack = restored.stack_slot(1).expect("stack");
    assert_eq!(restored.classify(stack), Category::Reference);
    assert_eq!(
        restored.classify(restored.stack_slot(2).expect("stack")),
        Category::Uninitialized
    );

    let metadata = common::metadata("slot 1");
    assert_eq!(encode_save(&restored, &metadata), encode_save(&original, &metadata));
}

#[test]
fn test_stack_pointer_survives_a_save_taken_after_pops() {
    let mut original = common::busy_state();
    original.push(Reg::int(1));
    original.push(Reg::int(2));
    original.push(Reg::int(3));
    assert_eq!(original.pop(), Some(Reg::int(3)));
    assert_eq!(original.pop(), Some(Reg::int(2)));

    let mut restored = restore(&save_bytes(&original)).expect("restore");
    let metadata = common::metadata("slot 1");
    assert_eq!(encode_save(&restored, &metadata), encode_save(&original, &metadata));

    assert_eq!(restored.pop(), Some(Reg::int(1)));
    assert_eq!(original.pop(), Some(Reg::int(1)));
    // Slots above the pointer stay written.
    let top = restored.stack_slot(4).expect("stack");
    assert_eq!(restored.classify(top), Category::Reference);
    let unused = restored.stack_slot(5).expect("stack");
    assert_eq!(restored.classify(unused), Category::Uninitialized);
}

#[test]
fn test_long_string_fragment_round_trips_whole() {
    let mut original = common::busy_state();
    let text: Vec<u8> = (0..70_000u32).map(|i| b'a' + (i % 26) as u8).collect();
    let fragment = original.intern_string(&text).expect("fragment");

    let restored = restore(&save_bytes(&original)).expect("restore");
    let handle = fragment.as_handle().expect("pointer");
    assert_eq!(restored.heap.bytes(handle), Some(text.as_slice()));
}

#[test]
fn test_restored_objects_keep_class_links_and_methods() {
    let original = common::busy_state();
    let restored = restore(&save_bytes(&original)).expect("restore");

    let actor = restored.script_object(5, 1).expect("actor");
    assert_eq!(restored.classify(actor), Category::Object);
    assert_eq!(restored.object_script_number(actor), Some(5));
    let method = restored.lookup_method(actor, 1).expect("inherited method");
    assert_eq!(Some(method.segment), restored.scripts.segment_of(0));

    let lists = restored.heap.ids_of_kind(SegmentKind::Lists);
    let clone = restored.list_values(Reg::ptr(lists[0], 0))[1];
    assert!(restored.lookup_method(clone, 2).is_some());
}

#[test]
fn test_restored_heap_keeps_working() {
    let mut restored = restore(&save_bytes(&common::busy_state())).expect("restore");
    let actor = restored.script_object(5, 1).expect("actor");
    let extra = restored.clone_object(actor).expect("clone after restore");
    assert_eq!(restored.classify(extra), Category::Object);
    restored.dispose_clone(extra).expect("dispose");
    assert_eq!(restored.release_script(5), Ok(ScriptState::Resident));
}

#[test]
fn test_truncated_save_is_rejected() {
    let bytes = save_bytes(&common::busy_state());
    for cut in [0, 3, 10, bytes.len() / 2, bytes.len() - 1] {
        match restore(&bytes[..cut]) {
            Err(SaveError::Truncated { .. }) => {}
            other => panic!("cut at {}: expected Truncated, got {:?}", cut, other.err()),
        }
    }
}

#[test]
fn test_revision_checks() {
    let bytes = save_bytes(&common::busy_state());

    let mut old = bytes.clone();
    old[4..6].copy_from_slice(&1u16.to_le_bytes());
    assert!(matches!(restore(&old), Err(SaveError::TooOld { found: 1, minimum: 2 })));

    let mut new = bytes.clone();
    new[4..6].copy_from_slice(&(CURRENT_SAVE_REVISION + 1).to_le_bytes());
    assert!(matches!(
        restore(&new),
        Err(SaveError::TooNew { found, .. }) if found == CURRENT_SAVE_REVISION + 1
    ));

    let mut garbage = bytes;
    garbage[0] = b'X';
    assert!(matches!(restore(&garbage), Err(SaveError::BadMagic { .. })));
}

#[test]
fn test_incompatible_game_data_is_rejected() {
    let bytes = save_bytes(&common::busy_state());
    let storage = common::game();
    let other = storage::Storage::new().with_identity("fixture", "2.000.000");
    for number in [0, 5] {
        other.set_script(number, storage::GameResources::load_script(storage.as_ref(), number).expect("script"));
    }
    let result = restore_game(&mut Cursor::new(&bytes), std::rc::Rc::new(other));
    assert!(matches!(result, Err(SaveError::IncompatibleContent { .. })));

    let patched = storage::Storage::new().with_identity("fixture", "1.000.060");
    for number in [0, 5] {
        patched.set_script(number, storage::GameResources::load_script(storage.as_ref(), number).expect("script"));
    }
    patched.set_class_table(vec![0, 5]);
    assert!(restore_game(&mut Cursor::new(&bytes), std::rc::Rc::new(patched)).is_ok());
}

#[test]
fn test_missing_script_fails_reconstruction() {
    let bytes = save_bytes(&common::busy_state());
    let storage = common::game();
    storage.remove_script(5);
    let result = restore_game(&mut Cursor::new(&bytes), storage);
    assert!(matches!(result, Err(SaveError::RestoreFailed { .. })));
}

#[test]
fn test_species_survives_restore() {
    let mut state = vm::VmState::new(common::resources(), 16);
    state.instantiate_script(5).expect("instantiate");
    let actor = state.script_object(5, 1).expect("actor");

    let restored = restore(&save_bytes(&state)).expect("restore");
    let actor = restored.script_object(5, 1).unwrap_or(actor);
    assert_eq!(restored.classify(actor), Category::Object);
    assert_eq!(restored.object_script_number(actor), Some(5));
}

#[test]
fn test_metadata_query_reads_header_only() {
    let state = common::busy_state();
    let bytes = save_bytes(&state);
    let metadata = query_save_metadata(&mut Cursor::new(&bytes)).expect("metadata");
    assert_eq!(metadata.name, "slot 1");
    assert_eq!(metadata.content_version, "1.000.051");
    assert_eq!(metadata.game_id, "fixture");
    assert_eq!(metadata.play_time, 1234);
    assert_eq!(metadata.revision, CURRENT_SAVE_REVISION);

    // magic, revision, three strings, timestamp, play time, version byte
    let header_len = 4 + 2 + (2 + 6) + (2 + 9) + (2 + 7) + 8 + 4 + 1;
    let header_only = query_save_metadata(&mut Cursor::new(&bytes[..header_len])).expect("header");
    assert_eq!(header_only, metadata);
    assert!(matches!(
        query_save_metadata(&mut Cursor::new(&bytes[..header_len - 1])),
        Err(SaveError::Truncated { .. })
    ));

    let json = serde_json::to_value(&metadata).expect("json");
    assert_eq!(json["name"], "slot 1");
    assert_eq!(json["interpreter_version"], "sci1.1");
}

#[test]
fn test_save_to_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("save.001");
    let state = common::busy_state();
    let mut file = std::fs::File::create(&path).expect("create");
    save_game(&mut file, &state, &common::metadata("file")).expect("save");
    drop(file);

    let mut file = std::fs::File::open(&path).expect("open");
    let (restored, metadata) = restore_game(&mut file, common::resources()).expect("restore");
    assert_eq!(metadata.name, "file");
    assert_eq!(restored.lockers(5), state.lockers(5));
}
