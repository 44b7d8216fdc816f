mod common;

use types::{Category, Reg};
use vm::{LifecycleError, ScriptState};

#[test]
fn test_instantiate_twice_then_release() {
    let mut state = common::state();
    let first = state.instantiate_script(17).expect("instantiate");
    let second = state.instantiate_script(17).expect("instantiate again");
    assert_eq!(first, second, "one physical copy per script number");
    assert_eq!(state.lockers(17), 2);

    assert_eq!(state.release_script(17), Ok(ScriptState::Resident));
    assert_eq!(state.script_state(17), ScriptState::Resident);
    assert_eq!(state.lockers(17), 1);

    assert_eq!(state.release_script(17), Ok(ScriptState::Unloaded));
    assert_eq!(state.script_state(17), ScriptState::Unloaded);
    assert_eq!(state.lockers(17), 0);
}

#[test]
fn test_double_release_is_refused() {
    let mut state = common::state();
    state.instantiate_script(0).expect("instantiate");
    state.release_script(0).expect("release");
    assert_eq!(
        state.release_script(0),
        Err(LifecycleError::DoubleRelease { script: 0, lockers: 0 })
    );
    assert_eq!(
        state.release_script(123),
        Err(LifecycleError::DoubleRelease { script: 123, lockers: 0 })
    );
}

#[test]
fn test_superclass_scripts_are_locked_by_subclasses() {
    let mut state = common::state();
    state.instantiate_script(17).expect("instantiate");

    assert_eq!(state.script_state(5), ScriptState::Resident);
    assert_eq!(state.script_state(0), ScriptState::Resident);
    assert_eq!(state.lockers(5), 1);
    assert_eq!(state.lockers(0), 1);

    // A direct user of script 5 adds a locker of its own.
    state.instantiate_script(5).expect("instantiate 5");
    assert_eq!(state.lockers(5), 2);

    state.release_script(17).expect("release 17");
    assert_eq!(state.script_state(17), ScriptState::Unloaded);
    assert_eq!(state.lockers(5), 1);
    assert_eq!(state.script_state(0), ScriptState::Resident);

    state.release_script(5).expect("release 5");
    assert_eq!(state.script_state(5), ScriptState::Unloaded);
    assert_eq!(state.script_state(0), ScriptState::Unloaded);
}

#[test]
fn test_classes_resolve_and_clear() {
    let mut state = common::state();
    let id = state.instantiate_script(5).expect("instantiate");
    let actor = state.scripts.class_table().resolve(common::SPECIES_ACTOR);
    assert_eq!(actor, Some(Reg::ptr(id, 8)));
    assert!(state.scripts.class_table().resolve(common::SPECIES_OBJ).is_some());

    let instance = state.script_object(5, 1).expect("instance");
    let object = state.heap.object(instance).expect("object");
    assert_eq!(object.species_ref, Reg::ptr(id, 8));
    assert_eq!(state.object_script_number(instance), Some(5));

    state.release_script(5).expect("release");
    assert_eq!(state.scripts.class_table().resolve(common::SPECIES_ACTOR), None);
    assert_eq!(state.scripts.class_table().resolve(common::SPECIES_OBJ), None);
    assert_eq!(state.scripts.class_table().defining_script(common::SPECIES_ACTOR), Some(5));
}

#[test]
fn test_reload_gets_fresh_segment_with_same_classes() {
    let mut state = common::state();
    state.instantiate_script(20).expect("instantiate");
    state.release_script(20).expect("release");
    let id = state.instantiate_script(20).expect("reload");
    assert_eq!(state.lockers(20), 1);
    let door = state.scripts.class_table().resolve(common::SPECIES_DOOR).expect("door");
    assert_eq!(door.segment(), id);
}

#[test]
fn test_locals_segment_lives_with_its_script() {
    let mut state = common::state();
    let id = state.instantiate_script(5).expect("instantiate");
    let locals = state
        .heap
        .script(id)
        .and_then(|script| script.locals_segment)
        .expect("locals segment");
    assert_eq!(state.classify(Reg::ptr(locals, 1)), Category::Reference);

    state.release_script(5).expect("release");
    assert!(state.heap.get(locals).is_none());
}

#[test]
fn test_failed_loads_roll_back() {
    let mut state = common::state();
    let live = state.heap.live_count();

    assert_eq!(
        state.instantiate_script(99),
        Err(LifecycleError::ScriptNotFound { script: 99 })
    );
    assert!(matches!(
        state.instantiate_script(50),
        Err(LifecycleError::MalformedScript { script: 50, .. })
    ));
    assert_eq!(
        state.instantiate_script(40),
        Err(LifecycleError::ForeignClass { script: 40, species: common::SPECIES_ACTOR, expected: 5 })
    );
    assert_eq!(
        state.instantiate_script(60),
        Err(LifecycleError::UnresolvedClass { species: 9, script: 60 })
    );

    assert_eq!(state.heap.live_count(), live, "no segment leaked");
    assert_eq!(state.script_state(40), ScriptState::Unloaded);
    assert_eq!(state.script_state(0), ScriptState::Unloaded);
}

#[test]
fn test_clones_keep_their_class_script_resident() {
    let mut state = common::state();
    state.instantiate_script(5).expect("instantiate");
    let actor = state.script_object(5, 1).expect("actor instance");

    let clone = state.clone_object(actor).expect("clone");
    assert_eq!(state.classify(clone), Category::Object);
    assert_eq!(state.lockers(5), 2);
    assert_eq!(state.property(clone, 2), Some(Reg::int(42)));
    assert!(state.set_property(clone, 2, Reg::int(43)));
    assert_eq!(state.property(actor, 2), Some(Reg::int(42)), "clone owns its properties");

    state.release_script(5).expect("release");
    assert_eq!(state.script_state(5), ScriptState::Resident);

    state.dispose_clone(clone).expect("dispose");
    assert_eq!(state.classify(clone), Category::Invalid);
    assert_eq!(state.script_state(5), ScriptState::Unloaded);
}

#[test]
fn test_method_lookup_walks_the_class_chain() {
    let mut state = common::state();
    state.instantiate_script(17).expect("instantiate");
    let ego = state.script_object(17, 1).expect("ego");

    let doit = state.lookup_method(ego, common::SELECTOR_DOIT).expect("doit");
    assert_eq!(doit.offset, 0x0020);
    assert_eq!(Some(doit.segment), state.scripts.segment_of(5));

    let init = state.lookup_method(ego, common::SELECTOR_INIT).expect("init");
    assert_eq!(Some(init.segment), state.scripts.segment_of(0));

    assert!(state.lookup_method(ego, 77).is_none());
}

#[test]
fn test_scripts_using_each_others_classes_lock_each_other() {
    let mut state = common::state();
    state.instantiate_script(70).expect("instantiate 70");
    assert_eq!(state.script_state(71), ScriptState::Resident);
    assert_eq!(state.lockers(70), 2, "caller plus script 71");
    assert_eq!(state.lockers(71), 1, "held by script 70");

    state.instantiate_script(71).expect("instantiate 71");
    assert_eq!(state.release_script(70), Ok(ScriptState::Resident));
    assert_eq!(state.script_state(70), ScriptState::Resident);

    let exit_class = state
        .scripts
        .class_table()
        .resolve(common::SPECIES_EXIT)
        .expect("exit class");
    let superclass = state.heap.object(exit_class).expect("object").superclass_ref;
    assert_eq!(state.classify(superclass), Category::Object);
    assert_eq!(
        state.scripts.class_table().resolve(common::SPECIES_ROOM),
        Some(superclass)
    );
}
