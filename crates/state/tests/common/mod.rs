#![allow(dead_code)]

use std::rc::Rc;

use storage::{GameResources, Storage, NO_SCRIPT};
use types::{Reg, SciVersion};
use vm::script_loader::ScriptBuilder;
use vm::VmState;

use state::SaveMetadata;

/// Script 0 defines the root class, script 5 an Actor class with an
/// instance and two locals.
pub fn game() -> Rc<Storage> {
    let storage = Storage::new().with_identity("fixture", "1.000.051");
    storage.set_script(
        0,
        ScriptBuilder::new()
            .class(0, None, &[0, 0], &[(1, 0x10)])
            .code(&[0x48; 16])
            .build(),
    );
    storage.set_script(
        5,
        ScriptBuilder::new()
            .locals(&[3, 4])
            .class(1, Some(0), &[0, 0, 7], &[(2, 0x20)])
            .instance(1, &[0, 0, 42])
            .code(b"actor\0")
            .build(),
    );
    storage.set_class_table(vec![0, 5, NO_SCRIPT]);
    Rc::new(storage)
}

pub fn resources() -> Rc<dyn GameResources> {
    game()
}

pub fn metadata(name: &str) -> SaveMetadata {
    SaveMetadata::new(name, game().as_ref(), SciVersion::Sci11, 1234)
}

/// A session with script 5 resident, a clone, a three-node list and a
/// few stack slots in use.
pub fn busy_state() -> VmState {
    let mut state = VmState::new(resources(), 32);
    state.instantiate_script(5).expect("instantiate");
    let actor = state.script_object(5, 1).expect("actor");
    state.set_property(actor, 2, actor);

    let clone = state.clone_object(actor).expect("clone");
    state.set_property(clone, 0, Reg::int(99));

    let list = state.new_list().expect("list");
    for value in [Reg::int(10), clone, Reg::int(30)] {
        let node = state.new_node(value, value).expect("node");
        state.add_to_end(list, node).expect("link");
    }
    state.push(list);
    state.push(clone);
    state.random_seed = 0xdead_beef;
    state
}
