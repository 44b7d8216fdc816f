#![allow(dead_code)]

use std::rc::Rc;

use storage::{GameResources, Storage, NO_SCRIPT};
use vm::script_loader::ScriptBuilder;
use vm::VmState;

pub const SPECIES_OBJ: u16 = 0;
pub const SPECIES_ACTOR: u16 = 1;
pub const SPECIES_EGO: u16 = 2;
pub const SPECIES_DOOR: u16 = 3;
pub const SPECIES_ROOM: u16 = 4;
pub const SPECIES_EXIT: u16 = 5;

pub const SELECTOR_INIT: u16 = 1;
pub const SELECTOR_DOIT: u16 = 2;

/// A three-level class hierarchy spread over scripts 0, 5 and 17, plus
/// a couple of broken scripts.
///
/// - script 0: class Obj (root)
/// - script 5: class Actor (super Obj), one Actor instance, two locals
/// - script 17: class Ego (super Actor), one Ego instance
/// - script 20: class Door (super Obj), no locals
/// - script 40: declares Actor although the class table assigns it to 5
/// - script 50: garbage bytes
/// - script 60: instance of a species no script defines
/// - scripts 70 and 71: class Room (70) holds an Exit instance while
///   class Exit (71) derives from Room
pub fn game() -> Rc<Storage> {
    let storage = Storage::new().with_identity("fixture", "1.000.000");
    storage.set_script(
        0,
        ScriptBuilder::new()
            .class(SPECIES_OBJ, None, &[0, 0], &[(SELECTOR_INIT, 0x0010)])
            .code(&[0x48; 32])
            .build(),
    );
    storage.set_script(
        5,
        ScriptBuilder::new()
            .locals(&[3, 4])
            .class(SPECIES_ACTOR, Some(SPECIES_OBJ), &[0, 0, 7], &[(SELECTOR_DOIT, 0x0020)])
            .instance(SPECIES_ACTOR, &[0, 0, 42])
            .code(b"actor\0rest of code")
            .build(),
    );
    storage.set_script(
        17,
        ScriptBuilder::new()
            .class(SPECIES_EGO, Some(SPECIES_ACTOR), &[0, 0, 7, 1], &[])
            .instance(SPECIES_EGO, &[0, 0, 9, 1])
            .build(),
    );
    storage.set_script(
        20,
        ScriptBuilder::new()
            .class(SPECIES_DOOR, Some(SPECIES_OBJ), &[0, 0], &[])
            .build(),
    );
    storage.set_script(
        40,
        ScriptBuilder::new()
            .class(SPECIES_ACTOR, Some(SPECIES_OBJ), &[0, 0, 7], &[])
            .build(),
    );
    storage.set_script(50, vec![0x01, 0x00]);
    storage.set_script(60, ScriptBuilder::new().instance(9, &[1]).build());
    storage.set_script(
        70,
        ScriptBuilder::new()
            .class(SPECIES_ROOM, None, &[0, 0], &[])
            .instance(SPECIES_EXIT, &[0, 0, 3])
            .build(),
    );
    storage.set_script(
        71,
        ScriptBuilder::new()
            .class(SPECIES_EXIT, Some(SPECIES_ROOM), &[0, 0, 1], &[])
            .build(),
    );
    storage.set_class_table(vec![0, 5, 17, 20, 70, 71, NO_SCRIPT, NO_SCRIPT, NO_SCRIPT, NO_SCRIPT]);
    Rc::new(storage)
}

pub fn resources() -> Rc<dyn GameResources> {
    game()
}

pub fn state() -> VmState {
    VmState::new(resources(), 64)
}
