#![allow(dead_code)]

use std::rc::Rc;

use engine::{Engine, EngineConfig};
use storage::{GameResources, Storage, NO_SCRIPT};
use vm::script_loader::ScriptBuilder;

/// Root class in script 0, an Actor class with one instance in script 5.
pub fn game() -> Rc<Storage> {
    let storage = Storage::new().with_identity("engine-fixture", "2.100.002");
    storage.set_script(
        0,
        ScriptBuilder::new()
            .class(0, None, &[0, 0], &[(1, 0x10)])
            .code(&[0x48; 8])
            .build(),
    );
    storage.set_script(
        5,
        ScriptBuilder::new()
            .locals(&[1, 2, 3])
            .class(1, Some(0), &[0, 0, 7], &[(2, 0x20)])
            .instance(1, &[0, 0, 42])
            .code(b"hello\0")
            .build(),
    );
    storage.set_class_table(vec![0, 5, NO_SCRIPT]);
    Rc::new(storage)
}

pub fn resources() -> Rc<dyn GameResources> {
    game()
}

pub fn engine() -> Engine {
    engine_with(EngineConfig::default())
}

pub fn engine_with(config: EngineConfig) -> Engine {
    Engine::new(resources(), config).expect("engine")
}
