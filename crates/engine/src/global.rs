pub struct Config;

impl Config {
    pub const MAX_SEGMENTS: usize = vm::segment_manager::MAX_SEGMENTS;
    pub const MAX_TABLE_ENTRIES: usize = vm::segment::MAX_TABLE_ENTRIES;
    pub const STACK_SIZE: usize = vm::segment::DEFAULT_STACK_SIZE;

    pub const MIN_SAVE_REVISION: u16 = state::MIN_SAVE_REVISION;
    pub const CURRENT_SAVE_REVISION: u16 = state::CURRENT_SAVE_REVISION;

    pub const TICKS_PER_SECOND: u32 = 60;

    pub const DEFAULT_VERSION: &'static str = "sci1.1";
    pub const DEFAULT_PLATFORM: &'static str = "dos";
}
