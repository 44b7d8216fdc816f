//! Payload types for every segment kind.

pub mod data;
pub mod list;
pub mod object;
pub mod script;
pub mod table;

use types::SegmentKind;

pub use data::{DataStack, DynMem, LocalVariables, SystemString, SystemStrings};
pub use list::{List, Node};
pub use object::{Method, MethodTable, Object};
pub use script::ScriptSegment;
pub use table::Table;

/// Entries per pooled segment before a fresh segment of the same kind is opened.
pub const MAX_TABLE_ENTRIES: usize = 0x0800;

/// Default operand stack size in slots.
pub const DEFAULT_STACK_SIZE: usize = 0x1000;

#[derive(Debug, Clone)]
pub enum Segment {
    Script(ScriptSegment),
    Clones(Table<Object>),
    Lists(Table<List>),
    Nodes(Table<Node>),
    Locals(LocalVariables),
    Stack(DataStack),
    SysStrings(SystemStrings),
    StringFrag(Table<Vec<u8>>),
    Dynmem(DynMem),
    Hunk(Table<Vec<u8>>),
}

impl Segment {
    /// A fresh, empty segment of `kind`.
    pub fn empty(kind: SegmentKind) -> Self {
        match kind {
            SegmentKind::Script => Segment::Script(ScriptSegment::empty(0)),
            SegmentKind::Clones => Segment::Clones(Table::new(MAX_TABLE_ENTRIES)),
            SegmentKind::Lists => Segment::Lists(Table::new(MAX_TABLE_ENTRIES)),
            SegmentKind::Nodes => Segment::Nodes(Table::new(MAX_TABLE_ENTRIES)),
            SegmentKind::Locals => Segment::Locals(LocalVariables::new(0, Vec::new())),
            SegmentKind::Stack => Segment::Stack(DataStack::new(DEFAULT_STACK_SIZE)),
            SegmentKind::SysStrings => Segment::SysStrings(SystemStrings::default()),
            SegmentKind::StringFrag => Segment::StringFrag(Table::new(MAX_TABLE_ENTRIES)),
            SegmentKind::Dynmem => Segment::Dynmem(DynMem::new("", 0)),
            SegmentKind::Hunk => Segment::Hunk(Table::new(MAX_TABLE_ENTRIES)),
        }
    }

    pub fn kind(&self) -> SegmentKind {
        match self {
            Segment::Script(_) => SegmentKind::Script,
            Segment::Clones(_) => SegmentKind::Clones,
            Segment::Lists(_) => SegmentKind::Lists,
            Segment::Nodes(_) => SegmentKind::Nodes,
            Segment::Locals(_) => SegmentKind::Locals,
            Segment::Stack(_) => SegmentKind::Stack,
            Segment::SysStrings(_) => SegmentKind::SysStrings,
            Segment::StringFrag(_) => SegmentKind::StringFrag,
            Segment::Dynmem(_) => SegmentKind::Dynmem,
            Segment::Hunk(_) => SegmentKind::Hunk,
        }
    }

    /// Whether `offset` addresses something live inside this segment.
    pub fn is_valid_offset(&self, offset: u16) -> bool {
        match self {
            Segment::Script(script) => script.in_bounds(offset),
            Segment::Clones(table) => table.is_valid(offset),
            Segment::Lists(table) => table.is_valid(offset),
            Segment::Nodes(table) => table.is_valid(offset),
            Segment::Locals(locals) => (offset as usize) < locals.values.len(),
            Segment::Stack(stack) => stack.in_bounds(offset),
            Segment::SysStrings(strings) => strings.get(offset).is_some(),
            Segment::StringFrag(table) => table.is_valid(offset),
            Segment::Dynmem(mem) => (offset as usize) < mem.data.len(),
            Segment::Hunk(table) => table.is_valid(offset),
        }
    }

    /// Live entries for pooled kinds, bytes or slots for the rest.
    pub fn size(&self) -> usize {
        match self {
            Segment::Script(script) => script.len(),
            Segment::Clones(table) => table.live(),
            Segment::Lists(table) => table.live(),
            Segment::Nodes(table) => table.live(),
            Segment::Locals(locals) => locals.values.len(),
            Segment::Stack(stack) => stack.high_water(),
            Segment::SysStrings(strings) => strings.strings.len(),
            Segment::StringFrag(table) => table.live(),
            Segment::Dynmem(mem) => mem.data.len(),
            Segment::Hunk(table) => table.live(),
        }
    }
}
