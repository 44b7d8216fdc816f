/// Kind tag of a heap segment. The discriminant is the on-disk tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// Script byte-code, static data and the script's object table
    Script = 1,
    /// Object pool holding clones
    Clones = 2,
    /// List headers
    Lists = 3,
    /// List nodes
    Nodes = 4,
    /// Script local variables
    Locals = 5,
    /// Execution stack
    Stack = 6,
    /// Interpreter-owned named strings
    SysStrings = 7,
    /// Interned string fragments
    StringFrag = 8,
    /// Dynamic scratch buffers
    Dynmem = 9,
    /// Transient allocations, never persisted
    Hunk = 10,
}

impl SegmentKind {
    pub const ALL: [SegmentKind; 10] = [
        SegmentKind::Script,
        SegmentKind::Clones,
        SegmentKind::Lists,
        SegmentKind::Nodes,
        SegmentKind::Locals,
        SegmentKind::Stack,
        SegmentKind::SysStrings,
        SegmentKind::StringFrag,
        SegmentKind::Dynmem,
        SegmentKind::Hunk,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(SegmentKind::Script),
            2 => Some(SegmentKind::Clones),
            3 => Some(SegmentKind::Lists),
            4 => Some(SegmentKind::Nodes),
            5 => Some(SegmentKind::Locals),
            6 => Some(SegmentKind::Stack),
            7 => Some(SegmentKind::SysStrings),
            8 => Some(SegmentKind::StringFrag),
            9 => Some(SegmentKind::Dynmem),
            10 => Some(SegmentKind::Hunk),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            SegmentKind::Script => "script",
            SegmentKind::Clones => "clones",
            SegmentKind::Lists => "lists",
            SegmentKind::Nodes => "nodes",
            SegmentKind::Locals => "locals",
            SegmentKind::Stack => "stack",
            SegmentKind::SysStrings => "sys_strings",
            SegmentKind::StringFrag => "string_frag",
            SegmentKind::Dynmem => "dynmem",
            SegmentKind::Hunk => "hunk",
        }
    }

    /// Session-lifetime segments are only torn down with the whole heap.
    pub fn is_session_scoped(self) -> bool {
        matches!(
            self,
            SegmentKind::Stack | SegmentKind::SysStrings | SegmentKind::Dynmem
        )
    }
}
