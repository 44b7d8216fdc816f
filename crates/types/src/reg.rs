use core::fmt;

/// Segment id reserved for boxed integers. Never handed out by the heap.
pub const NULL_SEGMENT: SegmentId = SegmentId(0);

/// Opaque index into the segment table.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct SegmentId(pub u16);

impl SegmentId {
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn as_u16(self) -> u16 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn is_null(self) -> bool {
        self.0 == NULL_SEGMENT.0
    }
}

impl fmt::Debug for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seg#{:04x}", self.0)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

/// A `(segment, offset)` pair pointing into a live segment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    pub segment: SegmentId,
    pub offset: u16,
}

impl Handle {
    pub const fn new(segment: SegmentId, offset: u16) -> Self {
        Self { segment, offset }
    }

    pub const fn with_offset(self, offset: u16) -> Self {
        Self { segment: self.segment, offset }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.segment.0, self.offset)
    }
}

/// Tagged reference: every value on the operand stack, in a property slot,
/// or in a list node is one of these.
///
/// The wire form is always `(segment: u16, offset: u16)`. Segment 0 marks a
/// boxed integer, so `Reg::Int(0)` doubles as the null reference. There is
/// exactly one encoding for every value: `from_raw` folds the null segment
/// into `Int`, and `Ptr` never carries the null segment.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    Int(u16),
    Ptr(Handle),
}

impl Reg {
    pub const NULL: Reg = Reg::Int(0);

    pub const fn int(value: u16) -> Self {
        Reg::Int(value)
    }

    pub const fn signed(value: i16) -> Self {
        Reg::Int(value as u16)
    }

    /// Build a reference from its raw parts. A null segment yields an integer.
    pub const fn from_raw(segment: u16, offset: u16) -> Self {
        if segment == NULL_SEGMENT.0 {
            Reg::Int(offset)
        } else {
            Reg::Ptr(Handle::new(SegmentId(segment), offset))
        }
    }

    pub const fn ptr(segment: SegmentId, offset: u16) -> Self {
        Self::from_raw(segment.0, offset)
    }

    pub const fn to_raw(self) -> (u16, u16) {
        match self {
            Reg::Int(v) => (NULL_SEGMENT.0, v),
            Reg::Ptr(h) => (h.segment.0, h.offset),
        }
    }

    pub const fn segment(self) -> SegmentId {
        match self {
            Reg::Int(_) => NULL_SEGMENT,
            Reg::Ptr(h) => h.segment,
        }
    }

    pub const fn offset(self) -> u16 {
        match self {
            Reg::Int(v) => v,
            Reg::Ptr(h) => h.offset,
        }
    }

    pub const fn is_null(self) -> bool {
        matches!(self, Reg::Int(0))
    }

    pub const fn is_int(self) -> bool {
        matches!(self, Reg::Int(_))
    }

    pub const fn as_int(self) -> Option<u16> {
        match self {
            Reg::Int(v) => Some(v),
            Reg::Ptr(_) => None,
        }
    }

    /// Integer view with the sign-extension most arithmetic opcodes use.
    pub const fn as_signed(self) -> Option<i16> {
        match self {
            Reg::Int(v) => Some(v as i16),
            Reg::Ptr(_) => None,
        }
    }

    pub const fn as_handle(self) -> Option<Handle> {
        match self {
            Reg::Int(_) => None,
            Reg::Ptr(h) => Some(h),
        }
    }
}

impl Default for Reg {
    fn default() -> Self {
        Reg::NULL
    }
}

impl From<Handle> for Reg {
    fn from(handle: Handle) -> Self {
        Reg::ptr(handle.segment, handle.offset)
    }
}

impl From<u16> for Reg {
    fn from(value: u16) -> Self {
        Reg::Int(value)
    }
}

impl fmt::Debug for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (segment, offset) = self.to_raw();
        write!(f, "{:04x}:{:04x}", segment, offset)
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reg::Int(v) => write!(f, "{}", *v as i16),
            Reg::Ptr(h) => write!(f, "{:?}", h),
        }
    }
}
