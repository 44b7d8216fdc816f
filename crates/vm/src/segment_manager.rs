use std::collections::BTreeSet;
use std::fmt::Write;

use tracing::debug;
use types::{Handle, Reg, SegmentId, SegmentKind};

use crate::segment::{List, Node, Object, ScriptSegment, Segment};

/// Highest segment id the table can hand out.
pub const MAX_SEGMENTS: usize = u16::MAX as usize;

/// The segment heap: a growable table of heterogeneous segments.
///
/// Ids are table indices. Slot 0 is the null segment and never holds
/// anything. A freed slot stays empty (the table never shrinks) until a
/// later allocation reuses it, so a live id always names one segment.
/// Lookups on out-of-range or freed ids return `None` instead of failing.
#[derive(Debug, Clone)]
pub struct SegmentManager {
    segments: Vec<Option<Segment>>,
    free_ids: BTreeSet<u16>,
    clones: Option<SegmentId>,
    lists: Option<SegmentId>,
    nodes: Option<SegmentId>,
    hunks: Option<SegmentId>,
    fragments: Option<SegmentId>,
}

impl Default for SegmentManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentManager {
    pub fn new() -> Self {
        Self {
            segments: vec![None],
            free_ids: BTreeSet::new(),
            clones: None,
            lists: None,
            nodes: None,
            hunks: None,
            fragments: None,
        }
    }

    /// Appends an empty segment of `kind`. `None` only when every id is taken.
    pub fn allocate(&mut self, kind: SegmentKind) -> Option<SegmentId> {
        self.insert(Segment::empty(kind))
    }

    pub fn insert(&mut self, segment: Segment) -> Option<SegmentId> {
        self.insert_with(|_| segment)
    }

    /// Allocates an id and builds the segment with it, for payloads that
    /// need to know their own id (script objects point at their segment).
    pub fn insert_with<F>(&mut self, build: F) -> Option<SegmentId>
    where
        F: FnOnce(SegmentId) -> Segment,
    {
        let id = match self.free_ids.pop_first() {
            Some(raw) => SegmentId(raw),
            None => {
                if self.segments.len() > MAX_SEGMENTS {
                    return None;
                }
                self.segments.push(None);
                SegmentId((self.segments.len() - 1) as u16)
            }
        };
        let segment = build(id);
        debug!(segment = %id, kind = segment.kind().name(), "allocated segment");
        self.segments[id.index()] = Some(segment);
        Some(id)
    }

    /// Places a segment at a specific id, growing the table as needed.
    /// Fails for the null id or an occupied slot.
    pub fn insert_at(&mut self, id: SegmentId, segment: Segment) -> bool {
        if id.is_null() {
            return false;
        }
        while self.segments.len() <= id.index() {
            self.free_ids.insert(self.segments.len() as u16);
            self.segments.push(None);
        }
        if self.segments[id.index()].is_some() {
            return false;
        }
        self.free_ids.remove(&id.0);
        self.segments[id.index()] = Some(segment);
        true
    }

    /// Tears a segment down and returns its payload. The id becomes
    /// invalid for lookups immediately.
    pub fn free(&mut self, id: SegmentId) -> Option<Segment> {
        if id.is_null() {
            return None;
        }
        let segment = self.segments.get_mut(id.index())?.take()?;
        self.free_ids.insert(id.0);
        for pool in [
            &mut self.clones,
            &mut self.lists,
            &mut self.nodes,
            &mut self.hunks,
            &mut self.fragments,
        ] {
            if *pool == Some(id) {
                *pool = None;
            }
        }
        debug!(segment = %id, kind = segment.kind().name(), "freed segment");
        Some(segment)
    }

    pub fn get(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(id.index())?.as_ref()
    }

    pub fn get_mut(&mut self, id: SegmentId) -> Option<&mut Segment> {
        self.segments.get_mut(id.index())?.as_mut()
    }

    pub fn is_live(&self, id: SegmentId) -> bool {
        self.get(id).is_some()
    }

    pub fn kind_of(&self, id: SegmentId) -> Option<SegmentKind> {
        self.get(id).map(Segment::kind)
    }

    /// Length of the segment table including empty slots.
    pub fn table_len(&self) -> usize {
        self.segments.len()
    }

    pub fn live_count(&self) -> usize {
        self.segments.iter().filter(|slot| slot.is_some()).count()
    }

    /// Live segments in table order.
    pub fn iter(&self) -> impl Iterator<Item = (SegmentId, &Segment)> {
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|seg| (SegmentId(index as u16), seg)))
    }

    pub fn ids_of_kind(&self, kind: SegmentKind) -> Vec<SegmentId> {
        self.iter()
            .filter(|(_, segment)| segment.kind() == kind)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn script(&self, id: SegmentId) -> Option<&ScriptSegment> {
        match self.get(id)? {
            Segment::Script(script) => Some(script),
            _ => None,
        }
    }

    pub fn script_mut(&mut self, id: SegmentId) -> Option<&mut ScriptSegment> {
        match self.get_mut(id)? {
            Segment::Script(script) => Some(script),
            _ => None,
        }
    }

    /// Object addressed by `reg`, whether it lives in a script or a clone pool.
    pub fn object(&self, reg: Reg) -> Option<&Object> {
        let handle = reg.as_handle()?;
        match self.get(handle.segment)? {
            Segment::Script(script) => script.object(handle.offset),
            Segment::Clones(table) => table.get(handle.offset),
            _ => None,
        }
    }

    pub fn object_mut(&mut self, reg: Reg) -> Option<&mut Object> {
        let handle = reg.as_handle()?;
        match self.get_mut(handle.segment)? {
            Segment::Script(script) => script.object_mut(handle.offset),
            Segment::Clones(table) => table.get_mut(handle.offset),
            _ => None,
        }
    }

    pub fn list(&self, reg: Reg) -> Option<&List> {
        let handle = reg.as_handle()?;
        match self.get(handle.segment)? {
            Segment::Lists(table) => table.get(handle.offset),
            _ => None,
        }
    }

    pub fn list_mut(&mut self, reg: Reg) -> Option<&mut List> {
        let handle = reg.as_handle()?;
        match self.get_mut(handle.segment)? {
            Segment::Lists(table) => table.get_mut(handle.offset),
            _ => None,
        }
    }

    pub fn node(&self, reg: Reg) -> Option<&Node> {
        let handle = reg.as_handle()?;
        match self.get(handle.segment)? {
            Segment::Nodes(table) => table.get(handle.offset),
            _ => None,
        }
    }

    pub fn node_mut(&mut self, reg: Reg) -> Option<&mut Node> {
        let handle = reg.as_handle()?;
        match self.get_mut(handle.segment)? {
            Segment::Nodes(table) => table.get_mut(handle.offset),
            _ => None,
        }
    }

    /// Current pool segment of `kind` with room for one more entry,
    /// opening a new one when the previous pool is full.
    fn pool_segment(&mut self, kind: SegmentKind) -> Option<SegmentId> {
        let cached = match kind {
            SegmentKind::Clones => self.clones,
            SegmentKind::Lists => self.lists,
            SegmentKind::Nodes => self.nodes,
            SegmentKind::Hunk => self.hunks,
            SegmentKind::StringFrag => self.fragments,
            _ => return None,
        };
        let has_room = |segment: &Segment| match segment {
            Segment::Clones(t) => !t.is_full(),
            Segment::Lists(t) => !t.is_full(),
            Segment::Nodes(t) => !t.is_full(),
            Segment::Hunk(t) | Segment::StringFrag(t) => !t.is_full(),
            _ => false,
        };
        let reusable = cached
            .filter(|&id| self.get(id).is_some_and(|seg| has_room(seg)))
            .or_else(|| {
                self.iter()
                    .find(|(_, seg)| seg.kind() == kind && has_room(seg))
                    .map(|(id, _)| id)
            });
        let id = match reusable {
            Some(id) => id,
            None => self.allocate(kind)?,
        };
        match kind {
            SegmentKind::Clones => self.clones = Some(id),
            SegmentKind::Lists => self.lists = Some(id),
            SegmentKind::Nodes => self.nodes = Some(id),
            SegmentKind::Hunk => self.hunks = Some(id),
            _ => self.fragments = Some(id),
        }
        Some(id)
    }

    pub fn allocate_clone(&mut self, object: Object) -> Option<Reg> {
        let id = self.pool_segment(SegmentKind::Clones)?;
        match self.get_mut(id)? {
            Segment::Clones(table) => table.alloc(object).map(|offset| Reg::ptr(id, offset)),
            _ => None,
        }
    }

    pub fn free_clone(&mut self, reg: Reg) -> Option<Object> {
        let handle = reg.as_handle()?;
        match self.get_mut(handle.segment)? {
            Segment::Clones(table) => table.free(handle.offset),
            _ => None,
        }
    }

    pub fn allocate_list(&mut self) -> Option<Reg> {
        let id = self.pool_segment(SegmentKind::Lists)?;
        match self.get_mut(id)? {
            Segment::Lists(table) => table.alloc(List::default()).map(|offset| Reg::ptr(id, offset)),
            _ => None,
        }
    }

    pub fn free_list(&mut self, reg: Reg) -> Option<List> {
        let handle = reg.as_handle()?;
        match self.get_mut(handle.segment)? {
            Segment::Lists(table) => table.free(handle.offset),
            _ => None,
        }
    }

    pub fn allocate_node(&mut self, node: Node) -> Option<Reg> {
        let id = self.pool_segment(SegmentKind::Nodes)?;
        match self.get_mut(id)? {
            Segment::Nodes(table) => table.alloc(node).map(|offset| Reg::ptr(id, offset)),
            _ => None,
        }
    }

    pub fn free_node(&mut self, reg: Reg) -> Option<Node> {
        let handle = reg.as_handle()?;
        match self.get_mut(handle.segment)? {
            Segment::Nodes(table) => table.free(handle.offset),
            _ => None,
        }
    }

    pub fn allocate_hunk(&mut self, size: usize) -> Option<Reg> {
        let id = self.pool_segment(SegmentKind::Hunk)?;
        match self.get_mut(id)? {
            Segment::Hunk(table) => table
                .alloc(vec![0; size.min(u16::MAX as usize)])
                .map(|offset| Reg::ptr(id, offset)),
            _ => None,
        }
    }

    pub fn free_hunk(&mut self, reg: Reg) -> Option<Vec<u8>> {
        let handle = reg.as_handle()?;
        match self.get_mut(handle.segment)? {
            Segment::Hunk(table) => table.free(handle.offset),
            _ => None,
        }
    }

    pub fn allocate_string_fragment(&mut self, bytes: &[u8]) -> Option<Reg> {
        let id = self.pool_segment(SegmentKind::StringFrag)?;
        match self.get_mut(id)? {
            Segment::StringFrag(table) => table
                .alloc(bytes.to_vec())
                .map(|offset| Reg::ptr(id, offset)),
            _ => None,
        }
    }

    /// Raw bytes behind a reference, for kinds that hold byte data.
    pub fn bytes(&self, handle: Handle) -> Option<&[u8]> {
        match self.get(handle.segment)? {
            Segment::Script(script) => script.buf().get(handle.offset as usize..),
            Segment::SysStrings(strings) => strings.get(handle.offset).map(|s| s.value.as_slice()),
            Segment::StringFrag(table) => table.get(handle.offset).map(Vec::as_slice),
            Segment::Dynmem(mem) => mem.data.get(handle.offset as usize..),
            Segment::Hunk(table) => table.get(handle.offset).map(Vec::as_slice),
            _ => None,
        }
    }

    pub fn bytes_mut(&mut self, handle: Handle) -> Option<&mut [u8]> {
        match self.get_mut(handle.segment)? {
            Segment::Dynmem(mem) => mem.data.get_mut(handle.offset as usize..),
            Segment::Hunk(table) => table.get_mut(handle.offset).map(Vec::as_mut_slice),
            _ => None,
        }
    }

    /// One line per live segment, for diagnostics.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for (id, segment) in self.iter() {
            let detail = match segment {
                Segment::Script(script) => format!(
                    "script {} lockers={} objects={}",
                    script.script_number,
                    script.lockers,
                    script.object_count()
                ),
                Segment::Locals(locals) => format!("locals of script {}", locals.script_number),
                Segment::Dynmem(mem) => format!("'{}'", mem.description),
                _ => String::new(),
            };
            let _ = writeln!(
                out,
                "{}  {:<12} size={:<6} {}",
                id,
                segment.kind().name(),
                segment.size(),
                detail
            );
        }
        out
    }

    /// Hex dump of the raw bytes of a byte-holding segment.
    pub fn dump(&self, id: SegmentId) -> Option<String> {
        let data: &[u8] = match self.get(id)? {
            Segment::Script(script) => script.buf(),
            Segment::Dynmem(mem) => &mem.data,
            _ => return None,
        };
        let mut out = String::new();
        for (row, chunk) in data.chunks(16).enumerate() {
            let _ = writeln!(out, "{:04x}: {}", row * 16, hex::encode(chunk));
        }
        Some(out)
    }
}

impl SegmentManager {
    /// Creates a table shaped like a snapshot: `len` slots, all free.
    pub fn with_table_len(len: usize) -> Self {
        let mut heap = Self::new();
        let len = len.clamp(1, MAX_SEGMENTS + 1);
        for index in 1..len {
            heap.segments.push(None);
            heap.free_ids.insert(index as u16);
        }
        heap
    }
}
