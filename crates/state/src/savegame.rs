//! Save and restore of a whole [`VmState`].
//!
//! Layout after the header:
//!
//! ```text
//! u32 random seed
//! u32 segment table length
//! u32 record count
//! per live segment, in table order:
//!   u16 segment id, u8 kind tag, u32 payload length, payload
//! ```
//!
//! Script payloads carry the script number and mutable state only. The
//! byte-code is reloaded from game data on restore and the same static
//! parse used at first load re-derives object layouts and method tables.
//! Segment ids are kept verbatim, so references stored in properties,
//! lists, nodes and the stack need no translation.

use std::io::{Read, Write};
use std::rc::Rc;

use storage::GameResources;
use tracing::{debug, info, warn};
use types::{SegmentId, SegmentKind};
use vm::segment::object::MethodTable;
use vm::segment::{
    DataStack, DynMem, List, LocalVariables, Node, Object, Segment, SystemString, SystemStrings,
    Table, MAX_TABLE_ENTRIES,
};
use vm::{ScriptSnapshot, SegmentManager, VmState};

use crate::codec::{Reader, Writer};
use crate::error::SaveError;
use crate::metadata::{
    content_compatible, SaveMetadata, REVISION_STACK_POINTER, REVISION_WIDE_FRAGMENTS,
};

/// Serializes `state` into a complete save image.
pub fn encode_save(state: &VmState, metadata: &SaveMetadata) -> Vec<u8> {
    let mut w = Writer::new();
    metadata.encode(&mut w);
    w.u32(state.random_seed);
    w.u32(state.heap.table_len() as u32);
    w.u32(state.heap.live_count() as u32);
    for (id, segment) in state.heap.iter() {
        let mut payload = Writer::new();
        encode_segment(&mut payload, segment);
        let payload = payload.into_inner();
        w.u16(id.as_u16());
        w.u8(segment.kind().as_u8());
        w.bytes(&payload);
    }
    w.into_inner()
}

/// Writes a save of `state` to `out`. The image is built in memory first
/// and handed to the stream in one write, so an encoding problem never
/// leaves a partial file behind.
pub fn save_game<W: Write>(
    out: &mut W,
    state: &VmState,
    metadata: &SaveMetadata,
) -> Result<(), SaveError> {
    let image = encode_save(state, metadata);
    out.write_all(&image)?;
    out.flush()?;
    info!(
        name = %metadata.name,
        bytes = image.len(),
        segments = state.heap.live_count(),
        "game saved"
    );
    Ok(())
}

/// Reads only the header of a save. Nothing else is decoded or touched.
pub fn query_save_metadata<R: Read>(input: &mut R) -> Result<SaveMetadata, SaveError> {
    let mut data = Vec::new();
    input.read_to_end(&mut data)?;
    SaveMetadata::decode(&mut Reader::new(&data))
}

/// Builds a new [`VmState`] from a save. The caller's live state is not
/// involved; swapping it for the result is up to the caller.
pub fn restore_game<R: Read>(
    input: &mut R,
    resources: Rc<dyn GameResources>,
) -> Result<(VmState, SaveMetadata), SaveError> {
    let mut data = Vec::new();
    input.read_to_end(&mut data)?;
    let mut r = Reader::new(&data);

    let metadata = SaveMetadata::decode(&mut r)?;
    let running = resources.content_version();
    if !content_compatible(&metadata.content_version, &running) {
        return Err(SaveError::IncompatibleContent {
            found: metadata.content_version,
            expected: running,
        });
    }

    let body = decode_body(&mut r, metadata.revision)?;
    debug!(
        segments = body.records.len(),
        table_len = body.table_len,
        "save body decoded"
    );
    let state = rebuild(body, resources)?;
    info!(name = %metadata.name, revision = metadata.revision, "game restored");
    Ok((state, metadata))
}

struct SaveBody {
    random_seed: u32,
    table_len: usize,
    records: Vec<(SegmentId, Record)>,
}

enum Record {
    Script(ScriptSnapshot),
    Segment(Segment),
}

fn decode_body(r: &mut Reader<'_>, revision: u16) -> Result<SaveBody, SaveError> {
    let random_seed = r.u32("random seed")?;
    let table_len = r.u32("segment table length")? as usize;
    let count = r.u32("segment count")?;
    let mut records = Vec::new();
    for _ in 0..count {
        let id = SegmentId(r.u16("segment id")?);
        let tag = r.u8("segment kind")?;
        let kind = SegmentKind::from_u8(tag)
            .ok_or_else(|| r.malformed(format!("unknown segment kind {}", tag)))?;
        if id.is_null() || id.index() >= table_len {
            return Err(r.malformed(format!("segment id {} outside table", id)));
        }
        let payload = r.bytes("segment payload")?;
        let mut pr = Reader::new(&payload);
        let record = decode_segment(&mut pr, id, kind, revision)?;
        if pr.remaining() != 0 {
            return Err(r.malformed(format!(
                "{} unread bytes in {} segment {}",
                pr.remaining(),
                kind.name(),
                id
            )));
        }
        records.push((id, record));
    }
    if r.remaining() != 0 {
        return Err(r.malformed("data after the last segment"));
    }
    Ok(SaveBody { random_seed, table_len, records })
}

/// Payload-only rebuild: non-script segments go in first so scripts can
/// find their locals, then scripts, then every object is relinked.
fn rebuild(body: SaveBody, resources: Rc<dyn GameResources>) -> Result<VmState, SaveError> {
    let heap = SegmentManager::with_table_len(body.table_len);
    let mut state = VmState::with_heap(resources, heap);
    state.random_seed = body.random_seed;

    let mut scripts = Vec::new();
    for (id, record) in body.records {
        match record {
            Record::Segment(segment) => {
                if !state.heap.insert_at(id, segment) {
                    return Err(restore_failed(id, "segment id recorded twice"));
                }
            }
            Record::Script(snapshot) => scripts.push((id, snapshot)),
        }
    }
    for (id, snapshot) in scripts {
        let number = snapshot.number;
        state
            .scripts
            .restore_script(&mut state.heap, snapshot)
            .map_err(|err| {
                warn!(script = number, segment = %id, error = %err, "script restore failed");
                restore_failed(id, err.to_string())
            })?;
    }
    state.scripts.relink_all(&mut state.heap).map_err(|err| {
        let segment = match &err {
            vm::LifecycleError::SnapshotMismatch { script, .. }
            | vm::LifecycleError::UnresolvedClass { script, .. } => state.scripts.segment_of(*script),
            _ => None,
        };
        restore_failed(segment.unwrap_or(SegmentId(0)), err.to_string())
    })?;
    Ok(state)
}

fn restore_failed(id: SegmentId, reason: impl Into<String>) -> SaveError {
    SaveError::RestoreFailed { segment: id.as_u16(), reason: reason.into() }
}

fn encode_object(w: &mut Writer, object: &Object) {
    w.u16(object.species);
    w.u16(object.superclass);
    w.u8(object.flags);
    w.reg(object.base);
    w.regs(&object.properties);
}

fn decode_object(r: &mut Reader<'_>) -> Result<Object, SaveError> {
    Ok(Object {
        species: r.u16("clone species")?,
        superclass: r.u16("clone superclass")?,
        flags: r.u8("clone flags")?,
        base: r.reg("clone base")?,
        properties: r.regs("clone properties")?,
        methods: MethodTable::EMPTY,
        species_ref: types::Reg::NULL,
        superclass_ref: types::Reg::NULL,
    })
}

fn encode_table<T>(w: &mut Writer, table: &Table<T>, mut entry: impl FnMut(&mut Writer, &T)) {
    w.u16(table.live() as u16);
    for (index, value) in table.iter() {
        w.u16(index);
        entry(w, value);
    }
}

fn decode_table<T>(
    r: &mut Reader<'_>,
    mut entry: impl FnMut(&mut Reader<'_>) -> Result<T, SaveError>,
) -> Result<Table<T>, SaveError> {
    let mut table = Table::new(MAX_TABLE_ENTRIES);
    let count = r.u16("entry count")?;
    for _ in 0..count {
        let index = r.u16("entry index")?;
        let value = entry(r)?;
        if !table.insert_at(index, value) {
            return Err(r.malformed(format!("table entry {} duplicated or out of range", index)));
        }
    }
    Ok(table)
}

fn encode_segment(w: &mut Writer, segment: &Segment) {
    match segment {
        Segment::Script(script) => {
            w.u16(script.script_number);
            w.u32(script.lockers);
            w.u16(script.locals_segment.map_or(0, SegmentId::as_u16));
            w.u16(script.dependencies.len() as u16);
            for &dependency in &script.dependencies {
                w.u16(dependency);
            }
            w.u16(script.object_count() as u16);
            for (offset, object) in script.objects() {
                w.u16(offset);
                w.regs(&object.properties);
            }
        }
        Segment::Clones(table) => encode_table(w, table, encode_object),
        Segment::Lists(table) => encode_table(w, table, |w, list: &List| {
            w.reg(list.first);
            w.reg(list.last);
        }),
        Segment::Nodes(table) => encode_table(w, table, |w, node: &Node| {
            w.reg(node.pred);
            w.reg(node.succ);
            w.reg(node.key);
            w.reg(node.value);
        }),
        Segment::Locals(locals) => {
            w.u16(locals.script_number);
            w.regs(&locals.values);
        }
        Segment::Stack(stack) => {
            w.u16(stack.capacity() as u16);
            w.u16(stack.sp() as u16);
            w.regs(stack.written());
        }
        Segment::SysStrings(strings) => {
            w.u16(strings.strings.len() as u16);
            for string in &strings.strings {
                w.string(&string.name);
                w.u16(string.max_size);
                w.short_bytes(&string.value);
            }
        }
        Segment::StringFrag(table) => encode_table(w, table, |w, bytes: &Vec<u8>| w.bytes(bytes)),
        Segment::Dynmem(mem) => {
            w.string(&mem.description);
            w.bytes(&mem.data);
        }
        // Hunks are scratch space and come back empty.
        Segment::Hunk(_) => {}
    }
}

fn decode_segment(
    r: &mut Reader<'_>,
    id: SegmentId,
    kind: SegmentKind,
    revision: u16,
) -> Result<Record, SaveError> {
    let segment = match kind {
        SegmentKind::Script => {
            let number = r.u16("script number")?;
            let lockers = r.u32("locker count")?;
            let locals = r.u16("locals segment")?;
            let dependency_count = r.u16("dependency count")?;
            let dependencies = (0..dependency_count)
                .map(|_| r.u16("dependency"))
                .collect::<Result<Vec<_>, _>>()?;
            let object_count = r.u16("object count")?;
            let mut objects = Vec::with_capacity(object_count as usize);
            for _ in 0..object_count {
                let offset = r.u16("object offset")?;
                objects.push((offset, r.regs("object properties")?));
            }
            return Ok(Record::Script(ScriptSnapshot {
                number,
                segment: id,
                lockers,
                locals_segment: (locals != 0).then_some(SegmentId(locals)),
                dependencies,
                objects,
            }));
        }
        SegmentKind::Clones => Segment::Clones(decode_table(r, decode_object)?),
        SegmentKind::Lists => Segment::Lists(decode_table(r, |r| {
            Ok(List { first: r.reg("list first")?, last: r.reg("list last")? })
        })?),
        SegmentKind::Nodes => Segment::Nodes(decode_table(r, |r| {
            Ok(Node {
                pred: r.reg("node pred")?,
                succ: r.reg("node succ")?,
                key: r.reg("node key")?,
                value: r.reg("node value")?,
            })
        })?),
        SegmentKind::Locals => {
            let script_number = r.u16("locals script")?;
            Segment::Locals(LocalVariables::new(script_number, r.regs("local values")?))
        }
        SegmentKind::Stack => {
            let capacity = r.u16("stack capacity")? as usize;
            let sp = if revision >= REVISION_STACK_POINTER {
                Some(r.u16("stack pointer")? as usize)
            } else {
                None
            };
            let written = r.regs("stack contents")?;
            let sp = sp.unwrap_or(written.len());
            let stack = DataStack::from_parts(capacity, sp, written)
                .ok_or_else(|| r.malformed("stack pointer or contents exceed capacity"))?;
            Segment::Stack(stack)
        }
        SegmentKind::SysStrings => {
            let count = r.u16("system string count")?;
            let mut strings = SystemStrings::default();
            for _ in 0..count {
                strings.strings.push(SystemString {
                    name: r.string("system string name")?,
                    max_size: r.u16("system string size")?,
                    value: r.short_bytes("system string value")?,
                });
            }
            Segment::SysStrings(strings)
        }
        SegmentKind::StringFrag => {
            Segment::StringFrag(decode_table(r, |r| {
                if revision >= REVISION_WIDE_FRAGMENTS {
                    r.bytes("string fragment")
                } else {
                    r.short_bytes("string fragment")
                }
            })?)
        }
        SegmentKind::Dynmem => {
            let description = r.string("dynmem description")?;
            let data = r.bytes("dynmem data")?;
            Segment::Dynmem(DynMem { description, data })
        }
        SegmentKind::Hunk => Segment::Hunk(Table::new(MAX_TABLE_ENTRIES)),
    };
    Ok(Record::Segment(segment))
}
