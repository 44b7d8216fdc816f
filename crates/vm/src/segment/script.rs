use std::collections::BTreeMap;

use types::{Handle, Reg, SegmentId};

use super::object::{Method, MethodTable, Object};
use crate::script_loader::ScriptImage;

/// A loaded script: its resource bytes, the objects declared in them, and
/// the bookkeeping the lifecycle manager needs to share and unload it.
#[derive(Debug, Clone)]
pub struct ScriptSegment {
    pub script_number: u16,
    buf: Vec<u8>,
    objects: BTreeMap<u16, Object>,
    pub locals_segment: Option<SegmentId>,
    /// Number of owners keeping this script resident.
    pub lockers: u32,
    pub marked_deleted: bool,
    /// Scripts this one holds a locker on because it links to their classes.
    pub dependencies: Vec<u16>,
    code_offset: u16,
    code_len: u16,
}

impl ScriptSegment {
    pub fn empty(script_number: u16) -> Self {
        Self {
            script_number,
            buf: Vec::new(),
            objects: BTreeMap::new(),
            locals_segment: None,
            lockers: 0,
            marked_deleted: false,
            dependencies: Vec::new(),
            code_offset: 0,
            code_len: 0,
        }
    }

    /// Builds the segment for `image` living at `segment`. Properties start
    /// as the integers stored in the resource; class links start null.
    pub fn from_image(
        script_number: u16,
        segment: SegmentId,
        buf: Vec<u8>,
        image: &ScriptImage,
        locals_segment: Option<SegmentId>,
    ) -> Self {
        let objects = image
            .objects
            .iter()
            .map(|template| {
                let object = Object {
                    species: template.species,
                    superclass: template.superclass,
                    flags: template.flags,
                    properties: template.properties.iter().map(|&v| Reg::Int(v)).collect(),
                    methods: MethodTable {
                        segment,
                        offset: template.method_table_offset,
                        count: template.methods.len() as u16,
                    },
                    base: Reg::ptr(segment, template.offset),
                    species_ref: Reg::NULL,
                    superclass_ref: Reg::NULL,
                };
                (template.offset, object)
            })
            .collect();
        Self {
            script_number,
            buf,
            objects,
            locals_segment,
            lockers: 1,
            marked_deleted: false,
            dependencies: Vec::new(),
            code_offset: image.code_offset,
            code_len: image.code_len,
        }
    }

    pub fn buf(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn code(&self) -> &[u8] {
        let start = self.code_offset as usize;
        &self.buf[start..start + self.code_len as usize]
    }

    pub fn in_bounds(&self, offset: u16) -> bool {
        (offset as usize) < self.buf.len()
    }

    pub fn is_object_offset(&self, offset: u16) -> bool {
        self.objects.contains_key(&offset)
    }

    pub fn object(&self, offset: u16) -> Option<&Object> {
        self.objects.get(&offset)
    }

    pub fn object_mut(&mut self, offset: u16) -> Option<&mut Object> {
        self.objects.get_mut(&offset)
    }

    pub fn objects(&self) -> impl Iterator<Item = (u16, &Object)> {
        self.objects.iter().map(|(&offset, object)| (offset, object))
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = (u16, &mut Object)> {
        self.objects.iter_mut().map(|(&offset, object)| (offset, object))
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Object at position `index` in declaration order.
    pub fn nth_object(&self, index: usize) -> Option<u16> {
        self.objects.keys().nth(index).copied()
    }

    /// `(species, address)` for every class this script defines.
    pub fn classes(&self, segment: SegmentId) -> Vec<(u16, Handle)> {
        self.objects
            .iter()
            .filter(|(_, object)| object.is_class())
            .map(|(&offset, object)| (object.species, Handle::new(segment, offset)))
            .collect()
    }

    /// Decodes a method table straight from the byte-code.
    pub fn methods(&self, table: &MethodTable) -> Vec<Method> {
        let mut methods = Vec::with_capacity(table.count as usize);
        let start = table.offset as usize + 2;
        for index in 0..table.count as usize {
            let at = start + index * 4;
            let Some(entry) = self.buf.get(at..at + 4) else {
                break;
            };
            methods.push(Method {
                selector: u16::from_le_bytes([entry[0], entry[1]]),
                code_offset: u16::from_le_bytes([entry[2], entry[3]]),
            });
        }
        methods
    }

    /// Bytes from `offset` up to the first NUL or the end of the buffer.
    pub fn cstring(&self, offset: u16) -> Option<&[u8]> {
        let tail = self.buf.get(offset as usize..)?;
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        Some(&tail[..end])
    }
}
