//! Parser for script resources, plus a builder used by tests and tooling.
//!
//! Layout (little-endian):
//!
//! ```text
//! u16 local_count, local_count x u16 initial values
//! u16 object_count
//! per object:
//!   u16 magic (0x1234)       <- object address
//!   u16 species
//!   u16 superclass           (0xffff = none)
//!   u8  flags                (bit 0 = class)
//!   u16 property_count, property_count x u16
//!   u16 method_count         <- method table address
//!   method_count x (u16 selector, u16 code offset)
//! u16 code_len, code bytes
//! ```

use thiserror::Error;

use crate::segment::object::{Method, NO_SUPERCLASS, OBJECT_MAGIC, INFO_CLASS};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptParseError {
    #[error("resource truncated at byte {at} while reading {what}")]
    Truncated { at: usize, what: &'static str },
    #[error("bad object magic 0x{found:04x} at byte {at}")]
    BadMagic { at: usize, found: u16 },
    #[error("resource is {len} bytes, larger than a segment can address")]
    TooLarge { len: usize },
    #[error("{extra} trailing bytes after code block")]
    TrailingBytes { extra: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectTemplate {
    pub offset: u16,
    pub species: u16,
    pub superclass: u16,
    pub flags: u8,
    pub properties: Vec<u16>,
    pub method_table_offset: u16,
    pub methods: Vec<Method>,
}

impl ObjectTemplate {
    pub fn is_class(&self) -> bool {
        self.flags & INFO_CLASS != 0
    }
}

/// Static layout of a script resource. Parsing is pure: the same bytes
/// always yield the same image, which is what lets restore re-derive
/// method tables and object addresses from the script number alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptImage {
    pub locals: Vec<u16>,
    pub objects: Vec<ObjectTemplate>,
    pub code_offset: u16,
    pub code_len: u16,
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn u8(&mut self, what: &'static str) -> Result<u8, ScriptParseError> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or(ScriptParseError::Truncated { at: self.pos, what })?;
        self.pos += 1;
        Ok(byte)
    }

    fn u16(&mut self, what: &'static str) -> Result<u16, ScriptParseError> {
        let bytes = self
            .data
            .get(self.pos..self.pos + 2)
            .ok_or(ScriptParseError::Truncated { at: self.pos, what })?;
        self.pos += 2;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn skip(&mut self, len: usize, what: &'static str) -> Result<(), ScriptParseError> {
        if self.pos + len > self.data.len() {
            return Err(ScriptParseError::Truncated { at: self.pos, what });
        }
        self.pos += len;
        Ok(())
    }
}

impl ScriptImage {
    pub fn parse(data: &[u8]) -> Result<Self, ScriptParseError> {
        if data.len() > u16::MAX as usize {
            return Err(ScriptParseError::TooLarge { len: data.len() });
        }
        let mut cur = Cursor { data, pos: 0 };

        let local_count = cur.u16("local count")?;
        let mut locals = Vec::with_capacity(local_count as usize);
        for _ in 0..local_count {
            locals.push(cur.u16("local value")?);
        }

        let object_count = cur.u16("object count")?;
        let mut objects = Vec::with_capacity(object_count as usize);
        for _ in 0..object_count {
            let offset = cur.pos;
            let magic = cur.u16("object magic")?;
            if magic != OBJECT_MAGIC {
                return Err(ScriptParseError::BadMagic { at: offset, found: magic });
            }
            let species = cur.u16("species")?;
            let superclass = cur.u16("superclass")?;
            let flags = cur.u8("object flags")?;
            let property_count = cur.u16("property count")?;
            let mut properties = Vec::with_capacity(property_count as usize);
            for _ in 0..property_count {
                properties.push(cur.u16("property value")?);
            }
            let method_table_offset = cur.pos as u16;
            let method_count = cur.u16("method count")?;
            let mut methods = Vec::with_capacity(method_count as usize);
            for _ in 0..method_count {
                let selector = cur.u16("method selector")?;
                let code_offset = cur.u16("method offset")?;
                methods.push(Method { selector, code_offset });
            }
            objects.push(ObjectTemplate {
                offset: offset as u16,
                species,
                superclass,
                flags,
                properties,
                method_table_offset,
                methods,
            });
        }

        let code_len = cur.u16("code length")?;
        let code_offset = cur.pos as u16;
        cur.skip(code_len as usize, "code")?;
        if cur.pos != data.len() {
            return Err(ScriptParseError::TrailingBytes {
                extra: data.len() - cur.pos,
            });
        }

        Ok(Self {
            locals,
            objects,
            code_offset,
            code_len,
        })
    }

    pub fn object_at(&self, offset: u16) -> Option<&ObjectTemplate> {
        self.objects.iter().find(|object| object.offset == offset)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ObjectTemplate> {
        self.objects.iter().filter(|object| object.is_class())
    }
}

/// Assembles script resources in the format [`ScriptImage::parse`] reads.
#[derive(Debug, Clone, Default)]
pub struct ScriptBuilder {
    locals: Vec<u16>,
    objects: Vec<(u16, u16, u8, Vec<u16>, Vec<Method>)>,
    code: Vec<u8>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn locals(mut self, values: &[u16]) -> Self {
        self.locals = values.to_vec();
        self
    }

    /// Adds a class definition for `species`.
    pub fn class(
        mut self,
        species: u16,
        superclass: Option<u16>,
        properties: &[u16],
        methods: &[(u16, u16)],
    ) -> Self {
        self.objects.push((
            species,
            superclass.unwrap_or(NO_SUPERCLASS),
            INFO_CLASS,
            properties.to_vec(),
            methods
                .iter()
                .map(|&(selector, code_offset)| Method { selector, code_offset })
                .collect(),
        ));
        self
    }

    /// Adds an instance of `species`; its superclass link is the class itself.
    pub fn instance(mut self, species: u16, properties: &[u16]) -> Self {
        self.objects
            .push((species, species, 0, properties.to_vec(), Vec::new()));
        self
    }

    pub fn code(mut self, code: &[u8]) -> Self {
        self.code = code.to_vec();
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(self.locals.len() as u16).to_le_bytes());
        for value in &self.locals {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out.extend_from_slice(&(self.objects.len() as u16).to_le_bytes());
        for (species, superclass, flags, properties, methods) in &self.objects {
            out.extend_from_slice(&OBJECT_MAGIC.to_le_bytes());
            out.extend_from_slice(&species.to_le_bytes());
            out.extend_from_slice(&superclass.to_le_bytes());
            out.push(*flags);
            out.extend_from_slice(&(properties.len() as u16).to_le_bytes());
            for value in properties {
                out.extend_from_slice(&value.to_le_bytes());
            }
            out.extend_from_slice(&(methods.len() as u16).to_le_bytes());
            for method in methods {
                out.extend_from_slice(&method.selector.to_le_bytes());
                out.extend_from_slice(&method.code_offset.to_le_bytes());
            }
        }
        out.extend_from_slice(&(self.code.len() as u16).to_le_bytes());
        out.extend_from_slice(&self.code);
        out
    }
}
