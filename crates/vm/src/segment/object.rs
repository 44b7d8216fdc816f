use types::{Reg, SegmentId};

/// Marks the first word of every object record in a script resource.
pub const OBJECT_MAGIC: u16 = 0x1234;

/// Object flag: the record defines a class rather than an instance.
pub const INFO_CLASS: u8 = 0x01;
/// Object flag: the object lives in a clone pool.
pub const INFO_CLONE: u8 = 0x02;

/// Species value meaning "no superclass".
pub const NO_SUPERCLASS: u16 = 0xffff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Method {
    pub selector: u16,
    pub code_offset: u16,
}

/// Location of an object's method table inside its script's byte-code.
/// Derived from the byte-code at load time and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodTable {
    pub segment: SegmentId,
    pub offset: u16,
    pub count: u16,
}

impl MethodTable {
    pub const EMPTY: MethodTable = MethodTable {
        segment: SegmentId(0),
        offset: 0,
        count: 0,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    /// Class table index of the class this object belongs to (or defines).
    pub species: u16,
    /// Class table index of the parent class, `NO_SUPERCLASS` for roots.
    pub superclass: u16,
    pub flags: u8,
    pub properties: Vec<Reg>,
    pub methods: MethodTable,
    /// The script object this one was loaded as or cloned from.
    pub base: Reg,
    /// Resolved class object for `species`; null until linked.
    pub species_ref: Reg,
    /// Resolved class object for `superclass`; null for roots or until linked.
    pub superclass_ref: Reg,
}

impl Object {
    pub fn is_class(&self) -> bool {
        self.flags & INFO_CLASS != 0
    }

    pub fn is_clone(&self) -> bool {
        self.flags & INFO_CLONE != 0
    }

    pub fn has_superclass(&self) -> bool {
        self.superclass != NO_SUPERCLASS
    }

    pub fn property(&self, index: usize) -> Option<Reg> {
        self.properties.get(index).copied()
    }

    pub fn set_property(&mut self, index: usize, value: Reg) -> bool {
        match self.properties.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Copy used for a new clone: same species and layout, instance flags,
    /// links cleared until the clone is resolved against the class table.
    pub fn to_clone(&self) -> Object {
        Object {
            species: self.species,
            superclass: self.superclass,
            flags: (self.flags & !INFO_CLASS) | INFO_CLONE,
            properties: self.properties.clone(),
            methods: self.methods,
            base: self.base,
            species_ref: self.species_ref,
            superclass_ref: self.superclass_ref,
        }
    }
}
