use types::Reg;

/// Local variable block of one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariables {
    pub script_number: u16,
    pub values: Vec<Reg>,
}

impl LocalVariables {
    pub fn new(script_number: u16, values: Vec<Reg>) -> Self {
        Self { script_number, values }
    }

    pub fn get(&self, index: u16) -> Option<Reg> {
        self.values.get(index as usize).copied()
    }

    pub fn set(&mut self, index: u16, value: Reg) -> bool {
        match self.values.get_mut(index as usize) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

/// Operand stack of the interpreter loop. Slots at or above the
/// high-water mark have never been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataStack {
    slots: Vec<Reg>,
    sp: usize,
    high_water: usize,
}

impl DataStack {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Reg::NULL; capacity.min(u16::MAX as usize)],
            sp: 0,
            high_water: 0,
        }
    }

    /// Rebuilds a stack from persisted contents. `sp` may not pass the
    /// high-water mark.
    pub fn from_parts(capacity: usize, sp: usize, written: Vec<Reg>) -> Option<Self> {
        let mut stack = Self::new(capacity);
        if written.len() > stack.slots.len() || sp > written.len() {
            return None;
        }
        stack.high_water = written.len();
        stack.sp = sp;
        stack.slots[..written.len()].copy_from_slice(&written);
        Some(stack)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn sp(&self) -> usize {
        self.sp
    }

    pub fn high_water(&self) -> usize {
        self.high_water
    }

    pub fn written(&self) -> &[Reg] {
        &self.slots[..self.high_water]
    }

    pub fn push(&mut self, value: Reg) -> Option<u16> {
        if self.sp >= self.slots.len() {
            return None;
        }
        let slot = self.sp;
        self.slots[slot] = value;
        self.sp += 1;
        self.high_water = self.high_water.max(self.sp);
        Some(slot as u16)
    }

    pub fn pop(&mut self) -> Option<Reg> {
        if self.sp == 0 {
            return None;
        }
        self.sp -= 1;
        Some(self.slots[self.sp])
    }

    pub fn get(&self, slot: u16) -> Option<Reg> {
        let slot = slot as usize;
        if slot < self.high_water {
            Some(self.slots[slot])
        } else {
            None
        }
    }

    pub fn is_written(&self, slot: u16) -> bool {
        (slot as usize) < self.high_water
    }

    pub fn in_bounds(&self, slot: u16) -> bool {
        (slot as usize) < self.slots.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemString {
    pub name: String,
    pub max_size: u16,
    pub value: Vec<u8>,
}

/// Fixed set of interpreter-owned strings (save directory, parser buffer, ...).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemStrings {
    pub strings: Vec<SystemString>,
}

impl SystemStrings {
    pub const SAVE_DIR: u16 = 0;
    pub const PARSER_BASE: u16 = 1;
    pub const GAME_ID: u16 = 2;

    pub fn with_defaults(game_id: &str) -> Self {
        let mut strings = Self::default();
        strings.add("savedir", 256, b"");
        strings.add("parser-base", 256, b"");
        strings.add("game-id", 64, game_id.as_bytes());
        strings
    }

    pub fn add(&mut self, name: &str, max_size: u16, value: &[u8]) -> u16 {
        let mut value = value.to_vec();
        value.truncate(max_size as usize);
        self.strings.push(SystemString {
            name: name.to_string(),
            max_size,
            value,
        });
        (self.strings.len() - 1) as u16
    }

    pub fn get(&self, index: u16) -> Option<&SystemString> {
        self.strings.get(index as usize)
    }

    pub fn set(&mut self, index: u16, value: &[u8]) -> bool {
        match self.strings.get_mut(index as usize) {
            Some(string) => {
                let len = value.len().min(string.max_size as usize);
                string.value = value[..len].to_vec();
                true
            }
            None => false,
        }
    }
}

/// Raw scratch buffer with a human-readable purpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynMem {
    pub description: String,
    pub data: Vec<u8>,
}

impl DynMem {
    pub fn new(description: &str, size: usize) -> Self {
        Self {
            description: description.to_string(),
            data: vec![0; size.min(u16::MAX as usize)],
        }
    }
}
