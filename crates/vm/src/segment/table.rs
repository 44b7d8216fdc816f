/// Slot table used by the pooled segment kinds (clones, lists, nodes,
/// hunks, string fragments). An entry's offset is its slot index.
#[derive(Debug, Clone)]
pub struct Table<T> {
    entries: Vec<Option<T>>,
    free: Vec<u16>,
    live: usize,
    max_entries: usize,
}

impl<T> Table<T> {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            live: 0,
            max_entries: max_entries.min(u16::MAX as usize),
        }
    }

    /// Stores `value` in a free slot, growing the table when none is left.
    /// Returns `None` once the table holds `max_entries` live values.
    pub fn alloc(&mut self, value: T) -> Option<u16> {
        if let Some(index) = self.free.pop() {
            self.entries[index as usize] = Some(value);
            self.live += 1;
            return Some(index);
        }
        if self.entries.len() >= self.max_entries {
            return None;
        }
        let index = self.entries.len() as u16;
        self.entries.push(Some(value));
        self.live += 1;
        Some(index)
    }

    /// Places `value` at a fixed slot. Used when rebuilding a table from a
    /// snapshot; fails if the slot is already occupied.
    pub fn insert_at(&mut self, index: u16, value: T) -> bool {
        let slot = index as usize;
        if slot >= self.max_entries {
            return false;
        }
        while self.entries.len() <= slot {
            self.free.push(self.entries.len() as u16);
            self.entries.push(None);
        }
        if self.entries[slot].is_some() {
            return false;
        }
        self.free.retain(|&free| free != index);
        self.entries[slot] = Some(value);
        self.live += 1;
        true
    }

    pub fn free(&mut self, index: u16) -> Option<T> {
        let value = self.entries.get_mut(index as usize)?.take()?;
        self.free.push(index);
        self.live -= 1;
        Some(value)
    }

    pub fn get(&self, index: u16) -> Option<&T> {
        self.entries.get(index as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, index: u16) -> Option<&mut T> {
        self.entries.get_mut(index as usize)?.as_mut()
    }

    pub fn is_valid(&self, index: u16) -> bool {
        self.get(index).is_some()
    }

    pub fn live(&self) -> usize {
        self.live
    }

    pub fn is_full(&self) -> bool {
        self.free.is_empty() && self.entries.len() >= self.max_entries
    }

    /// Slots handed out so far, live or free.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| entry.as_ref().map(|value| (index as u16, value)))
    }
}
