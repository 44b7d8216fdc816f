use tracing::debug;
use storage::{GameResources, NO_SCRIPT};
use types::{Reg, SegmentId};

use crate::script_loader::ScriptImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassEntry {
    /// Script that defines this species, `NO_SCRIPT` for unused slots.
    pub script: u16,
    /// The class object, null while the defining script is not resident.
    pub reg: Reg,
}

/// Dense species-number to class-object table.
///
/// Owned by the script lifecycle manager. Only the defining script numbers
/// are authoritative; the resolved references are rebuilt whenever a
/// defining script loads, so a restored heap re-derives them from scratch.
#[derive(Debug, Clone, Default)]
pub struct ClassTable {
    entries: Vec<ClassEntry>,
}

impl ClassTable {
    pub fn new(scripts_by_species: &[u16]) -> Self {
        Self {
            entries: scripts_by_species
                .iter()
                .map(|&script| ClassEntry { script, reg: Reg::NULL })
                .collect(),
        }
    }

    /// Uses the game's class-table resource, or discovers the table by
    /// scanning every script resource for class definitions.
    pub fn from_resources(resources: &dyn GameResources) -> Self {
        if let Some(table) = resources.class_table() {
            return Self::new(&table);
        }
        let mut scripts_by_species: Vec<u16> = Vec::new();
        for number in resources.script_numbers() {
            let Some(bytes) = resources.load_script(number) else {
                continue;
            };
            let Ok(image) = ScriptImage::parse(&bytes) else {
                debug!(script = number, "skipping unparsable script during class scan");
                continue;
            };
            for class in image.classes() {
                let species = class.species as usize;
                if scripts_by_species.len() <= species {
                    scripts_by_species.resize(species + 1, NO_SCRIPT);
                }
                scripts_by_species[species] = number;
            }
        }
        debug!(classes = scripts_by_species.len(), "built class table by scanning scripts");
        Self::new(&scripts_by_species)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, species: u16) -> Option<&ClassEntry> {
        self.entries.get(species as usize)
    }

    pub fn defining_script(&self, species: u16) -> Option<u16> {
        self.get(species)
            .map(|entry| entry.script)
            .filter(|&script| script != NO_SCRIPT)
    }

    /// The class object for `species` if its defining script has been loaded.
    pub fn resolve(&self, species: u16) -> Option<Reg> {
        self.get(species)
            .map(|entry| entry.reg)
            .filter(|reg| !reg.is_null())
    }

    pub fn set(&mut self, species: u16, reg: Reg) -> bool {
        match self.entries.get_mut(species as usize) {
            Some(entry) => {
                entry.reg = reg;
                true
            }
            None => false,
        }
    }

    /// Nulls every entry resolved into `segment`; returns how many were cleared.
    pub fn clear_segment(&mut self, segment: SegmentId) -> usize {
        let mut cleared = 0;
        for entry in &mut self.entries {
            if entry.reg.segment() == segment && !entry.reg.is_int() {
                entry.reg = Reg::NULL;
                cleared += 1;
            }
        }
        cleared
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &ClassEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(species, entry)| (species as u16, entry))
    }
}
