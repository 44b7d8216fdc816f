//! Loading, sharing and unloading of script segments.
//!
//! A script is resident while its locker count is positive. Each
//! `instantiate` adds one locker, each `release` removes one, and the
//! transition to zero unloads the script: its class-table entries are
//! cleared, its locals segment and script segment are freed, and the
//! lockers it held on superclass scripts are released in turn.

use std::collections::{BTreeMap, BTreeSet};
use std::mem;
use std::rc::Rc;

use storage::GameResources;
use tracing::{debug, warn};
use types::{Reg, SegmentId, SegmentKind};

use crate::class_table::ClassTable;
use crate::error::LifecycleError;
use crate::script_loader::ScriptImage;
use crate::segment::object::NO_SUPERCLASS;
use crate::segment::{LocalVariables, ScriptSegment, Segment};
use crate::segment_manager::SegmentManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptState {
    Unloaded,
    Loading,
    Resident,
}

/// Persisted view of one resident script, consumed by [`ScriptManager::restore_script`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSnapshot {
    pub number: u16,
    pub segment: SegmentId,
    pub lockers: u32,
    pub locals_segment: Option<SegmentId>,
    pub dependencies: Vec<u16>,
    /// `(object offset, property values)` for every object in the script.
    pub objects: Vec<(u16, Vec<Reg>)>,
}

#[derive(Debug, Clone)]
pub struct ScriptManager {
    resources: Rc<dyn GameResources>,
    class_table: ClassTable,
    loaded: BTreeMap<u16, SegmentId>,
    loading: BTreeSet<u16>,
}

impl ScriptManager {
    pub fn new(resources: Rc<dyn GameResources>) -> Self {
        let class_table = ClassTable::from_resources(resources.as_ref());
        Self::with_class_table(resources, class_table)
    }

    pub fn with_class_table(resources: Rc<dyn GameResources>, class_table: ClassTable) -> Self {
        Self {
            resources,
            class_table,
            loaded: BTreeMap::new(),
            loading: BTreeSet::new(),
        }
    }

    pub fn resources(&self) -> &Rc<dyn GameResources> {
        &self.resources
    }

    pub fn class_table(&self) -> &ClassTable {
        &self.class_table
    }

    pub fn segment_of(&self, number: u16) -> Option<SegmentId> {
        self.loaded.get(&number).copied()
    }

    /// `(script number, segment)` for every resident script, by number.
    pub fn loaded(&self) -> impl Iterator<Item = (u16, SegmentId)> + '_ {
        self.loaded.iter().map(|(&number, &id)| (number, id))
    }

    pub fn lockers(&self, heap: &SegmentManager, number: u16) -> u32 {
        self.segment_of(number)
            .and_then(|id| heap.script(id))
            .map_or(0, |script| script.lockers)
    }

    pub fn state(&self, heap: &SegmentManager, number: u16) -> ScriptState {
        if self.loading.contains(&number) {
            return ScriptState::Loading;
        }
        match self.segment_of(number).and_then(|id| heap.script(id)) {
            Some(script) if !script.marked_deleted => ScriptState::Resident,
            _ => ScriptState::Unloaded,
        }
    }

    /// Script number that defines the class of the object at `reg`.
    pub fn defining_script(&self, heap: &SegmentManager, reg: Reg) -> Option<u16> {
        let object = heap.object(reg)?;
        self.class_table.defining_script(object.species)
    }

    /// Makes `number` resident and takes one locker on it.
    pub fn instantiate(
        &mut self,
        heap: &mut SegmentManager,
        number: u16,
    ) -> Result<SegmentId, LifecycleError> {
        if let Some(&id) = self.loaded.get(&number) {
            match heap.script_mut(id) {
                Some(script) if !script.marked_deleted => {
                    script.lockers += 1;
                    debug!(script = number, segment = %id, lockers = script.lockers, "script locked");
                    return Ok(id);
                }
                _ => {
                    debug!(script = number, segment = %id, "discarding deleted script copy");
                    self.discard(heap, number, id);
                }
            }
        }

        let bytes = self
            .resources
            .load_script(number)
            .ok_or(LifecycleError::ScriptNotFound { script: number })?;
        let image = ScriptImage::parse(&bytes)
            .map_err(|source| LifecycleError::MalformedScript { script: number, source })?;

        self.loading.insert(number);
        let result = self.load(heap, number, bytes, &image);
        self.loading.remove(&number);
        result
    }

    fn load(
        &mut self,
        heap: &mut SegmentManager,
        number: u16,
        bytes: Vec<u8>,
        image: &ScriptImage,
    ) -> Result<SegmentId, LifecycleError> {
        let locals_segment = if image.locals.is_empty() {
            None
        } else {
            let values = image.locals.iter().map(|&v| Reg::Int(v)).collect();
            let locals = Segment::Locals(LocalVariables::new(number, values));
            Some(
                heap.insert(locals)
                    .ok_or(LifecycleError::OutOfSegments { script: number })?,
            )
        };

        let inserted = heap.insert_with(|id| {
            Segment::Script(ScriptSegment::from_image(number, id, bytes, image, locals_segment))
        });
        let Some(id) = inserted else {
            if let Some(locals) = locals_segment {
                heap.free(locals);
            }
            return Err(LifecycleError::OutOfSegments { script: number });
        };
        self.loaded.insert(number, id);

        // Pass 1 registers every class so objects of this script can link to
        // classes declared later in the same resource; pass 2 links.
        let linked = self
            .register_classes(heap, number, id)
            .and_then(|_| self.link_objects(heap, number, id));
        if let Err(err) = linked {
            warn!(script = number, error = %err, "script load failed; rolling back");
            self.unload(heap, number, id);
            return Err(err);
        }

        debug!(script = number, segment = %id, objects = image.objects.len(), "script instantiated");
        Ok(id)
    }

    fn register_classes(
        &mut self,
        heap: &SegmentManager,
        number: u16,
        id: SegmentId,
    ) -> Result<(), LifecycleError> {
        let script = heap
            .script(id)
            .ok_or(LifecycleError::ScriptNotFound { script: number })?;
        for (species, handle) in script.classes(id) {
            match self.class_table.defining_script(species) {
                Some(owner) if owner == number => {
                    self.class_table.set(species, handle.into());
                }
                Some(owner) => {
                    return Err(LifecycleError::ForeignClass {
                        script: number,
                        species,
                        expected: owner,
                    });
                }
                None => return Err(LifecycleError::UnresolvedClass { species, script: number }),
            }
        }
        Ok(())
    }

    fn link_objects(
        &mut self,
        heap: &mut SegmentManager,
        number: u16,
        id: SegmentId,
    ) -> Result<(), LifecycleError> {
        let wanted: Vec<(u16, u16, u16)> = heap
            .script(id)
            .ok_or(LifecycleError::ScriptNotFound { script: number })?
            .objects()
            .map(|(offset, object)| (offset, object.species, object.superclass))
            .collect();

        for &(_, species, superclass) in &wanted {
            self.acquire_owner(heap, number, id, species)?;
            if superclass != NO_SUPERCLASS {
                self.acquire_owner(heap, number, id, superclass)?;
            }
        }

        let mut links = Vec::with_capacity(wanted.len());
        for (offset, species, superclass) in wanted {
            links.push((offset, self.resolve_links(number, species, superclass)?));
        }
        if let Some(script) = heap.script_mut(id) {
            for (offset, (species_ref, superclass_ref)) in links {
                if let Some(object) = script.object_mut(offset) {
                    object.species_ref = species_ref;
                    object.superclass_ref = superclass_ref;
                }
            }
        }
        Ok(())
    }

    /// Makes sure the script defining `species` is resident, taking a
    /// locker on it on behalf of script `number` the first time.
    ///
    /// An owner that is itself still loading (two scripts using each
    /// other's classes) is already registered at its segment, so the
    /// locker goes straight onto that segment instead of recursing.
    fn acquire_owner(
        &mut self,
        heap: &mut SegmentManager,
        number: u16,
        id: SegmentId,
        species: u16,
    ) -> Result<(), LifecycleError> {
        let owner = self
            .class_table
            .defining_script(species)
            .ok_or(LifecycleError::UnresolvedClass { species, script: number })?;
        if owner == number {
            return Ok(());
        }
        let already_held = heap
            .script(id)
            .is_some_and(|script| script.dependencies.contains(&owner));
        if already_held {
            return Ok(());
        }
        if self.loading.contains(&owner) {
            let owner_script = self
                .loaded
                .get(&owner)
                .and_then(|&owner_id| heap.script_mut(owner_id))
                .ok_or(LifecycleError::ScriptNotFound { script: owner })?;
            owner_script.lockers += 1;
            debug!(script = number, owner, lockers = owner_script.lockers, "locked a script that is still loading");
        } else {
            self.instantiate(heap, owner)?;
        }
        if let Some(script) = heap.script_mut(id) {
            script.dependencies.push(owner);
        }
        Ok(())
    }

    fn resolve_links(
        &self,
        number: u16,
        species: u16,
        superclass: u16,
    ) -> Result<(Reg, Reg), LifecycleError> {
        let species_ref = self
            .class_table
            .resolve(species)
            .ok_or(LifecycleError::UnresolvedClass { species, script: number })?;
        let superclass_ref = if superclass == NO_SUPERCLASS {
            Reg::NULL
        } else {
            self.class_table
                .resolve(superclass)
                .ok_or(LifecycleError::UnresolvedClass { species: superclass, script: number })?
        };
        Ok((species_ref, superclass_ref))
    }

    /// Drops one locker on `number`, unloading it when none remain.
    /// Releasing a script that holds no lockers is refused.
    pub fn release(
        &mut self,
        heap: &mut SegmentManager,
        number: u16,
    ) -> Result<ScriptState, LifecycleError> {
        let Some(&id) = self.loaded.get(&number) else {
            warn!(script = number, "release of a script that is not resident");
            return Err(LifecycleError::DoubleRelease { script: number, lockers: 0 });
        };
        let Some(script) = heap.script_mut(id) else {
            return Err(LifecycleError::DoubleRelease { script: number, lockers: 0 });
        };
        if script.lockers == 0 || script.marked_deleted {
            warn!(script = number, lockers = script.lockers, "release refused");
            return Err(LifecycleError::DoubleRelease {
                script: number,
                lockers: script.lockers,
            });
        }
        script.lockers -= 1;
        if script.lockers > 0 {
            debug!(script = number, lockers = script.lockers, "script unlocked");
            return Ok(ScriptState::Resident);
        }
        self.unload(heap, number, id);
        Ok(ScriptState::Unloaded)
    }

    fn unload(&mut self, heap: &mut SegmentManager, number: u16, id: SegmentId) {
        let dependencies = match heap.script_mut(id) {
            Some(script) => {
                script.marked_deleted = true;
                mem::take(&mut script.dependencies)
            }
            None => Vec::new(),
        };
        self.discard(heap, number, id);
        // Only a rolled-back load can leave other scripts listing this one.
        let remaining: Vec<SegmentId> = self.loaded.values().copied().collect();
        for other in remaining {
            if let Some(script) = heap.script_mut(other) {
                script.dependencies.retain(|&dependency| dependency != number);
            }
        }
        debug!(script = number, segment = %id, "script unloaded");
        for dependency in dependencies {
            if let Err(err) = self.release(heap, dependency) {
                warn!(script = number, dependency, error = %err, "failed to release superclass script");
            }
        }
    }

    /// Frees a script's segments and class entries without touching the
    /// lockers it holds on other scripts.
    fn discard(&mut self, heap: &mut SegmentManager, number: u16, id: SegmentId) {
        self.class_table.clear_segment(id);
        if let Some(locals) = heap.script(id).and_then(|script| script.locals_segment) {
            heap.free(locals);
        }
        heap.free(id);
        self.loaded.remove(&number);
    }

    /// Rebuilds one script from a snapshot: reloads its byte-code, replays
    /// the static parse at the persisted segment id, restores property
    /// values and registers its classes. Objects are linked afterwards by
    /// [`relink_all`](Self::relink_all), once every script is back.
    pub fn restore_script(
        &mut self,
        heap: &mut SegmentManager,
        snapshot: ScriptSnapshot,
    ) -> Result<(), LifecycleError> {
        let number = snapshot.number;
        let mismatch = |reason: String| LifecycleError::SnapshotMismatch { script: number, reason };

        let bytes = self
            .resources
            .load_script(number)
            .ok_or(LifecycleError::ScriptNotFound { script: number })?;
        let image = ScriptImage::parse(&bytes)
            .map_err(|source| LifecycleError::MalformedScript { script: number, source })?;

        match snapshot.locals_segment {
            Some(locals) => match heap.get(locals) {
                Some(Segment::Locals(block)) if block.script_number == number => {}
                _ => return Err(mismatch(format!("locals segment {} missing", locals))),
            },
            None if !image.locals.is_empty() => {
                return Err(mismatch(String::from("locals segment not recorded")));
            }
            None => {}
        }
        if self.loaded.contains_key(&number) {
            return Err(mismatch(String::from("script recorded twice")));
        }

        let mut script = ScriptSegment::from_image(
            number,
            snapshot.segment,
            bytes,
            &image,
            snapshot.locals_segment,
        );
        script.lockers = snapshot.lockers;
        script.dependencies = snapshot.dependencies;
        if snapshot.objects.len() != script.object_count() {
            return Err(mismatch(format!(
                "{} objects saved, byte-code declares {}",
                snapshot.objects.len(),
                script.object_count()
            )));
        }
        for (offset, properties) in snapshot.objects {
            let object = script
                .object_mut(offset)
                .ok_or_else(|| mismatch(format!("no object at offset {:04x}", offset)))?;
            if object.properties.len() != properties.len() {
                return Err(mismatch(format!("property count differs for object {:04x}", offset)));
            }
            object.properties = properties;
        }

        if !heap.insert_at(snapshot.segment, Segment::Script(script)) {
            return Err(mismatch(format!("segment {} already occupied", snapshot.segment)));
        }
        self.loaded.insert(number, snapshot.segment);
        self.register_classes(heap, number, snapshot.segment)
    }

    /// Re-resolves every object's class links through the class table.
    /// Clones also get their method tables re-derived from the script
    /// object they were cloned from.
    pub fn relink_all(&mut self, heap: &mut SegmentManager) -> Result<(), LifecycleError> {
        let scripts: Vec<(u16, SegmentId)> = self.loaded().collect();
        for &(number, id) in &scripts {
            let script = heap
                .script(id)
                .ok_or(LifecycleError::ScriptNotFound { script: number })?;
            if let Some(missing) = script
                .dependencies
                .iter()
                .find(|dep| !self.loaded.contains_key(*dep))
            {
                return Err(LifecycleError::SnapshotMismatch {
                    script: number,
                    reason: format!("depends on script {} which is not resident", missing),
                });
            }
            let mut links = Vec::new();
            for (offset, object) in script.objects() {
                links.push((offset, self.resolve_links(number, object.species, object.superclass)?));
            }
            if let Some(script) = heap.script_mut(id) {
                for (offset, (species_ref, superclass_ref)) in links {
                    if let Some(object) = script.object_mut(offset) {
                        object.species_ref = species_ref;
                        object.superclass_ref = superclass_ref;
                    }
                }
            }
        }

        for pool in heap.ids_of_kind(SegmentKind::Clones) {
            let mut updates = Vec::new();
            if let Some(Segment::Clones(table)) = heap.get(pool) {
                for (offset, clone) in table.iter() {
                    let owner = self.class_table.defining_script(clone.species).unwrap_or(0);
                    let links = self.resolve_links(owner, clone.species, clone.superclass)?;
                    let methods = heap
                        .object(clone.base)
                        .filter(|base| !base.is_clone())
                        .map(|base| base.methods)
                        .ok_or(LifecycleError::SnapshotMismatch {
                            script: owner,
                            reason: format!("clone {}:{:04x} has no script base object", pool, offset),
                        })?;
                    updates.push((offset, links, methods));
                }
            }
            if let Some(Segment::Clones(table)) = heap.get_mut(pool) {
                for (offset, (species_ref, superclass_ref), methods) in updates {
                    if let Some(clone) = table.get_mut(offset) {
                        clone.species_ref = species_ref;
                        clone.superclass_ref = superclass_ref;
                        clone.methods = methods;
                    }
                }
            }
        }
        Ok(())
    }
}
