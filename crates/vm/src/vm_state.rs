//! Everything a running session owns: the segment heap, the script
//! manager with its class table, and the session segments (operand stack,
//! system strings). Two `VmState`s can coexist, which is how restore builds
//! a replacement next to the live one before swapping.

use std::collections::HashSet;
use std::rc::Rc;

use storage::GameResources;
use tracing::{debug, warn};
use types::{Category, Handle, Reg, SegmentId, SegmentKind};

use crate::error::{KernelError, LifecycleError};
use crate::lifecycle::{ScriptManager, ScriptState};
use crate::resolver::classify;
use crate::segment::{DataStack, List, Method, Node, Segment, SystemStrings};
use crate::segment_manager::SegmentManager;

/// Upper bound on class-chain hops during method lookup.
const MAX_CLASS_DEPTH: usize = 64;

#[derive(Debug, Clone)]
pub struct VmState {
    pub heap: SegmentManager,
    pub scripts: ScriptManager,
    pub random_seed: u32,
}

impl VmState {
    /// Fresh session: empty heap plus an operand stack of `stack_size`
    /// slots and the system strings segment.
    pub fn new(resources: Rc<dyn GameResources>, stack_size: usize) -> Self {
        let game_id = resources.game_id();
        let mut state = Self::blank(resources);
        if state.heap.insert(Segment::Stack(DataStack::new(stack_size))).is_none() {
            warn!("no segment left for the operand stack");
        }
        let strings = SystemStrings::with_defaults(&game_id);
        if state.heap.insert(Segment::SysStrings(strings)).is_none() {
            warn!("no segment left for system strings");
        }
        state
    }

    /// Empty heap with no session segments, to be filled by restore.
    pub fn blank(resources: Rc<dyn GameResources>) -> Self {
        Self::with_heap(resources, SegmentManager::new())
    }

    pub fn with_heap(resources: Rc<dyn GameResources>, heap: SegmentManager) -> Self {
        Self {
            heap,
            scripts: ScriptManager::new(resources),
            random_seed: 0x5eed_1234,
        }
    }

    pub fn classify(&self, reg: Reg) -> Category {
        classify(&self.heap, reg)
    }

    pub fn is_object(&self, reg: Reg) -> bool {
        self.classify(reg) == Category::Object
    }

    pub fn instantiate_script(&mut self, number: u16) -> Result<SegmentId, LifecycleError> {
        self.scripts.instantiate(&mut self.heap, number)
    }

    pub fn release_script(&mut self, number: u16) -> Result<ScriptState, LifecycleError> {
        self.scripts.release(&mut self.heap, number)
    }

    pub fn script_state(&self, number: u16) -> ScriptState {
        self.scripts.state(&self.heap, number)
    }

    pub fn lockers(&self, number: u16) -> u32 {
        self.scripts.lockers(&self.heap, number)
    }

    /// Script number whose class the object at `reg` belongs to.
    pub fn object_script_number(&self, reg: Reg) -> Option<u16> {
        self.scripts.defining_script(&self.heap, reg)
    }

    /// The `index`-th object of script `number`, loading nothing.
    pub fn script_object(&self, number: u16, index: usize) -> Option<Reg> {
        let id = self.scripts.segment_of(number)?;
        let offset = self.heap.script(id)?.nth_object(index)?;
        Some(Reg::ptr(id, offset))
    }

    pub fn property(&self, object: Reg, index: usize) -> Option<Reg> {
        self.heap.object(object)?.property(index)
    }

    pub fn set_property(&mut self, object: Reg, index: usize, value: Reg) -> bool {
        self.heap
            .object_mut(object)
            .is_some_and(|object| object.set_property(index, value))
    }

    /// Copies `source` into the clone pool. The clone keeps its class's
    /// script resident until it is disposed.
    pub fn clone_object(&mut self, source: Reg) -> Result<Reg, KernelError> {
        let object = self
            .heap
            .object(source)
            .ok_or(KernelError::BadArgument { position: 0, reason: "not an object" })?;
        let clone = object.to_clone();
        let owner = self
            .scripts
            .class_table()
            .defining_script(clone.species)
            .ok_or(LifecycleError::UnresolvedClass { species: clone.species, script: 0 })?;
        self.instantiate_script(owner)?;
        match self.heap.allocate_clone(clone) {
            Some(reg) => {
                debug!(source = %source, clone = %reg, script = owner, "object cloned");
                Ok(reg)
            }
            None => {
                self.release_script(owner)?;
                Err(KernelError::OutOfMemory)
            }
        }
    }

    pub fn dispose_clone(&mut self, clone: Reg) -> Result<(), KernelError> {
        let species = match self.heap.object(clone) {
            Some(object) if object.is_clone() => object.species,
            _ => return Err(KernelError::BadArgument { position: 0, reason: "not a clone" }),
        };
        self.heap.free_clone(clone);
        if let Some(owner) = self.scripts.class_table().defining_script(species) {
            self.release_script(owner)?;
        }
        debug!(clone = %clone, "clone disposed");
        Ok(())
    }

    /// Finds the code for `selector`, searching the object's own methods
    /// and then its class chain.
    pub fn lookup_method(&self, object: Reg, selector: u16) -> Option<Handle> {
        let mut current = object;
        for _ in 0..MAX_CLASS_DEPTH {
            let found = self.heap.object(current)?;
            let table = found.methods;
            if let Some(script) = self.heap.script(table.segment) {
                let hit = script
                    .methods(&table)
                    .into_iter()
                    .find(|method: &Method| method.selector == selector);
                if let Some(method) = hit {
                    return Some(Handle::new(table.segment, method.code_offset));
                }
            }
            current = if found.is_class() { found.superclass_ref } else { found.species_ref };
            if current.is_null() {
                return None;
            }
        }
        None
    }

    pub fn new_list(&mut self) -> Option<Reg> {
        self.heap.allocate_list()
    }

    pub fn new_node(&mut self, value: Reg, key: Reg) -> Option<Reg> {
        self.heap.allocate_node(Node::new(value, key))
    }

    /// Frees a list together with every node still on it.
    pub fn dispose_list(&mut self, list: Reg) -> bool {
        let Some(mut current) = self.heap.list(list).map(|list| list.first) else {
            return false;
        };
        while let Some(node) = self.heap.free_node(current) {
            current = node.succ;
        }
        self.heap.free_list(list).is_some()
    }

    pub fn add_to_end(&mut self, list: Reg, node: Reg) -> Result<(), KernelError> {
        let List { last, .. } = self.check_link(list, node)?;
        if let Some(entry) = self.heap.node_mut(node) {
            entry.pred = last;
            entry.succ = Reg::NULL;
        }
        if let Some(tail) = self.heap.node_mut(last) {
            tail.succ = node;
        }
        if let Some(list) = self.heap.list_mut(list) {
            if list.first.is_null() {
                list.first = node;
            }
            list.last = node;
        }
        Ok(())
    }

    pub fn add_to_front(&mut self, list: Reg, node: Reg) -> Result<(), KernelError> {
        let List { first, .. } = self.check_link(list, node)?;
        if let Some(entry) = self.heap.node_mut(node) {
            entry.pred = Reg::NULL;
            entry.succ = first;
        }
        if let Some(head) = self.heap.node_mut(first) {
            head.pred = node;
        }
        if let Some(list) = self.heap.list_mut(list) {
            if list.last.is_null() {
                list.last = node;
            }
            list.first = node;
        }
        Ok(())
    }

    /// A node may join a list only while it is live and unlinked.
    fn check_link(&self, list: Reg, node: Reg) -> Result<List, KernelError> {
        let Some(header) = self.heap.list(list).copied() else {
            return Err(KernelError::BadArgument { position: 0, reason: "list is not live" });
        };
        let Some(entry) = self.heap.node(node) else {
            return Err(KernelError::BadArgument { position: 1, reason: "node is not live" });
        };
        if !entry.pred.is_null() || !entry.succ.is_null() || header.first == node || header.last == node {
            return Err(KernelError::BadArgument { position: 1, reason: "node is already linked" });
        }
        Ok(header)
    }

    pub fn first_node(&self, list: Reg) -> Reg {
        self.heap.list(list).map_or(Reg::NULL, |list| list.first)
    }

    pub fn last_node(&self, list: Reg) -> Reg {
        self.heap.list(list).map_or(Reg::NULL, |list| list.last)
    }

    pub fn next_node(&self, node: Reg) -> Reg {
        self.heap.node(node).map_or(Reg::NULL, |node| node.succ)
    }

    pub fn prev_node(&self, node: Reg) -> Reg {
        self.heap.node(node).map_or(Reg::NULL, |node| node.pred)
    }

    pub fn node_value(&self, node: Reg) -> Reg {
        self.heap.node(node).map_or(Reg::NULL, |node| node.value)
    }

    pub fn node_key(&self, node: Reg) -> Reg {
        self.heap.node(node).map_or(Reg::NULL, |node| node.key)
    }

    /// Node handles from first to last. Stops at the first node seen twice.
    pub fn list_nodes(&self, list: Reg) -> Vec<Reg> {
        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        let mut current = self.first_node(list);
        while let Some(node) = self.heap.node(current) {
            if !seen.insert(current) {
                warn!(list = %list, node = %current, "list links back on itself");
                break;
            }
            nodes.push(current);
            current = node.succ;
        }
        nodes
    }

    /// Node values from first to last.
    pub fn list_values(&self, list: Reg) -> Vec<Reg> {
        self.list_nodes(list)
            .into_iter()
            .map(|node| self.node_value(node))
            .collect()
    }

    pub fn find_key(&self, list: Reg, key: Reg) -> Option<Reg> {
        self.list_nodes(list)
            .into_iter()
            .find(|&node| self.node_key(node) == key)
    }

    /// Unlinks `node` from `list` and frees it.
    pub fn delete_node(&mut self, list: Reg, node: Reg) -> bool {
        let Some(Node { pred, succ, .. }) = self.heap.node(node).copied() else {
            return false;
        };
        match self.heap.node_mut(pred) {
            Some(before) => before.succ = succ,
            None => {
                if let Some(list) = self.heap.list_mut(list) {
                    list.first = succ;
                }
            }
        }
        match self.heap.node_mut(succ) {
            Some(after) => after.pred = pred,
            None => {
                if let Some(list) = self.heap.list_mut(list) {
                    list.last = pred;
                }
            }
        }
        self.heap.free_node(node).is_some()
    }

    pub fn delete_key(&mut self, list: Reg, key: Reg) -> bool {
        match self.find_key(list, key) {
            Some(node) => self.delete_node(list, node),
            None => false,
        }
    }

    pub fn stack_segment(&self) -> Option<SegmentId> {
        self.heap.ids_of_kind(SegmentKind::Stack).first().copied()
    }

    /// Pushes onto the operand stack, returning a reference to the slot.
    pub fn push(&mut self, value: Reg) -> Option<Reg> {
        let id = self.stack_segment()?;
        match self.heap.get_mut(id)? {
            Segment::Stack(stack) => stack.push(value).map(|slot| Reg::ptr(id, slot)),
            _ => None,
        }
    }

    pub fn pop(&mut self) -> Option<Reg> {
        let id = self.stack_segment()?;
        match self.heap.get_mut(id)? {
            Segment::Stack(stack) => stack.pop(),
            _ => None,
        }
    }

    /// Stack slot reference `slot`, written or not.
    pub fn stack_slot(&self, slot: u16) -> Option<Reg> {
        self.stack_segment().map(|id| Reg::ptr(id, slot))
    }

    pub fn system_string(&self, index: u16) -> Option<&[u8]> {
        let id = self.heap.ids_of_kind(SegmentKind::SysStrings).first().copied()?;
        match self.heap.get(id)? {
            Segment::SysStrings(strings) => strings.get(index).map(|s| s.value.as_slice()),
            _ => None,
        }
    }

    pub fn set_system_string(&mut self, index: u16, value: &[u8]) -> bool {
        let Some(id) = self.heap.ids_of_kind(SegmentKind::SysStrings).first().copied() else {
            return false;
        };
        match self.heap.get_mut(id) {
            Some(Segment::SysStrings(strings)) => strings.set(index, value),
            _ => false,
        }
    }

    /// NUL-terminated string behind a reference.
    pub fn read_cstring(&self, reg: Reg) -> Option<Vec<u8>> {
        let bytes = self.heap.bytes(reg.as_handle()?)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Some(bytes[..end].to_vec())
    }

    pub fn intern_string(&mut self, bytes: &[u8]) -> Option<Reg> {
        self.heap.allocate_string_fragment(bytes)
    }

    /// Linear congruential step shared by `Random` and saved with the game.
    pub fn next_random(&mut self) -> u32 {
        self.random_seed = self
            .random_seed
            .wrapping_mul(1_103_515_245)
            .wrapping_add(12_345);
        (self.random_seed >> 16) & 0x7fff
    }
}
