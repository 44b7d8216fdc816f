//! Runtime classification of tagged references.
//!
//! Classification only reads the heap. It is safe on arbitrary garbage
//! references, which is what lets the kernel signature checker call it
//! speculatively on every argument.

use types::{Category, Reg};

use crate::segment::Segment;
use crate::segment_manager::SegmentManager;

pub fn classify(heap: &SegmentManager, reg: Reg) -> Category {
    let handle = match reg {
        Reg::Int(0) => return Category::Null,
        Reg::Int(_) => return Category::Integer,
        Reg::Ptr(handle) => handle,
    };
    let Some(segment) = heap.get(handle.segment) else {
        return Category::Invalid;
    };
    let offset = handle.offset;
    match segment {
        Segment::Script(script) => {
            if script.is_object_offset(offset) {
                Category::Object
            } else if script.in_bounds(offset) {
                Category::Reference
            } else {
                Category::Invalid
            }
        }
        Segment::Clones(table) => live_or_invalid(table.is_valid(offset), Category::Object),
        Segment::Lists(table) => live_or_invalid(table.is_valid(offset), Category::List),
        Segment::Nodes(table) => live_or_invalid(table.is_valid(offset), Category::Node),
        Segment::Stack(stack) => {
            if stack.is_written(offset) {
                Category::Reference
            } else if stack.in_bounds(offset) {
                Category::Uninitialized
            } else {
                Category::Invalid
            }
        }
        other => live_or_invalid(other.is_valid_offset(offset), Category::Reference),
    }
}

fn live_or_invalid(live: bool, category: Category) -> Category {
    if live { category } else { Category::Invalid }
}

pub fn is_object(heap: &SegmentManager, reg: Reg) -> bool {
    classify(heap, reg) == Category::Object
}
