#![no_std]

extern crate alloc;

pub mod reg;
pub use reg::{Handle, Reg, SegmentId, NULL_SEGMENT};

pub mod segment_kind;
pub use segment_kind::SegmentKind;

pub mod category;
pub use category::Category;

pub mod version;
pub use version::{Platform, PlatformMask, SciVersion, VersionRange};
