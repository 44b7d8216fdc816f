//! Segment heap, type resolver, script lifecycle and kernel dispatch of
//! the script VM.

pub mod class_table;
pub mod error;
pub mod kernel;
pub mod lifecycle;
pub mod resolver;
pub mod script_loader;
pub mod segment;
pub mod segment_manager;
pub mod vm_state;

pub use class_table::{ClassEntry, ClassTable};
pub use error::{
    ArgumentMismatch, DispatchError, KernelError, KernelTableError, LifecycleError, SignatureError,
};
pub use kernel::{KernelDispatcher, SigMask, Signature};
pub use lifecycle::{ScriptManager, ScriptSnapshot, ScriptState};
pub use resolver::{classify, is_object};
pub use script_loader::{ScriptBuilder, ScriptImage, ScriptParseError};
pub use segment::Segment;
pub use segment_manager::SegmentManager;
pub use vm_state::VmState;
