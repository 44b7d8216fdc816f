//! Kernel calls: native operations invoked by index from byte-code.
//!
//! Every kernel function has a signature ([`signature`]) checked before
//! its handler runs. The static tables in [`table`] list one or more
//! variants per name, filtered by interpreter version and platform when
//! the [`dispatcher::KernelDispatcher`] is built.

pub mod dispatcher;
pub mod functions;
pub mod signature;
pub mod table;

use types::Reg;

use crate::error::KernelError;
use crate::vm_state::VmState;

/// Native implementation of a kernel function. Arguments have already
/// passed the function's signature.
pub type KernelHandler = fn(&mut VmState, &[Reg]) -> Result<Reg, KernelError>;

pub use dispatcher::KernelDispatcher;
pub use signature::{SigMask, Signature};
pub use table::{KernelEntry, KernelFunctionDef, KernelName, KERNEL_FUNCTIONS, KERNEL_NAMES};
