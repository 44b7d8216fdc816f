use types::Reg;

use super::{arg, boolean, uint_arg};
use crate::error::KernelError;
use crate::vm_state::VmState;

pub fn k_clone(state: &mut VmState, args: &[Reg]) -> Result<Reg, KernelError> {
    state.clone_object(arg(args, 0))
}

pub fn k_dispose_clone(state: &mut VmState, args: &[Reg]) -> Result<Reg, KernelError> {
    state.dispose_clone(arg(args, 0))?;
    Ok(Reg::NULL)
}

pub fn k_is_object(state: &mut VmState, args: &[Reg]) -> Result<Reg, KernelError> {
    Ok(boolean(state.is_object(arg(args, 0))))
}

/// Loads a script (taking a locker) and returns its `index`-th object.
pub fn k_script_id(state: &mut VmState, args: &[Reg]) -> Result<Reg, KernelError> {
    let number = uint_arg(args, 0);
    let index = uint_arg(args, 1) as usize;
    state.instantiate_script(number)?;
    Ok(state.script_object(number, index).unwrap_or(Reg::NULL))
}

/// Releases one locker on a script. Extra arguments are ignored.
pub fn k_dispose_script(state: &mut VmState, args: &[Reg]) -> Result<Reg, KernelError> {
    state.release_script(uint_arg(args, 0))?;
    Ok(Reg::NULL)
}
