use types::Reg;

use super::{arg, boolean};
use crate::error::KernelError;
use crate::vm_state::VmState;

pub fn k_new_list(state: &mut VmState, _args: &[Reg]) -> Result<Reg, KernelError> {
    state.new_list().ok_or(KernelError::OutOfMemory)
}

pub fn k_dispose_list(state: &mut VmState, args: &[Reg]) -> Result<Reg, KernelError> {
    state.dispose_list(arg(args, 0));
    Ok(Reg::NULL)
}

/// `NewNode(value [, key])`; the key defaults to the value.
pub fn k_new_node(state: &mut VmState, args: &[Reg]) -> Result<Reg, KernelError> {
    let value = arg(args, 0);
    let key = args.get(1).copied().unwrap_or(value);
    state.new_node(value, key).ok_or(KernelError::OutOfMemory)
}

pub fn k_first_node(state: &mut VmState, args: &[Reg]) -> Result<Reg, KernelError> {
    Ok(state.first_node(arg(args, 0)))
}

pub fn k_last_node(state: &mut VmState, args: &[Reg]) -> Result<Reg, KernelError> {
    Ok(state.last_node(arg(args, 0)))
}

pub fn k_next_node(state: &mut VmState, args: &[Reg]) -> Result<Reg, KernelError> {
    Ok(state.next_node(arg(args, 0)))
}

pub fn k_prev_node(state: &mut VmState, args: &[Reg]) -> Result<Reg, KernelError> {
    Ok(state.prev_node(arg(args, 0)))
}

pub fn k_node_value(state: &mut VmState, args: &[Reg]) -> Result<Reg, KernelError> {
    Ok(state.node_value(arg(args, 0)))
}

pub fn k_add_to_end(state: &mut VmState, args: &[Reg]) -> Result<Reg, KernelError> {
    state.add_to_end(arg(args, 0), arg(args, 1))?;
    Ok(Reg::NULL)
}

pub fn k_add_to_front(state: &mut VmState, args: &[Reg]) -> Result<Reg, KernelError> {
    state.add_to_front(arg(args, 0), arg(args, 1))?;
    Ok(Reg::NULL)
}

pub fn k_delete_key(state: &mut VmState, args: &[Reg]) -> Result<Reg, KernelError> {
    Ok(boolean(state.delete_key(arg(args, 0), arg(args, 1))))
}

pub fn k_find_key(state: &mut VmState, args: &[Reg]) -> Result<Reg, KernelError> {
    Ok(state.find_key(arg(args, 0), arg(args, 1)).unwrap_or(Reg::NULL))
}
