use types::Reg;

use super::{arg, int_arg, uint_arg};
use crate::error::KernelError;
use crate::vm_state::VmState;

pub fn k_abs(_state: &mut VmState, args: &[Reg]) -> Result<Reg, KernelError> {
    Ok(Reg::signed(int_arg(args, 0).wrapping_abs()))
}

/// `Random(min, max)` draws from the inclusive range. `Random(seed)` sets
/// the seed, and `Random(0)` reads its low word back.
pub fn k_random(state: &mut VmState, args: &[Reg]) -> Result<Reg, KernelError> {
    if args.len() == 1 {
        let seed = uint_arg(args, 0);
        if seed == 0 {
            return Ok(Reg::int(state.random_seed as u16));
        }
        state.random_seed = seed as u32;
        return Ok(Reg::NULL);
    }
    let min = uint_arg(args, 0) as u32;
    let max = uint_arg(args, 1) as u32;
    if max < min {
        return Ok(Reg::int(min as u16));
    }
    let span = max - min + 1;
    Ok(Reg::int((min + state.next_random() % span) as u16))
}

pub fn k_str_len(state: &mut VmState, args: &[Reg]) -> Result<Reg, KernelError> {
    let len = state.read_cstring(arg(args, 0)).map_or(0, |s| s.len());
    Ok(Reg::int(len.min(u16::MAX as usize) as u16))
}

const MEMORY_ALLOCATE_CRITICAL: u16 = 1;
const MEMORY_ALLOCATE_NONCRITICAL: u16 = 2;
const MEMORY_FREE: u16 = 3;
const MEMORY_MEMCPY: u16 = 4;
const MEMORY_PEEK: u16 = 5;
const MEMORY_POKE: u16 = 6;

/// Scratch memory in hunk segments: allocate, free, copy, peek and poke
/// of little-endian words.
pub fn k_memory(state: &mut VmState, args: &[Reg]) -> Result<Reg, KernelError> {
    match uint_arg(args, 0) {
        MEMORY_ALLOCATE_CRITICAL => {
            let size = uint_arg(args, 1) as usize;
            state.heap.allocate_hunk(size).ok_or(KernelError::OutOfMemory)
        }
        MEMORY_ALLOCATE_NONCRITICAL => {
            let size = uint_arg(args, 1) as usize;
            Ok(state.heap.allocate_hunk(size).unwrap_or(Reg::NULL))
        }
        MEMORY_FREE => {
            if state.heap.free_hunk(arg(args, 1)).is_none() {
                return Err(KernelError::BadArgument { position: 1, reason: "not a hunk" });
            }
            Ok(Reg::NULL)
        }
        MEMORY_MEMCPY => {
            let size = uint_arg(args, 3) as usize;
            let source = arg(args, 2)
                .as_handle()
                .and_then(|handle| state.heap.bytes(handle))
                .and_then(|bytes| bytes.get(..size))
                .map(<[u8]>::to_vec)
                .ok_or(KernelError::BadArgument { position: 2, reason: "source out of range" })?;
            let dest = arg(args, 1)
                .as_handle()
                .and_then(|handle| state.heap.bytes_mut(handle))
                .and_then(|bytes| bytes.get_mut(..size))
                .ok_or(KernelError::BadArgument { position: 1, reason: "destination not writable" })?;
            dest.copy_from_slice(&source);
            Ok(arg(args, 1))
        }
        MEMORY_PEEK => {
            let word = arg(args, 1)
                .as_handle()
                .and_then(|handle| state.heap.bytes(handle))
                .and_then(|bytes| bytes.get(..2))
                .ok_or(KernelError::BadArgument { position: 1, reason: "address out of range" })?;
            Ok(Reg::int(u16::from_le_bytes([word[0], word[1]])))
        }
        MEMORY_POKE => {
            let value = uint_arg(args, 2);
            let word = arg(args, 1)
                .as_handle()
                .and_then(|handle| state.heap.bytes_mut(handle))
                .and_then(|bytes| bytes.get_mut(..2))
                .ok_or(KernelError::BadArgument { position: 1, reason: "address not writable" })?;
            word.copy_from_slice(&value.to_le_bytes());
            Ok(Reg::NULL)
        }
        _ => Err(KernelError::BadArgument { position: 0, reason: "unknown memory operation" }),
    }
}

/// Answers returned by `Platform(0)`.
pub const PLATFORM_GENERIC: u16 = 0;
pub const PLATFORM_MACINTOSH: u16 = 2;
pub const PLATFORM_32BIT: u16 = 3;

pub fn k_platform(_state: &mut VmState, _args: &[Reg]) -> Result<Reg, KernelError> {
    Ok(Reg::int(PLATFORM_GENERIC))
}

pub fn k_platform_mac(_state: &mut VmState, _args: &[Reg]) -> Result<Reg, KernelError> {
    Ok(Reg::int(PLATFORM_MACINTOSH))
}

pub fn k_platform_32(_state: &mut VmState, _args: &[Reg]) -> Result<Reg, KernelError> {
    Ok(Reg::int(PLATFORM_32BIT))
}
