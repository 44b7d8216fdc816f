pub mod lists;
pub mod misc;
pub mod objects;

use types::Reg;

/// Argument `index`, null when the call omitted it.
pub(crate) fn arg(args: &[Reg], index: usize) -> Reg {
    args.get(index).copied().unwrap_or(Reg::NULL)
}

/// Argument `index` read as an unsigned integer; references read as 0.
pub(crate) fn uint_arg(args: &[Reg], index: usize) -> u16 {
    arg(args, index).as_int().unwrap_or(0)
}

pub(crate) fn int_arg(args: &[Reg], index: usize) -> i16 {
    arg(args, index).as_signed().unwrap_or(0)
}

pub(crate) fn boolean(value: bool) -> Reg {
    Reg::int(value as u16)
}
