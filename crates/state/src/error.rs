use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("not a save game (magic {found})")]
    BadMagic { found: String },
    #[error("save format revision {found} is too old (oldest supported is {minimum})")]
    TooOld { found: u16, minimum: u16 },
    #[error("save format revision {found} is too new (newest supported is {maximum})")]
    TooNew { found: u16, maximum: u16 },
    #[error("save data ends at byte {offset} while reading {what}")]
    Truncated { offset: usize, what: &'static str },
    #[error("save was made with game data {found}, this game is {expected}")]
    IncompatibleContent { found: String, expected: String },
    #[error("malformed save data at byte {offset}: {reason}")]
    Malformed { offset: usize, reason: String },
    #[error("restore failed at segment {segment}: {reason}")]
    RestoreFailed { segment: u16, reason: String },
}
