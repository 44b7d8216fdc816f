//! Save games: header, wire codec and the save/restore protocol for the
//! script VM heap.

pub mod codec;
pub mod error;
pub mod metadata;
pub mod savegame;

pub use error::SaveError;
pub use metadata::{
    content_compatible, SaveMetadata, CURRENT_SAVE_REVISION, MIN_SAVE_REVISION, SAVE_MAGIC,
};
pub use savegame::{encode_save, query_save_metadata, restore_game, save_game};
