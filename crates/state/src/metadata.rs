//! Save-file header: identifies the format revision and describes the
//! save for listings without touching the segment payloads.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Serialize, Serializer};
use storage::GameResources;
use types::SciVersion;

use crate::codec::{Reader, Writer};
use crate::error::SaveError;

pub const SAVE_MAGIC: [u8; 4] = *b"SCIS";

/// Oldest revision this build restores.
pub const MIN_SAVE_REVISION: u16 = 2;
/// Revision written by this build.
pub const CURRENT_SAVE_REVISION: u16 = 5;

/// Revision that added the game id to the header.
const REVISION_GAME_ID: u16 = 3;
/// Revision that added play time to the header.
const REVISION_PLAY_TIME: u16 = 4;
/// Revision that added the stack pointer to the operand stack record.
pub(crate) const REVISION_STACK_POINTER: u16 = 5;
/// Revision that widened string fragment lengths to 32 bits.
pub(crate) const REVISION_WIDE_FRAGMENTS: u16 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveMetadata {
    pub revision: u16,
    pub name: String,
    pub content_version: String,
    pub game_id: String,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    /// Ticks of play time at the moment of saving.
    pub play_time: u32,
    #[serde(serialize_with = "version_name")]
    pub interpreter_version: SciVersion,
}

fn version_name<S: Serializer>(version: &SciVersion, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(version)
}

impl SaveMetadata {
    /// Header for a save made now, at the current revision.
    pub fn new(
        name: &str,
        resources: &dyn GameResources,
        interpreter_version: SciVersion,
        play_time: u32,
    ) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        Self {
            revision: CURRENT_SAVE_REVISION,
            name: name.to_string(),
            content_version: resources.content_version(),
            game_id: resources.game_id(),
            timestamp,
            play_time,
            interpreter_version,
        }
    }

    pub fn encode(&self, w: &mut Writer) {
        w.raw(&SAVE_MAGIC);
        w.u16(CURRENT_SAVE_REVISION);
        w.string(&self.name);
        w.string(&self.content_version);
        w.string(&self.game_id);
        w.u64(self.timestamp);
        w.u32(self.play_time);
        w.u8(self.interpreter_version.as_u8());
    }

    /// Reads and validates the header. Revision checks come before any
    /// revision-dependent field is read.
    pub fn decode(r: &mut Reader<'_>) -> Result<Self, SaveError> {
        let magic = r.take(4, "magic")?;
        if magic != SAVE_MAGIC {
            return Err(SaveError::BadMagic { found: hex::encode(magic) });
        }
        let revision = r.u16("format revision")?;
        if revision < MIN_SAVE_REVISION {
            return Err(SaveError::TooOld { found: revision, minimum: MIN_SAVE_REVISION });
        }
        if revision > CURRENT_SAVE_REVISION {
            return Err(SaveError::TooNew { found: revision, maximum: CURRENT_SAVE_REVISION });
        }
        let name = r.string("save name")?;
        let content_version = r.string("content version")?;
        let game_id = if revision >= REVISION_GAME_ID {
            r.string("game id")?
        } else {
            String::new()
        };
        let timestamp = r.u64("timestamp")?;
        let play_time = if revision >= REVISION_PLAY_TIME {
            r.u32("play time")?
        } else {
            0
        };
        let raw_version = r.u8("interpreter version")?;
        let interpreter_version = SciVersion::from_u8(raw_version)
            .ok_or_else(|| r.malformed(format!("unknown interpreter version {}", raw_version)))?;
        Ok(Self {
            revision,
            name,
            content_version,
            game_id,
            timestamp,
            play_time,
            interpreter_version,
        })
    }
}

/// Saves stay loadable across patch releases of the same game data:
/// the first two dot-separated components must agree.
pub fn content_compatible(saved: &str, running: &str) -> bool {
    let release = |version: &str| -> Vec<String> {
        version.split('.').take(2).map(str::to_string).collect()
    };
    release(saved) == release(running)
}
