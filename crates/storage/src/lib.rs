//! Game-data access for the script VM.
//!
//! Script byte-code is never persisted in save files; both first
//! instantiation and post-restore reconstruction read it back through
//! [`GameResources`], so the two paths see identical bytes for the same
//! script number.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Marks a species slot that no script defines.
pub const NO_SCRIPT: u16 = 0xffff;

/// Read-only view of the game data set.
pub trait GameResources: fmt::Debug {
    /// Raw script resource for `number`, or `None` when the data set lacks it.
    fn load_script(&self, number: u16) -> Option<Vec<u8>>;

    /// Every script number present in the data set, ascending.
    fn script_numbers(&self) -> Vec<u16>;

    /// Species number to defining script number. `None` when the data set
    /// carries no class-table resource and the table must be discovered.
    fn class_table(&self) -> Option<Vec<u16>>;

    /// Identifies the content revision; save files record it.
    fn content_version(&self) -> String;

    fn game_id(&self) -> String;
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("i/o error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed class table {path}: {reason}")]
    ClassTable { path: PathBuf, reason: String },
}

/// In-memory game data, used by tests and tooling.
#[derive(Debug)]
pub struct Storage {
    pub scripts: RefCell<BTreeMap<u16, Vec<u8>>>,
    class_table: RefCell<Option<Vec<u16>>>,
    game_id: String,
    version: String,
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage {
    pub fn new() -> Self {
        Self::with_map(BTreeMap::new())
    }

    pub fn with_map(initial: BTreeMap<u16, Vec<u8>>) -> Self {
        Self {
            scripts: RefCell::new(initial),
            class_table: RefCell::new(None),
            game_id: String::from("test"),
            version: String::from("1.000"),
        }
    }

    pub fn with_identity(mut self, game_id: &str, version: &str) -> Self {
        self.game_id = game_id.to_string();
        self.version = version.to_string();
        self
    }

    pub fn set_script(&self, number: u16, data: Vec<u8>) {
        self.scripts.borrow_mut().insert(number, data);
    }

    pub fn remove_script(&self, number: u16) -> Option<Vec<u8>> {
        self.scripts.borrow_mut().remove(&number)
    }

    pub fn set_class_table(&self, table: Vec<u16>) {
        *self.class_table.borrow_mut() = Some(table);
    }
}

impl GameResources for Storage {
    fn load_script(&self, number: u16) -> Option<Vec<u8>> {
        self.scripts.borrow().get(&number).cloned()
    }

    fn script_numbers(&self) -> Vec<u16> {
        self.scripts.borrow().keys().copied().collect()
    }

    fn class_table(&self) -> Option<Vec<u16>> {
        self.class_table.borrow().clone()
    }

    fn content_version(&self) -> String {
        self.version.clone()
    }

    fn game_id(&self) -> String {
        self.game_id.clone()
    }
}

#[derive(Debug, Deserialize)]
struct Manifest {
    game_id: String,
    version: String,
}

/// Game data laid out as loose files in one directory:
///
/// - `game.json`: `{"game_id": "...", "version": "..."}`
/// - `script.NNN`: one script resource per number (decimal, zero padded)
/// - `classes.tbl`: optional class table, `u16` count then `u16` script numbers
#[derive(Debug)]
pub struct DirectoryStorage {
    root: PathBuf,
    manifest: Manifest,
}

impl DirectoryStorage {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        let path = root.join("game.json");
        let text = fs::read_to_string(&path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        let manifest: Manifest = serde_json::from_str(&text)
            .map_err(|source| StorageError::Manifest { path, source })?;
        debug!(root = %root.display(), game = %manifest.game_id, "opened game data directory");
        Ok(Self { root, manifest })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn script_path(&self, number: u16) -> PathBuf {
        self.root.join(format!("script.{:03}", number))
    }

    fn read_class_table(&self) -> Result<Option<Vec<u16>>, StorageError> {
        let path = self.root.join("classes.tbl");
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        decode_class_table(&bytes)
            .map(Some)
            .ok_or_else(|| StorageError::ClassTable {
                path,
                reason: String::from("truncated entry list"),
            })
    }
}

impl GameResources for DirectoryStorage {
    fn load_script(&self, number: u16) -> Option<Vec<u8>> {
        fs::read(self.script_path(number)).ok()
    }

    fn script_numbers(&self) -> Vec<u16> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return Vec::new();
        };
        let mut numbers: Vec<u16> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                name.strip_prefix("script.")?.parse::<u16>().ok()
            })
            .collect();
        numbers.sort_unstable();
        numbers
    }

    fn class_table(&self) -> Option<Vec<u16>> {
        match self.read_class_table() {
            Ok(table) => table,
            Err(err) => {
                debug!(error = %err, "ignoring class table resource");
                None
            }
        }
    }

    fn content_version(&self) -> String {
        self.manifest.version.clone()
    }

    fn game_id(&self) -> String {
        self.manifest.game_id.clone()
    }
}

/// Flat little-endian class table: `u16` count then `count` script numbers.
pub fn encode_class_table(table: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + table.len() * 2);
    out.extend_from_slice(&(table.len() as u16).to_le_bytes());
    for script in table {
        out.extend_from_slice(&script.to_le_bytes());
    }
    out
}

pub fn decode_class_table(bytes: &[u8]) -> Option<Vec<u16>> {
    let count = u16::from_le_bytes(bytes.get(0..2)?.try_into().ok()?) as usize;
    let body = bytes.get(2..2 + count * 2)?;
    Some(
        body.chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect(),
    )
}
