use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use types::{Platform, SciVersion};

use crate::error::EngineError;
use crate::global::Config;

/// Runtime settings of a session, loadable from JSON. Missing keys take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub interpreter_version: String,
    pub platform: String,
    pub stack_size: usize,
    /// When false, kernel calls with surplus trailing arguments run with
    /// the surplus dropped instead of failing.
    pub strict_signatures: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interpreter_version: Config::DEFAULT_VERSION.to_string(),
            platform: Config::DEFAULT_PLATFORM.to_string(),
            stack_size: Config::STACK_SIZE,
            strict_signatures: true,
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn version(&self) -> Result<SciVersion, EngineError> {
        SciVersion::parse(&self.interpreter_version.to_ascii_lowercase())
            .ok_or_else(|| EngineError::UnknownVersion(self.interpreter_version.clone()))
    }

    pub fn platform(&self) -> Result<Platform, EngineError> {
        Platform::parse(&self.platform.to_ascii_lowercase())
            .ok_or_else(|| EngineError::UnknownPlatform(self.platform.clone()))
    }
}
