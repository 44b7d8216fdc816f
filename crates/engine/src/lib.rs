pub mod config;
pub mod engine;
pub mod error;
pub mod global;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::EngineError;
pub use global::Config;
