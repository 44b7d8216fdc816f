use thiserror::Error;
use vm::{DispatchError, KernelError, KernelTableError, LifecycleError};

use state::SaveError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown interpreter version '{0}'")]
    UnknownVersion(String),
    #[error("unknown platform '{0}'")]
    UnknownPlatform(String),
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    KernelTable(#[from] KernelTableError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Kernel(#[from] KernelError),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error("heap exhausted")]
    OutOfMemory,
}
