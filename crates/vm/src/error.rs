use thiserror::Error;
use types::{Category, Reg};

use crate::kernel::signature::SigMask;
use crate::script_loader::ScriptParseError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("script {script} is not present in the game data")]
    ScriptNotFound { script: u16 },
    #[error("script {script} is malformed: {source}")]
    MalformedScript {
        script: u16,
        #[source]
        source: ScriptParseError,
    },
    #[error("script {script} defines species {species}, which the class table assigns to script {expected}")]
    ForeignClass { script: u16, species: u16, expected: u16 },
    #[error("release of script {script} refused: locker count is {lockers}")]
    DoubleRelease { script: u16, lockers: u32 },
    #[error("script {script} references species {species}, which cannot be resolved")]
    UnresolvedClass { species: u16, script: u16 },
    #[error("segment table exhausted while loading script {script}")]
    OutOfSegments { script: u16 },
    #[error("script {script} snapshot does not match its byte-code: {reason}")]
    SnapshotMismatch { script: u16, reason: String },
}

/// Errors in a kernel signature string. These are defects in the static
/// kernel table and stop initialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature '{signature}': unbalanced '{found}' at {position}")]
    Unbalanced { signature: String, position: usize, found: char },
    #[error("signature '{signature}': unknown type '{found}' at {position}")]
    UnknownType { signature: String, position: usize, found: char },
    #[error("signature '{signature}': '*' at {position} does not follow a type")]
    MoreWithoutType { signature: String, position: usize },
    #[error("signature '{signature}': argument after '*' at {position}")]
    SlotAfterMore { signature: String, position: usize },
    #[error("signature '{signature}': mandatory argument at {position} follows an optional one")]
    MandatoryAfterOptional { signature: String, position: usize },
    #[error("signature '{signature}': type '{found}' repeated in group at {position}")]
    DuplicateType { signature: String, position: usize, found: char },
    #[error("signature '{signature}': empty group at {position}")]
    EmptyGroup { signature: String, position: usize },
    #[error("signature '{signature}': nested optional group at {position}")]
    NestedOptional { signature: String, position: usize },
}

/// Inconsistencies found while selecting kernel variants. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelTableError {
    #[error("kernel function {name} has variants but none matches {version} on {platform}")]
    NoMatchingVariant { name: &'static str, version: String, platform: String },
    #[error("kernel function {name} has {count} equally specific variants for {version} on {platform}")]
    AmbiguousVariant {
        name: &'static str,
        count: usize,
        version: String,
        platform: String,
    },
    #[error("kernel function {name}: {source}")]
    BadSignature {
        name: &'static str,
        #[source]
        source: SignatureError,
    },
}

/// Why an argument list failed its kernel signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArgumentMismatch {
    #[error("argument {position} is {found}, expected {expected}")]
    WrongType { position: usize, expected: SigMask, found: Category },
    #[error("argument {position} ({reg:?}) is an invalid reference")]
    InvalidReference { position: usize, reg: Reg },
    #[error("{found} arguments, at least {expected} required")]
    TooFew { expected: usize, found: usize },
    #[error("{found} arguments, at most {expected} accepted")]
    TooMany { expected: usize, found: usize },
}

/// Recoverable failures of a kernel call. The caller logs them and the
/// call evaluates to null.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("no kernel function at index {index} for this interpreter")]
    UnknownIndex { index: u16 },
    #[error("kernel {name}: {mismatch}")]
    SignatureMismatch { name: &'static str, mismatch: ArgumentMismatch },
    #[error("kernel {name} has no native implementation")]
    HandlerNotMapped { name: &'static str },
    #[error("kernel {name} failed: {source}")]
    HandlerFailed {
        name: &'static str,
        #[source]
        source: KernelError,
    },
}

/// Failure raised by a kernel handler after its arguments were validated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    #[error("argument {position}: {reason}")]
    BadArgument { position: usize, reason: &'static str },
    #[error("heap exhausted")]
    OutOfMemory,
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}
