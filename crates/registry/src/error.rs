use switchboard_types::Selector;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Failures surfaced by the registry. All of them are precondition
/// violations detected before any state change is committed; a failed call
/// never leaves partial effects behind.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Extension '{0}' not found")]
    ExtensionNotFound(String),

    #[error("No function with selector {selector} registered under extension '{extension}'")]
    FunctionNotFound {
        extension: String,
        selector: Selector,
    },

    #[error("Extension '{0}' already exists")]
    ExtensionAlreadyExists(String),

    #[error("Extension name must not be empty")]
    EmptyExtensionName,

    #[error("Extension '{0}' has a null implementation handle")]
    NullImplementation(String),

    #[error("Selector {declared} does not match signature '{signature}' (expected {expected})")]
    SelectorMismatch {
        signature: String,
        declared: Selector,
        expected: Selector,
    },

    #[error("Selector {selector} is already owned by extension '{owner}'")]
    SelectorOwned { selector: Selector, owner: String },

    #[error("Selector {selector} belongs to extension '{owner}', not '{requested}'")]
    RemovalNamespaceMismatch {
        selector: Selector,
        owner: String,
        requested: String,
    },

    #[error("Operation '{operation}' denied by authorization policy: {reason}")]
    AuthorizationDenied {
        operation: &'static str,
        reason: String,
    },

    #[error("Corrupted registry snapshot: {0}")]
    CorruptedSnapshot(String),

    #[error("Snapshot operation '{operation}' failed on path '{path}': {source}")]
    SnapshotIo {
        operation: String,
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("Snapshot serialization failed: {0}")]
    SnapshotSerialization(#[from] serde_json::Error),
}
