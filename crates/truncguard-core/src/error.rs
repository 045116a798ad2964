//! Error types for the truncation guard.
//!
//! Nothing in here ever escapes to the host page: the browser layer logs
//! these and returns normally.

/// Main error type for guard operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The editor container or its handle could not be found at clear time.
    #[error("editor unavailable for clear: {0}")]
    ClearUnavailable(String),

    /// A call into the host page failed.
    #[error("host call failed: {0}")]
    Host(String),

    /// Interception is process-wide and can only be installed once.
    #[error("interception already installed")]
    AlreadyInstalled,
}
