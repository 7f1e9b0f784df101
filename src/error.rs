//! Error types for the registry.
//!
//! None of these cross the C boundary. The exported entry points swallow
//! them (after logging) so a stale or bogus handle from a foreign caller can
//! never take the process down. Rust callers get the full signal.

use crate::handle::HandleId;
use thiserror::Error;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Error type for registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No live entry is tracked under this handle.
    #[error("unknown handle {0}")]
    UnknownHandle(HandleId),

    /// More releases than claims were issued for this handle.
    #[error("refcount underflow on handle {0}")]
    RefcountUnderflow(HandleId),

    /// The process registry was already constructed.
    #[error("process registry already initialized")]
    AlreadyInitialized,

    /// Configuration could not be parsed.
    #[error("invalid registry config: {0}")]
    InvalidConfig(String),
}

impl RegistryError {
    /// Check if this is an unknown handle error.
    pub fn is_unknown_handle(&self) -> bool {
        matches!(self, RegistryError::UnknownHandle(_))
    }

    /// Check if this is a refcount underflow error.
    pub fn is_underflow(&self) -> bool {
        matches!(self, RegistryError::RefcountUnderflow(_))
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(e: serde_json::Error) -> Self {
        RegistryError::InvalidConfig(format!("JSON parse error: {e}"))
    }
}
