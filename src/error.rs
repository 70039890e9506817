//! Error types for memtext
//!
//! Provides a unified error type for all client operations.

use thiserror::Error;

/// Result type alias using MemcacheError
pub type Result<T> = std::result::Result<T, MemcacheError>;

/// Unified error type for memtext operations
///
/// Apart from `Connect`, every variant is a fault raised while an operation
/// was in flight. The connection treats them all the same way and records
/// them in its sticky error flag.
#[derive(Debug, Error)]
pub enum MemcacheError {
    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    #[error("Connect error: {0}")]
    Connect(String),

    #[error("connection closed")]
    Closed,

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Malformed response: {0}")]
    Protocol(String),

    #[error("Server error: {0}")]
    Server(String),
}

impl MemcacheError {
    /// True when the error happened while establishing the connection
    pub fn is_connect(&self) -> bool {
        matches!(self, MemcacheError::Connect(_))
    }
}
