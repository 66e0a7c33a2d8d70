//! Error types for odrive-client.

use thiserror::Error;

/// Main error type for all odrive-client operations.
#[derive(Debug, Error)]
pub enum OdriveError {
    /// I/O error reported by the transport (timeouts are not errors, see [`crate::transport`]).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The assembled interface document is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A codec or framer read ran past the end of the available bytes.
    #[error("Truncated buffer: needed {needed} bytes, {available} available")]
    TruncatedBuffer {
        /// Bytes the read required.
        needed: usize,
        /// Bytes that were left.
        available: usize,
    },

    /// The interface document is missing a required field or has one of the wrong kind.
    #[error("Malformed interface document: {0}")]
    MalformedDocument(String),

    /// The transport accepted only part of a request packet.
    #[error("Short write: sent {sent} of {expected} bytes")]
    ShortWrite {
        /// Bytes the transport reported as sent.
        sent: usize,
        /// Size of the packet.
        expected: usize,
    },

    /// The device kept streaming interface bytes past the configured limit.
    #[error("Interface document exceeds {0} bytes")]
    InterfaceTooLarge(usize),

    /// No endpoint exists at the given path.
    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// The endpoint's declared type has no wire representation.
    #[error("Endpoint {path} has unsupported type {declared_type:?}")]
    UnsupportedType {
        /// Dotted path of the endpoint.
        path: String,
        /// Type string from the interface document.
        declared_type: String,
    },

    /// A previous exchange panicked while holding the session guard.
    #[error("Session poisoned")]
    SessionPoisoned,
}

impl OdriveError {
    /// Build a [`OdriveError::TruncatedBuffer`].
    pub(crate) fn truncated(needed: usize, available: usize) -> Self {
        OdriveError::TruncatedBuffer { needed, available }
    }

    /// Check if this error came from reading past the end of a buffer.
    pub fn is_truncated(&self) -> bool {
        matches!(self, OdriveError::TruncatedBuffer { .. })
    }
}

/// Result type alias using OdriveError.
pub type Result<T> = std::result::Result<T, OdriveError>;
