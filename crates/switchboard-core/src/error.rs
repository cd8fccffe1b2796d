//! Error types for switchboard.
//!
//! One enum covers both halves of the wire: transport faults, codec failures,
//! and the handler-authored errors that become 500 responses.

use thiserror::Error;

/// Main error type for switchboard operations.
#[derive(Debug, Error)]
pub enum SwitchboardError {
    // Transport errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("failed to connect to {addr}: {message}")]
    Connect { addr: String, message: String },

    #[error("connection closed before a response arrived")]
    ConnectionClosed,

    #[error("frame size {size} exceeds maximum {max}")]
    FrameTooLarge { size: usize, max: usize },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Call futures
    #[error("promise dropped before resolution")]
    BrokenPromise,

    // Generic errors (handler failures surface here)
    #[error("{0}")]
    Other(String),
}

/// Result type alias for switchboard operations.
pub type Result<T> = std::result::Result<T, SwitchboardError>;

// Conversion implementations for common error types

impl From<std::io::Error> for SwitchboardError {
    fn from(err: std::io::Error) -> Self {
        SwitchboardError::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for SwitchboardError {
    fn from(err: serde_json::Error) -> Self {
        SwitchboardError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}
