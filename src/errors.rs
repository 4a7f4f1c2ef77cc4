/*!
 * Error types for the bulk-translate application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Message recorded on an item when the remote side rejects a step without saying why
pub const DEFAULT_REJECTION_MESSAGE: &str = "Translation failed";

/// Message recorded on an item when a step request never produced a usable response
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Request failed";

/// Message recorded on an item when the queue was cancelled at a step boundary
pub const CANCELLED_MESSAGE: &str = "Translation cancelled";

/// Errors a step transport can report for a single request
#[derive(Error, Debug)]
pub enum TransportError {
    /// The request could not be sent or no response arrived
    #[error("Connection error: {0}")]
    Connection(String),

    /// The endpoint answered with a non-success HTTP status
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Http {
        /// HTTP status code
        status: u16,
        /// Message extracted from the error body, if it had one
        message: Option<String>,
    },

    /// The response body could not be understood
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Why a single queue item failed.
///
/// The `Display` output is exactly what ends up in the item's error message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// The remote service answered `success: false` (or an error status with a message)
    #[error("{message}")]
    Rejected {
        /// Message reported by the remote service
        message: String,
    },

    /// Network failure or unparseable response
    #[error("{}", TRANSPORT_FAILURE_MESSAGE)]
    Transport(String),

    /// The cancellation flag was observed before a step request
    #[error("{}", CANCELLED_MESSAGE)]
    Cancelled,
}

impl StepError {
    /// Build a rejection, falling back to the generic message when the remote gave none
    pub fn rejected(message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REJECTION_MESSAGE.to_string());
        Self::Rejected { message }
    }

    /// Whether this failure came from cancellation rather than the item itself
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<TransportError> for StepError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Http { message: Some(message), .. } if !message.trim().is_empty() => {
                Self::Rejected { message }
            }
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Errors raised by snapshot storage backends
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The storage location cannot be used at all
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Reading or writing the stored value failed
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot could not be encoded or decoded
    #[error("Snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the step transport
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Error from snapshot storage
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
