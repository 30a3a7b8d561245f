//! Error types for the Galaxy object layer.
//!
//! Wrapper access errors, selection errors and everything the remote client
//! can surface share one enum so callers can `?` across layers.

use thiserror::Error;

/// Main error type for wrapper access and remote calls.
#[derive(Error, Debug)]
pub enum GalaxyError {
    /// Field or parameter was not part of the object's document at construction
    #[error("No such field '{key}' on {owner}")]
    NotFound { owner: &'static str, key: String },

    /// A "pick exactly one" lookup matched zero or several candidates
    #[error("Expected exactly one {what}, found {count}")]
    AmbiguousSelection { what: String, count: usize },

    /// Transport-level failure (connection, TLS, timeout)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Document does not have the shape the wrapper expects
    #[error("Malformed document: {message}")]
    Document { message: String },

    /// Operation needs a server id the object does not have
    #[error("{what} has no id; it was never saved or has been deleted")]
    MissingId { what: &'static str },

    /// Server reply could not be interpreted
    #[error("{operation}: unexpected reply: {reply}")]
    UnexpectedReply { operation: String, reply: String },

    /// Base URL could not be used
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration file could not be read or written
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// No API key was available
    #[error("API key not set; export {variable} or set API_KEY in the config file")]
    MissingCredential { variable: &'static str },
}

impl GalaxyError {
    /// Create a not-found error for `key` on an object of kind `owner`.
    pub fn not_found(owner: &'static str, key: impl Into<String>) -> Self {
        GalaxyError::NotFound {
            owner,
            key: key.into(),
        }
    }

    /// Create a malformed-document error.
    pub fn document(message: impl Into<String>) -> Self {
        GalaxyError::Document {
            message: message.into(),
        }
    }

    /// Create an unexpected-reply error, rendering the reply compactly.
    pub fn unexpected_reply(operation: &str, reply: &serde_json::Value) -> Self {
        GalaxyError::UnexpectedReply {
            operation: operation.to_string(),
            reply: reply.to_string(),
        }
    }

    /// True for field/parameter lookups that missed.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GalaxyError::NotFound { .. })
    }

    /// HTTP status of a server-side failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            GalaxyError::Api { status, .. } => Some(*status),
            GalaxyError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type for wrapper and client operations
pub type Result<T> = std::result::Result<T, GalaxyError>;
