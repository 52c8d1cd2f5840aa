//! Error types for retrace-chat

use thiserror::Error;

/// Errors that can occur while loading a chat session
#[derive(Debug, Error)]
pub enum ChatError {
    /// The document is not valid JSON
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Error reading a session file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Valid JSON without the required session fields
    #[error("Malformed session document: {reason}")]
    MalformedSession {
        /// The missing or mistyped field
        reason: String,
    },
}
