//! Session documents as exported by the editor

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ChatError;
use crate::event::Event;

/// A full chat session export
///
/// `requesterUsername`, `responderUsername` and `requests` are required; a
/// document without them is rejected as malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDocument {
    /// Display name of the user
    pub requester_username: String,
    /// Display name of the assistant
    pub responder_username: String,
    /// Request/response turns in order
    pub requests: Vec<SessionRequest>,
    /// Session identifier, when exported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl SessionDocument {
    /// Validate an already parsed JSON value
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::MalformedSession`] when required fields are
    /// missing or have the wrong type.
    pub fn from_value(value: Value) -> Result<Self, ChatError> {
        serde_json::from_value(value).map_err(|e| ChatError::MalformedSession {
            reason: e.to_string(),
        })
    }

    /// Number of turns
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    /// Total number of response events across all turns
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.requests.iter().map(|r| r.response.len()).sum()
    }
}

/// One request and the events of its response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    /// Request identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// What the user asked
    pub message: RequestMessage,
    /// Flat event log of the response
    pub response: Vec<Event>,
    /// Completion metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<RequestResult>,
    /// Milliseconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Model selected in the editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
}

impl SessionRequest {
    /// Identifier used to look up the model that answered
    #[must_use]
    pub fn response_id(&self) -> Option<&str> {
        self.result
            .as_ref()
            .and_then(|r| r.metadata.as_ref())
            .and_then(|m| m.response_id.as_deref())
    }

    /// Wall-clock time the response took
    ///
    /// `None` when missing, negative or not finite.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        let millis = self
            .result
            .as_ref()
            .and_then(|r| r.timings.as_ref())
            .and_then(|t| t.total_elapsed)?;
        Duration::try_from_secs_f64(millis / 1000.0).ok()
    }

    /// When the request was sent
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.and_then(DateTime::from_timestamp_millis)
    }
}

/// The user's message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMessage {
    /// Message text
    pub text: String,
}

/// Completion metadata of a response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestResult {
    /// Identifiers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResultMetadata>,
    /// Timings in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timings: Option<ResultTimings>,
}

/// Response identifiers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    /// Key into the model lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
}

/// Response timings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultTimings {
    /// Time until the first progress event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_progress: Option<f64>,
    /// Total response time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_elapsed: Option<f64>,
}

/// Parse a session document from JSON text
///
/// # Errors
///
/// Returns [`ChatError::JsonParse`] for invalid JSON and
/// [`ChatError::MalformedSession`] when required fields are missing.
pub fn parse_session_json(json: &str) -> Result<SessionDocument, ChatError> {
    let value: Value = serde_json::from_str(json)?;
    SessionDocument::from_value(value)
}

/// Read and parse a session export file
///
/// # Errors
///
/// Returns [`ChatError::Io`] if the file cannot be read, otherwise as
/// [`parse_session_json`].
pub fn parse_session_file(path: &Path) -> Result<SessionDocument, ChatError> {
    let json = std::fs::read_to_string(path)?;
    parse_session_json(&json)
}
