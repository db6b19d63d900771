//! Batch request and response types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One request within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntryRequest {
    /// HTTP method, such as `POST`.
    pub method: String,
    /// API path, such as `/v1/calendars/cal_123/events`.
    pub relative_url: String,
    /// Request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Unrecognised fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The outcome of one request within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntryResponse {
    /// HTTP status of the sub-request.
    pub status: u16,
    /// Response headers of the sub-request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Map<String, Value>>,
    /// Response body of the sub-request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Unrecognised fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A batch request paired with its response.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    /// The request sent.
    pub request: BatchEntryRequest,
    /// The response received.
    pub response: BatchEntryResponse,
}

impl BatchEntry {
    /// Returns the sub-request's status.
    pub fn status(&self) -> u16 {
        self.response.status
    }

    /// Returns true if the sub-request succeeded.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.response.status)
    }
}

/// Results of a batch, in request order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchResponse {
    /// All entries.
    pub entries: Vec<BatchEntry>,
}

impl BatchResponse {
    /// Creates a batch response.
    pub fn new(entries: Vec<BatchEntry>) -> Self {
        Self { entries }
    }

    /// Entries whose status is outside the 2xx range.
    pub fn errors(&self) -> impl Iterator<Item = &BatchEntry> {
        self.entries.iter().filter(|entry| !entry.is_success())
    }

    /// Returns true if any entry failed.
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}
