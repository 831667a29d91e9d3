//! Uniform failure envelope returned by the gateway.

use serde::{Deserialize, Serialize};

/// `{ "error": ..., "message": ... }` body synthesized when the backend
/// cannot be reached or answers with something that is not JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// Read the `error` field of an arbitrary JSON body, if it is a string.
pub fn error_field(body: &serde_json::Value) -> Option<&str> {
    body.get("error")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
}
