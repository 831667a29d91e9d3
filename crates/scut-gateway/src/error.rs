//! Gateway error types.
//!
//! Every failure renders as the `{error, message}` envelope with a 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use scut_client::ClientError;
use scut_models::ErrorEnvelope;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// The three forwarded operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forward {
    Upload,
    Process,
    Status,
}

impl Forward {
    pub fn as_str(&self) -> &'static str {
        match self {
            Forward::Upload => "upload",
            Forward::Process => "process",
            Forward::Status => "status",
        }
    }

    /// The fixed `error` text of the failure envelope.
    pub fn failure_label(&self) -> &'static str {
        match self {
            Forward::Upload => "Failed to upload video",
            Forward::Process => "Failed to start processing",
            Forward::Status => "Failed to get status",
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{}: {source}", .action.failure_label())]
    Backend {
        action: Forward,
        #[source]
        source: ClientError,
    },

    #[error("{}: {message}", .action.failure_label())]
    InvalidRequest { action: Forward, message: String },
}

impl GatewayError {
    pub fn backend(action: Forward, source: ClientError) -> Self {
        Self::Backend { action, source }
    }

    pub fn invalid_request(action: Forward, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            action,
            message: message.into(),
        }
    }

    pub fn action(&self) -> Forward {
        match self {
            GatewayError::Backend { action, .. } | GatewayError::InvalidRequest { action, .. } => *action,
        }
    }

    /// The envelope body sent to the client.
    pub fn envelope(&self) -> ErrorEnvelope {
        let message = match self {
            GatewayError::Backend { source, .. } => source.to_string(),
            GatewayError::InvalidRequest { message, .. } => message.clone(),
        };
        ErrorEnvelope::new(self.action().failure_label(), message)
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        error!(action = self.action().as_str(), "{}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self.envelope())).into_response()
    }
}
