//! Video forwarding handlers.
//!
//! Transparent pass-throughs to the backend: the backend's status code and
//! JSON body are relayed as-is, including non-2xx answers. A 500 envelope is
//! produced only when the backend cannot be reached or its body is not JSON.

use std::time::Instant;

use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use tracing::{debug, info};

use scut_client::{ClientResult, RelayedResponse, UploadForm};
use scut_models::VideoId;

use crate::error::{Forward, GatewayError, GatewayResult};
use crate::metrics;
use crate::state::AppState;

/// A backend answer passed through unchanged.
#[derive(Debug)]
pub struct Relayed(pub RelayedResponse);

impl IntoResponse for Relayed {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0.body)).into_response()
    }
}

/// Record the outcome of a backend call and map transport failures.
fn relay(action: Forward, started: Instant, result: ClientResult<RelayedResponse>) -> GatewayResult<Relayed> {
    match result {
        Ok(response) => {
            metrics::record_backend_response(action.as_str(), response.status, started.elapsed().as_secs_f64());
            debug!(action = action.as_str(), status = response.status, "Relaying backend response");
            Ok(Relayed(response))
        }
        Err(e) => {
            metrics::record_backend_failure(action.as_str());
            Err(GatewayError::backend(action, e))
        }
    }
}

/// Forward a multipart upload.
///
/// The body and its `Content-Type` (boundary included) are sent to the
/// backend byte for byte. A body that cannot be read (over the size limit,
/// or cut off by the client) gets the upload failure envelope.
pub async fn upload_video(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> GatewayResult<Relayed> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|ct| ct.starts_with("multipart/form-data"))
        .ok_or_else(|| GatewayError::invalid_request(Forward::Upload, "Expected a multipart/form-data body"))?
        .to_string();

    let body = body.map_err(|rejection| GatewayError::invalid_request(Forward::Upload, rejection.body_text()))?;

    info!(bytes = body.len(), "Forwarding video upload");

    let started = Instant::now();
    let result = state
        .backend
        .upload(UploadForm::Raw { content_type, body })
        .await;
    relay(Forward::Upload, started, result)
}

/// Forward a process-start request.
pub async fn start_processing(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> GatewayResult<Relayed> {
    let video_id = VideoId::from_string(video_id);
    info!(video_id = %video_id, "Forwarding process start");

    let started = Instant::now();
    let result = state.backend.start_processing(&video_id).await;
    relay(Forward::Process, started, result)
}

/// Forward a status read.
pub async fn get_status(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> GatewayResult<Relayed> {
    let video_id = VideoId::from_string(video_id);

    let started = Instant::now();
    let result = state.backend.status(&video_id).await;
    relay(Forward::Status, started, result)
}
