//! The video API seam.

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;

use scut_models::{error_field, VideoFile, VideoId};

use crate::error::{ClientError, ClientResult};

/// Body of an upload request.
#[derive(Debug, Clone)]
pub enum UploadForm {
    /// An already encoded multipart body, forwarded byte for byte.
    Raw { content_type: String, body: Bytes },
    /// A file to encode as multipart, under the `video` field.
    File(VideoFile),
}

/// A response relayed from the video API: its status and its JSON body.
///
/// Non-2xx answers are still `Ok(RelayedResponse)`; only transport failures
/// and unparsable bodies are errors.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayedResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl RelayedResponse {
    pub fn new(status: u16, body: serde_json::Value) -> Self {
        Self { status, body }
    }

    pub fn ok(body: serde_json::Value) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `error` string of the body, if present.
    pub fn error_message(&self) -> Option<&str> {
        error_field(&self.body)
    }

    /// Deserialize the body into a typed payload.
    pub fn parse<T: DeserializeOwned>(&self) -> ClientResult<T> {
        serde_json::from_value(self.body.clone()).map_err(|e| ClientError::invalid_body(e.to_string()))
    }
}

/// Operations of the video processing API.
#[async_trait]
pub trait VideoService: Send + Sync {
    /// `POST /api/videos/upload`
    async fn upload(&self, form: UploadForm) -> ClientResult<RelayedResponse>;

    /// `POST /api/videos/{id}/process`
    async fn start_processing(&self, video_id: &VideoId) -> ClientResult<RelayedResponse>;

    /// `GET /api/videos/{id}/status`
    async fn status(&self, video_id: &VideoId) -> ClientResult<RelayedResponse>;

    /// `DELETE /api/videos/{id}`
    async fn delete(&self, video_id: &VideoId) -> ClientResult<RelayedResponse>;

    /// Direct URL of `GET /api/videos/{id}/download`.
    fn download_url(&self, video_id: &VideoId) -> String;

    /// Whether the API answers at all.
    async fn is_reachable(&self) -> bool;
}
