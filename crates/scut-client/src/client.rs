//! Video API HTTP client.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{header, Body, Client, Response};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};
use url::Url;

use scut_models::{FileSource, VideoFile, VideoId, UPLOAD_FIELD};

use crate::error::{ClientError, ClientResult};
use crate::service::{RelayedResponse, UploadForm, VideoService};

const DEFAULT_BASE_URL: &str = "http://localhost:3333";

/// Configuration for the video API client.
#[derive(Debug, Clone)]
pub struct VideoClientConfig {
    /// Base URL of the video API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for VideoClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(600), // uploads of up to 250 MiB
        }
    }
}

impl VideoClientConfig {
    /// Config for the backend, from `API_URL`.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(
                std::env::var("BACKEND_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// `reqwest` implementation of [`VideoService`].
pub struct VideoClient {
    http: Client,
    base_url: Url,
}

impl VideoClient {
    /// Create a new client.
    pub fn new(config: VideoClientConfig) -> ClientResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(config.base_url));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self { http, base_url })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(VideoClientConfig::from_env())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `{base}/api/videos/{segments...}` with each segment percent-encoded.
    fn videos_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").push("videos").extend(segments);
        }
        url
    }

    /// Stream the processed video to `dest`, returning the number of bytes written.
    pub async fn download_to(&self, video_id: &VideoId, dest: &Path) -> ClientResult<u64> {
        let url = self.videos_url(&[video_id.as_str(), "download"]);
        debug!(video_id = %video_id, dest = %dest.display(), "Downloading processed video");

        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::UnexpectedStatus(response.status().as_u16()));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }

    async fn multipart_for(file: VideoFile) -> ClientResult<Form> {
        let part = match file.source {
            FileSource::Memory(bytes) => Part::bytes(bytes),
            FileSource::Path(path) => {
                let handle = tokio::fs::File::open(&path).await?;
                let length = handle.metadata().await?.len();
                Part::stream_with_length(Body::wrap_stream(ReaderStream::new(handle)), length)
            }
        };
        let part = part
            .file_name(file.name)
            .mime_str(&file.mime_type)
            .map_err(ClientError::Network)?;

        Ok(Form::new().part(UPLOAD_FIELD, part))
    }

    /// Read a JSON body, keeping the status. An empty body is accepted only
    /// when `allow_empty` is set and then reads as `null`.
    async fn relay(response: Response, allow_empty: bool) -> ClientResult<RelayedResponse> {
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        if bytes.is_empty() && allow_empty {
            return Ok(RelayedResponse::new(status, serde_json::Value::Null));
        }

        let body = serde_json::from_slice(&bytes).map_err(|e| {
            warn!(status, "Video API returned a non-JSON body: {}", e);
            ClientError::invalid_body(e.to_string())
        })?;

        Ok(RelayedResponse::new(status, body))
    }
}

#[async_trait]
impl VideoService for VideoClient {
    async fn upload(&self, form: UploadForm) -> ClientResult<RelayedResponse> {
        let url = self.videos_url(&["upload"]);
        debug!("Sending upload request to {}", url);

        let request = match form {
            UploadForm::Raw { content_type, body } => self
                .http
                .post(url)
                .header(header::CONTENT_TYPE, content_type)
                .body(body),
            UploadForm::File(file) => self.http.post(url).multipart(Self::multipart_for(file).await?),
        };

        let response = request.send().await?;
        Self::relay(response, false).await
    }

    async fn start_processing(&self, video_id: &VideoId) -> ClientResult<RelayedResponse> {
        let url = self.videos_url(&[video_id.as_str(), "process"]);
        debug!(video_id = %video_id, "Starting processing");

        let response = self.http.post(url).send().await?;
        Self::relay(response, false).await
    }

    async fn status(&self, video_id: &VideoId) -> ClientResult<RelayedResponse> {
        let url = self.videos_url(&[video_id.as_str(), "status"]);

        let response = self.http.get(url).send().await?;
        Self::relay(response, false).await
    }

    async fn delete(&self, video_id: &VideoId) -> ClientResult<RelayedResponse> {
        let url = self.videos_url(&[video_id.as_str()]);
        debug!(video_id = %video_id, "Deleting video");

        let response = self.http.delete(url).send().await?;
        Self::relay(response, true).await
    }

    fn download_url(&self, video_id: &VideoId) -> String {
        self.videos_url(&[video_id.as_str(), "download"]).to_string()
    }

    async fn is_reachable(&self) -> bool {
        match self.http.get(self.base_url.clone()).send().await {
            Ok(_) => true,
            Err(e) => {
                warn!("Video API unreachable: {}", e);
                false
            }
        }
    }
}
