//! Video job identifiers and upload models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The only MIME type accepted for uploads.
pub const MP4_MIME_TYPE: &str = "video/mp4";

/// Upload ceiling: 250 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 250 * 1024 * 1024;

/// Multipart field name carrying the video file.
pub const UPLOAD_FIELD: &str = "video";

/// Opaque identifier the backend issues for an uploaded video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Upload response returned by the backend.
///
/// Only the identifier is consumed; everything else in the body is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<VideoId>,
}

/// Where the bytes of a selected file live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// File on local disk, read when the upload starts.
    Path(PathBuf),
    /// Bytes already in memory.
    Memory(Vec<u8>),
}

/// A file handle selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFile {
    /// File name sent in the multipart part
    pub name: String,
    /// Declared size in bytes
    pub size: u64,
    /// Declared MIME type
    pub mime_type: String,
    /// File contents
    pub source: FileSource,
}

impl VideoFile {
    /// Create a file handle around in-memory bytes.
    pub fn in_memory(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            mime_type: mime_type.into(),
            source: FileSource::Memory(bytes),
        }
    }

    /// Create a file handle pointing at a file on disk.
    pub fn on_disk(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
            source: FileSource::Path(path.into()),
        }
    }

    pub fn is_mp4(&self) -> bool {
        self.mime_type == MP4_MIME_TYPE
    }

    pub fn exceeds_upload_limit(&self) -> bool {
        self.size > MAX_UPLOAD_BYTES
    }
}
