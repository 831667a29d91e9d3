//! Shared data models for the SilenceCut dashboard.
//!
//! This crate provides Serde-serializable types for:
//! - Video job identifiers and upload responses
//! - Backend job status payloads and result summaries
//! - The `{error, message}` failure envelope
//! - Processing step markers and display formatting

pub mod envelope;
pub mod format;
pub mod job_status;
pub mod video;

// Re-export common types
pub use envelope::{error_field, ErrorEnvelope};
pub use format::{format_duration, format_file_size};
pub use job_status::{JobStatus, ProcessingResult, ProcessingStep, StatusPayload};
pub use video::{FileSource, UploadResponse, VideoFile, VideoId, MAX_UPLOAD_BYTES, MP4_MIME_TYPE, UPLOAD_FIELD};
