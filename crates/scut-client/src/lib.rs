//! Client for the SilenceCut processing backend.
//!
//! The [`VideoService`] trait is the seam every caller goes through: the
//! gateway forwards to it, the dashboard drives its flow through it, and tests
//! swap in fakes. [`VideoClient`] is the `reqwest` implementation and can
//! address any base URL exposing the video API (the backend itself or the
//! gateway in front of it).

pub mod client;
pub mod error;
pub mod service;

pub use client::{VideoClient, VideoClientConfig};
pub use error::{ClientError, ClientResult};
pub use service::{RelayedResponse, UploadForm, VideoService};
