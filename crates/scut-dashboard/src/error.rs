//! Dashboard error types.

use thiserror::Error;

use crate::state::Phase;

pub type DashboardResult<T> = Result<T, DashboardError>;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// Rejected file; never reaches the network.
    #[error("{0}")]
    Validation(String),

    #[error("No file selected")]
    NoFileSelected,

    #[error("Not allowed in the {0} phase")]
    InvalidPhase(Phase),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Could not start processing: {0}")]
    ProcessStart(String),

    /// Polling ended without a completed job.
    #[error("Processing did not complete: {0}")]
    Status(String),

    /// The run was reset while a request was in flight.
    #[error("Run was reset")]
    Superseded,

    #[error("No Tokio runtime available")]
    NoRuntime,
}
