//! Backend job status payloads for progress polling.
//!
//! The backend owns the job; these types model only the fields the dashboard
//! consumes. Every field is optional so that schema additions on the backend
//! side never break polling.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::format::format_duration;

/// Job lifecycle phase reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Upload accepted, processing not started
    Uploaded,
    /// Job is actively being processed
    Processing,
    /// Job completed successfully
    Completed,
    /// Job failed with an error
    Failed,
    /// Any status string this client does not know
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Uploaded => "uploaded",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result summary attached to a completed job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    /// Percentage of the original duration removed
    #[serde(default)]
    pub percentage_saved: Option<f64>,
    /// Duration of the output video in seconds
    #[serde(default)]
    pub final_duration: Option<f64>,
}

impl ProcessingResult {
    /// Saved percentage rounded to an integer, e.g. `35%`.
    pub fn saved_display(&self) -> String {
        let pct = self
            .percentage_saved
            .filter(|p| p.is_finite())
            .map(|p| p.round())
            .unwrap_or(0.0);
        format!("{}%", pct as i64)
    }

    /// Final duration as `m:ss`.
    pub fn duration_display(&self) -> String {
        format_duration(self.final_duration.unwrap_or(0.0))
    }
}

/// Status response body of `GET /api/videos/{id}/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    #[serde(default)]
    pub status: Option<JobStatus>,
    /// Progress 0-100
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub result: Option<ProcessingResult>,
}

impl StatusPayload {
    /// Reported progress clamped to 0-100, 0 when absent.
    pub fn progress_percent(&self) -> u8 {
        match self.progress {
            Some(p) if p.is_finite() => p.clamp(0.0, 100.0) as u8,
            _ => 0,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == Some(JobStatus::Completed)
    }

    pub fn is_failed(&self) -> bool {
        self.status == Some(JobStatus::Failed)
    }
}

/// Sub-steps displayed while a job is processing.
///
/// Each step is marked done the first time the reported progress reaches its
/// threshold, and stays marked for the rest of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStep {
    AudioAnalysis,
    SilenceRemoval,
    Finalizing,
}

impl ProcessingStep {
    pub const ALL: [ProcessingStep; 3] = [
        ProcessingStep::AudioAnalysis,
        ProcessingStep::SilenceRemoval,
        ProcessingStep::Finalizing,
    ];

    /// Progress at which the step counts as done.
    pub fn threshold(&self) -> f64 {
        match self {
            ProcessingStep::AudioAnalysis => 10.0,
            ProcessingStep::SilenceRemoval => 50.0,
            ProcessingStep::Finalizing => 90.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProcessingStep::AudioAnalysis => "Audio analysis and silence detection",
            ProcessingStep::SilenceRemoval => "Silence removal and optimization",
            ProcessingStep::Finalizing => "Finalizing the video",
        }
    }

    /// Steps whose threshold the given progress value reaches.
    pub fn reached_by(progress: f64) -> impl Iterator<Item = ProcessingStep> {
        Self::ALL.into_iter().filter(move |s| progress >= s.threshold())
    }
}
