//! Dashboard UI state.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use scut_models::{ProcessingResult, ProcessingStep, VideoFile, VideoId};

pub const INITIAL_MESSAGE: &str = "Initializing processing...";
pub const UPLOADING_MESSAGE: &str = "Uploading video...";
pub const STARTING_MESSAGE: &str = "Starting processing...";
pub const PROCESSING_MESSAGE: &str = "Processing...";

/// Screen of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Upload,
    Processing,
    Download,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Upload => "upload",
            Phase::Processing => "processing",
            Phase::Download => "download",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of everything a view needs to render the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub phase: Phase,
    pub selected_file: Option<Arc<VideoFile>>,
    pub video_id: Option<VideoId>,
    /// Progress 0-100
    pub progress: u8,
    pub status_message: String,
    pub completed_steps: BTreeSet<ProcessingStep>,
    /// Error overlay
    pub error: Option<String>,
    pub result: Option<ProcessingResult>,
    /// Bumped on every start and reset; stale tasks compare against it.
    pub(crate) session: u64,
    /// Bumped on every raised error; stale overlay timers compare against it.
    pub(crate) error_seq: u64,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            phase: Phase::Upload,
            selected_file: None,
            video_id: None,
            progress: 0,
            status_message: INITIAL_MESSAGE.to_string(),
            completed_steps: BTreeSet::new(),
            error: None,
            result: None,
            session: 0,
            error_seq: 0,
        }
    }
}

impl DashboardState {
    pub fn is_step_completed(&self, step: ProcessingStep) -> bool {
        self.completed_steps.contains(&step)
    }

    /// Set the error overlay and return its sequence number.
    pub(crate) fn raise_error(&mut self, message: impl Into<String>) -> u64 {
        self.error_seq += 1;
        self.error = Some(message.into());
        self.error_seq
    }

    /// Leave `Processing` for `Upload` with an error overlay.
    pub(crate) fn revert(&mut self, message: impl Into<String>) -> u64 {
        self.phase = Phase::Upload;
        self.raise_error(message)
    }

    /// Mark every step the given progress reaches. Marks are never removed.
    pub(crate) fn mark_steps(&mut self, progress: f64) {
        self.completed_steps.extend(ProcessingStep::reached_by(progress));
    }

    /// Back to the initial state, keeping only the counters.
    pub(crate) fn clear(&mut self) {
        let session = self.session;
        let error_seq = self.error_seq + 1;
        *self = Self {
            session,
            error_seq,
            ..Self::default()
        };
    }
}
