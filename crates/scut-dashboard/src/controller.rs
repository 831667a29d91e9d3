//! The upload/process/poll controller.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use scut_client::{ClientResult, RelayedResponse, UploadForm, VideoService};
use scut_models::{format_file_size, ProcessingResult, UploadResponse, VideoFile, VideoId};

use crate::config::DashboardConfig;
use crate::error::{DashboardError, DashboardResult};
use crate::poller;
use crate::state::{DashboardState, Phase, STARTING_MESSAGE, UPLOADING_MESSAGE};
use crate::task::ScopedTask;

pub const INVALID_FORMAT: &str = "Invalid file format. Please select an MP4 file.";
pub const UPLOAD_FAILED: &str = "Upload failed";
pub const PROCESS_START_FAILED: &str = "Failed to start processing";

/// State shared between the controller and its background tasks.
pub(crate) struct Shared {
    pub(crate) state: watch::Sender<DashboardState>,
    pub(crate) config: DashboardConfig,
    runtime: Handle,
    overlay: Mutex<Option<ScopedTask>>,
}

impl Shared {
    /// Apply `f` only while `session` is still the current run.
    pub(crate) fn update_session<R>(
        &self,
        session: u64,
        f: impl FnOnce(&mut DashboardState) -> R,
    ) -> Option<R> {
        let mut out = None;
        self.state.send_if_modified(|s| {
            if s.session != session {
                return false;
            }
            out = Some(f(s));
            true
        });
        out
    }

    /// Clear the error overlay after `error_display`, unless a newer error
    /// replaced it in the meantime.
    pub(crate) fn schedule_error_clear(self: &Arc<Self>, seq: u64) {
        let shared = Arc::downgrade(self);
        let delay = self.config.error_display;

        let timer = ScopedTask::spawn(&self.runtime, move |token| async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            if let Some(shared) = shared.upgrade() {
                shared.state.send_if_modified(|s| {
                    if s.error_seq != seq || s.error.is_none() {
                        return false;
                    }
                    s.error = None;
                    true
                });
            }
        });

        // Replacing the slot cancels the previous timer.
        *self.overlay.lock().unwrap_or_else(PoisonError::into_inner) = Some(timer);
    }

    fn cancel_error_clear(&self) {
        self.overlay.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

/// Drives one video through `upload -> processing -> download`.
///
/// Uploads, process starts and status polls go through `gateway`; deleting a
/// job and building its download URL go straight to `backend`.
pub struct Dashboard {
    shared: Arc<Shared>,
    gateway: Arc<dyn VideoService>,
    backend: Arc<dyn VideoService>,
    poller: Mutex<Option<ScopedTask>>,
}

impl Dashboard {
    /// Create a dashboard on the current Tokio runtime.
    pub fn new(
        config: DashboardConfig,
        gateway: Arc<dyn VideoService>,
        backend: Arc<dyn VideoService>,
    ) -> DashboardResult<Self> {
        let runtime = Handle::try_current().map_err(|_| DashboardError::NoRuntime)?;
        let (state, _) = watch::channel(DashboardState::default());

        Ok(Self {
            shared: Arc::new(Shared {
                state,
                config,
                runtime,
                overlay: Mutex::new(None),
            }),
            gateway,
            backend,
            poller: Mutex::new(None),
        })
    }

    /// Receive every state change.
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.shared.state.subscribe()
    }

    pub fn snapshot(&self) -> DashboardState {
        self.shared.state.borrow().clone()
    }

    /// Select the file to process.
    ///
    /// A file that is not `video/mp4` or exceeds the upload limit raises the
    /// error overlay and leaves the current selection untouched.
    pub fn select_file(&self, file: VideoFile) -> DashboardResult<()> {
        let phase = self.shared.state.borrow().phase;
        if phase != Phase::Upload {
            return Err(DashboardError::InvalidPhase(phase));
        }

        let rejection = if !file.is_mp4() {
            Some(INVALID_FORMAT.to_string())
        } else if file.exceeds_upload_limit() {
            Some(format!(
                "File size exceeds the 250 MB limit. Current size: {}",
                format_file_size(file.size)
            ))
        } else {
            None
        };

        if let Some(message) = rejection {
            info!(file = %file.name, mime_type = %file.mime_type, size = file.size, "File rejected");
            self.raise_error(message.clone());
            return Err(DashboardError::Validation(message));
        }

        debug!(file = %file.name, size = file.size, "File selected");
        let file = Arc::new(file);
        let mut outcome = Ok(());
        self.shared.state.send_if_modified(|s| {
            if s.phase != Phase::Upload {
                outcome = Err(DashboardError::InvalidPhase(s.phase));
                return false;
            }
            s.selected_file = Some(file);
            s.error = None;
            true
        });
        outcome
    }

    /// Drop the selected file.
    pub fn remove_file(&self) -> DashboardResult<()> {
        let mut outcome = Ok(());
        self.shared.state.send_if_modified(|s| {
            if s.phase != Phase::Upload {
                outcome = Err(DashboardError::InvalidPhase(s.phase));
                return false;
            }
            s.selected_file.take().is_some()
        });
        outcome
    }

    /// Upload the selected file, start processing it and begin polling.
    ///
    /// Returns once polling has started. Every failure reverts the dashboard
    /// to `Upload` with the error overlay set.
    pub async fn start(&self) -> DashboardResult<VideoId> {
        let mut begun = Err(DashboardError::NoFileSelected);
        self.shared.state.send_if_modified(|s| {
            if s.phase != Phase::Upload {
                begun = Err(DashboardError::InvalidPhase(s.phase));
                return false;
            }
            let Some(file) = s.selected_file.clone() else {
                return false;
            };
            s.session += 1;
            s.phase = Phase::Processing;
            s.error = None;
            s.progress = 0;
            s.status_message = UPLOADING_MESSAGE.to_string();
            s.completed_steps.clear();
            s.result = None;
            begun = Ok((file, s.session));
            true
        });
        let (file, session) = begun?;

        info!(file = %file.name, size = file.size, "Uploading video");
        let uploaded = self.gateway.upload(UploadForm::File((*file).clone())).await;
        let video_id = match self.upload_outcome(uploaded) {
            Ok(video_id) => video_id,
            Err(message) => {
                self.revert(session, message.clone())?;
                return Err(DashboardError::Upload(message));
            }
        };

        info!(video_id = %video_id, "Upload complete, starting processing");
        let recorded = self.shared.update_session(session, |s| {
            s.video_id = Some(video_id.clone());
            s.progress = 10;
            s.status_message = STARTING_MESSAGE.to_string();
        });
        if recorded.is_none() {
            // Reset while uploading; nothing else knows about this job.
            self.delete_job(&video_id).await;
            return Err(DashboardError::Superseded);
        }

        let started = self.gateway.start_processing(&video_id).await;
        if let Err(message) = response_outcome(started, PROCESS_START_FAILED) {
            self.revert(session, message.clone())?;
            return Err(DashboardError::ProcessStart(message));
        }

        self.spawn_poller(video_id.clone(), session)?;
        Ok(video_id)
    }

    /// Wait until the current run leaves `Processing`.
    pub async fn wait_until_settled(&self) -> DashboardResult<ProcessingResult> {
        let mut rx = self.subscribe();
        let settled = rx
            .wait_for(|s| s.phase != Phase::Processing)
            .await
            .map_err(|_| DashboardError::Superseded)?;

        match (settled.phase, &settled.result) {
            (Phase::Download, Some(result)) => Ok(result.clone()),
            _ => Err(DashboardError::Status(
                settled.error.clone().unwrap_or_else(|| "job was not completed".to_string()),
            )),
        }
    }

    /// Back to the initial state.
    ///
    /// A job that was uploaded is deleted on the backend, best effort.
    pub async fn reset(&self) {
        let mut video_id = None;
        self.shared.state.send_modify(|s| {
            s.session += 1;
            video_id = s.video_id.take();
            s.clear();
        });
        self.cancel_polling();
        self.shared.cancel_error_clear();

        if let Some(video_id) = video_id {
            self.delete_job(&video_id).await;
        }
    }

    async fn delete_job(&self, video_id: &VideoId) {
        match self.backend.delete(video_id).await {
            Ok(response) if response.is_success() => {
                info!(video_id = %video_id, "Deleted job");
            }
            Ok(response) => {
                warn!(video_id = %video_id, status = response.status, "Job delete rejected");
            }
            Err(e) => {
                warn!(video_id = %video_id, error = %e, "Job delete failed");
            }
        }
    }

    /// Where the processed video can be fetched, once in `Download`.
    pub fn download_url(&self) -> Option<String> {
        let state = self.shared.state.borrow();
        match (state.phase, &state.video_id) {
            (Phase::Download, Some(video_id)) => Some(self.backend.download_url(video_id)),
            _ => None,
        }
    }

    pub fn dismiss_error(&self) {
        self.shared.cancel_error_clear();
        self.shared.state.send_if_modified(|s| s.error.take().is_some());
    }

    fn raise_error(&self, message: String) {
        let mut seq = 0;
        self.shared.state.send_modify(|s| seq = s.raise_error(message));
        self.shared.schedule_error_clear(seq);
    }

    fn revert(&self, session: u64, message: String) -> DashboardResult<()> {
        let seq = self
            .shared
            .update_session(session, |s| s.revert(message))
            .ok_or(DashboardError::Superseded)?;
        self.shared.schedule_error_clear(seq);
        Ok(())
    }

    fn upload_outcome(&self, uploaded: ClientResult<RelayedResponse>) -> Result<VideoId, String> {
        let response = response_outcome(uploaded, UPLOAD_FAILED)?;
        match response.parse::<UploadResponse>() {
            Ok(UploadResponse {
                video_id: Some(video_id),
            }) if !video_id.as_str().is_empty() => Ok(video_id),
            Ok(_) => {
                warn!("Upload response has no videoId");
                Err(UPLOAD_FAILED.to_string())
            }
            Err(e) => {
                warn!(error = %e, "Unreadable upload response");
                Err(UPLOAD_FAILED.to_string())
            }
        }
    }

    fn spawn_poller(&self, video_id: VideoId, session: u64) -> DashboardResult<()> {
        let mut slot = self.poller.lock().unwrap_or_else(PoisonError::into_inner);
        // Checked under the poller lock: a reset bumps the session before it
        // takes this lock to cancel.
        if self.shared.state.borrow().session != session {
            return Err(DashboardError::Superseded);
        }

        let shared = self.shared.clone();
        let service = self.gateway.clone();
        *slot = Some(ScopedTask::spawn(&self.shared.runtime, move |token| {
            poller::run(shared, service, video_id, session, token)
        }));
        Ok(())
    }

    fn cancel_polling(&self) {
        if let Some(task) = self.poller.lock().unwrap_or_else(PoisonError::into_inner).take() {
            task.cancel();
        }
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.cancel_polling();
        self.shared.cancel_error_clear();
    }
}

/// The successful response, or the message to show for a failed request.
fn response_outcome(
    response: ClientResult<RelayedResponse>,
    fallback: &str,
) -> Result<RelayedResponse, String> {
    match response {
        Ok(response) if response.is_success() => Ok(response),
        Ok(response) => {
            warn!(status = response.status, "Request rejected");
            Err(response
                .error_message()
                .map(str::to_string)
                .unwrap_or_else(|| fallback.to_string()))
        }
        Err(e) => {
            warn!(error = %e, "Request failed");
            Err(fallback.to_string())
        }
    }
}
