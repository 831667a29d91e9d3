//! Status polling while a job is processing.

use std::sync::Arc;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use scut_client::{ClientResult, RelayedResponse, VideoService};
use scut_models::{StatusPayload, VideoId};

use crate::controller::Shared;
use crate::state::{DashboardState, Phase, PROCESSING_MESSAGE};

pub const STATUS_HTTP_ERROR: &str = "Error retrieving status";
pub const STATUS_CHECK_ERROR: &str = "Error checking status";
pub const PROCESSING_FAILED: &str = "Processing failed";
pub const PROCESSING_TIMED_OUT: &str = "Processing timed out";

/// What the poll loop does after one status response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PollStep {
    Continue,
    Completed,
    /// Reverted to `Upload`; carries the sequence number of the raised error.
    Stopped(u64),
}

/// Fold one status response into the state.
pub(crate) fn apply_status(
    state: &mut DashboardState,
    response: ClientResult<RelayedResponse>,
) -> PollStep {
    let response = match response {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "Status request failed");
            return PollStep::Stopped(state.revert(STATUS_CHECK_ERROR));
        }
    };

    if !response.is_success() {
        warn!(status = response.status, "Status request rejected");
        return PollStep::Stopped(state.revert(STATUS_HTTP_ERROR));
    }

    let payload: StatusPayload = match response.parse() {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Unreadable status payload");
            return PollStep::Stopped(state.revert(STATUS_CHECK_ERROR));
        }
    };

    state.progress = payload.progress_percent();
    state.status_message = payload
        .message
        .clone()
        .unwrap_or_else(|| PROCESSING_MESSAGE.to_string());
    state.mark_steps(payload.progress.unwrap_or(0.0));

    if payload.is_completed() {
        state.progress = 100;
        state.result = Some(payload.result.unwrap_or_default());
        state.phase = Phase::Download;
        PollStep::Completed
    } else if payload.is_failed() {
        let message = payload
            .error
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| PROCESSING_FAILED.to_string());
        PollStep::Stopped(state.revert(message))
    } else {
        PollStep::Continue
    }
}

/// Poll the job status every `poll_interval` until a terminal status, an
/// error, the optional deadline, or cancellation.
pub(crate) async fn run(
    shared: Arc<Shared>,
    service: Arc<dyn VideoService>,
    video_id: VideoId,
    session: u64,
    token: CancellationToken,
) {
    let period = shared.config.poll_interval;
    let deadline = shared.config.max_poll_duration.map(|d| Instant::now() + d);

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(video_id = %video_id, "Polling job status every {:?}", period);

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                debug!(video_id = %video_id, "Polling cancelled");
                return;
            }
            _ = ticker.tick() => {}
        }

        if deadline.is_some_and(|d| Instant::now() >= d) {
            warn!(video_id = %video_id, "Giving up on job status");
            if let Some(seq) = shared.update_session(session, |s| s.revert(PROCESSING_TIMED_OUT)) {
                shared.schedule_error_clear(seq);
            }
            return;
        }

        let response = tokio::select! {
            _ = token.cancelled() => {
                debug!(video_id = %video_id, "Polling cancelled mid-request");
                return;
            }
            response = service.status(&video_id) => response,
        };

        let step = shared.update_session(session, |s| {
            if s.phase != Phase::Processing {
                return None;
            }
            Some(apply_status(s, response))
        });

        match step.flatten() {
            Some(PollStep::Continue) => continue,
            Some(PollStep::Completed) => {
                info!(video_id = %video_id, "Job completed");
                return;
            }
            Some(PollStep::Stopped(seq)) => {
                shared.schedule_error_clear(seq);
                return;
            }
            None => {
                debug!(video_id = %video_id, "Dropping status of a superseded run");
                return;
            }
        }
    }
}
