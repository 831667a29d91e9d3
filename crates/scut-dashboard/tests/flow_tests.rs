//! Controller flow tests against a scripted video service.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use scut_client::{ClientError, ClientResult, RelayedResponse, UploadForm, VideoService};
use scut_dashboard::{Dashboard, DashboardConfig, DashboardError, DashboardState, Phase};
use scut_models::{ProcessingStep, VideoFile, VideoId};

/// Answers from queues; the last status answer repeats once the queue drains.
#[derive(Default)]
struct ScriptedService {
    upload: Mutex<Option<ClientResult<RelayedResponse>>>,
    process: Mutex<Option<ClientResult<RelayedResponse>>>,
    statuses: Mutex<VecDeque<ClientResult<RelayedResponse>>>,
    delete_fails: bool,
    upload_calls: AtomicUsize,
    process_calls: AtomicUsize,
    status_calls: AtomicUsize,
    deleted: Mutex<Vec<String>>,
}

impl ScriptedService {
    fn new() -> Self {
        Self {
            upload: Mutex::new(Some(Ok(RelayedResponse::ok(json!({ "videoId": "job-1" }))))),
            process: Mutex::new(Some(Ok(RelayedResponse::ok(json!({ "status": "processing" }))))),
            ..Default::default()
        }
    }

    fn with_upload(self, response: ClientResult<RelayedResponse>) -> Self {
        *self.upload.lock().unwrap() = Some(response);
        self
    }

    fn with_process(self, response: ClientResult<RelayedResponse>) -> Self {
        *self.process.lock().unwrap() = Some(response);
        self
    }

    fn with_statuses(self, statuses: Vec<Value>) -> Self {
        *self.statuses.lock().unwrap() = statuses
            .into_iter()
            .map(|body| Ok(RelayedResponse::ok(body)))
            .collect();
        self
    }

    fn with_status_results(self, statuses: Vec<ClientResult<RelayedResponse>>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into_iter().collect();
        self
    }

    fn failing_delete(mut self) -> Self {
        self.delete_fails = true;
        self
    }

    fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    fn network_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
            + self.process_calls.load(Ordering::SeqCst)
            + self.status_calls()
    }
}

fn replay(slot: &Mutex<Option<ClientResult<RelayedResponse>>>) -> ClientResult<RelayedResponse> {
    match slot.lock().unwrap().as_ref() {
        Some(Ok(response)) => Ok(response.clone()),
        Some(Err(_)) | None => Err(ClientError::UnexpectedStatus(502)),
    }
}

#[async_trait]
impl VideoService for ScriptedService {
    async fn upload(&self, form: UploadForm) -> ClientResult<RelayedResponse> {
        assert!(matches!(form, UploadForm::File(_)));
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        replay(&self.upload)
    }

    async fn start_processing(&self, _video_id: &VideoId) -> ClientResult<RelayedResponse> {
        self.process_calls.fetch_add(1, Ordering::SeqCst);
        replay(&self.process)
    }

    async fn status(&self, _video_id: &VideoId) -> ClientResult<RelayedResponse> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            return statuses.pop_front().unwrap();
        }
        match statuses.front() {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err(_)) => Err(ClientError::UnexpectedStatus(502)),
            None => Ok(RelayedResponse::ok(json!({ "status": "processing", "progress": 0 }))),
        }
    }

    async fn delete(&self, video_id: &VideoId) -> ClientResult<RelayedResponse> {
        self.deleted.lock().unwrap().push(video_id.to_string());
        if self.delete_fails {
            Err(ClientError::UnexpectedStatus(503))
        } else {
            Ok(RelayedResponse::ok(json!({ "success": true })))
        }
    }

    fn download_url(&self, video_id: &VideoId) -> String {
        format!("http://backend.test/api/videos/{}/download", video_id)
    }

    async fn is_reachable(&self) -> bool {
        true
    }
}

fn dashboard(service: &Arc<ScriptedService>) -> Dashboard {
    Dashboard::new(DashboardConfig::default(), service.clone(), service.clone()).unwrap()
}

fn mp4(size: usize) -> VideoFile {
    VideoFile::in_memory("clip.mp4", "video/mp4", vec![0u8; size])
}

async fn settled(dashboard: &Dashboard) -> DashboardState {
    let mut rx = dashboard.subscribe();
    let state = rx.wait_for(|s| s.phase != Phase::Processing).await.unwrap();
    state.clone()
}

fn assert_cleared(state: &DashboardState) {
    assert_eq!(state.phase, Phase::Upload);
    assert!(state.selected_file.is_none());
    assert!(state.video_id.is_none());
    assert!(state.result.is_none());
    assert!(state.error.is_none());
    assert_eq!(state.progress, 0);
    assert!(state.completed_steps.is_empty());
    assert_eq!(state.status_message, "Initializing processing...");
}

#[tokio::test(start_paused = true)]
async fn test_happy_path_reaches_download() {
    let service = Arc::new(ScriptedService::new().with_statuses(vec![
        json!({ "status": "processing", "progress": 20, "message": "Analyzing audio" }),
        json!({ "status": "processing", "progress": 60 }),
        json!({
            "status": "completed",
            "progress": 100,
            "result": { "percentageSaved": 35, "finalDuration": 125 }
        }),
    ]));
    let dashboard = dashboard(&service);

    dashboard.select_file(mp4(10 * 1024 * 1024)).unwrap();
    let video_id = dashboard.start().await.unwrap();
    assert_eq!(video_id.as_str(), "job-1");
    assert_eq!(dashboard.snapshot().progress, 10);
    assert_eq!(dashboard.snapshot().status_message, "Starting processing...");

    let state = settled(&dashboard).await;
    assert_eq!(state.phase, Phase::Download);
    assert_eq!(state.progress, 100);
    let result = state.result.clone().unwrap();
    assert_eq!(result.saved_display(), "35%");
    assert_eq!(result.duration_display(), "2:05");
    assert!(state.completed_steps.iter().eq(ProcessingStep::ALL.iter()));
    assert_eq!(service.status_calls(), 3);

    assert_eq!(
        dashboard.download_url().as_deref(),
        Some("http://backend.test/api/videos/job-1/download")
    );
}

#[tokio::test(start_paused = true)]
async fn test_wait_until_settled_returns_result() {
    let service = Arc::new(ScriptedService::new().with_statuses(vec![json!({
        "status": "completed",
        "result": { "percentageSaved": 12.4, "finalDuration": 59 }
    })]));
    let dashboard = dashboard(&service);

    dashboard.select_file(mp4(1024)).unwrap();
    dashboard.start().await.unwrap();
    let result = dashboard.wait_until_settled().await.unwrap();
    assert_eq!(result.saved_display(), "12%");
    assert_eq!(result.duration_display(), "0:59");
}

#[tokio::test(start_paused = true)]
async fn test_wrong_mime_type_is_rejected_without_network() {
    let service = Arc::new(ScriptedService::new());
    let dashboard = dashboard(&service);

    let movie = VideoFile::in_memory("movie.mov", "video/quicktime", vec![0u8; 1024]);
    let err = dashboard.select_file(movie).unwrap_err();
    assert!(matches!(err, DashboardError::Validation(_)));

    let state = dashboard.snapshot();
    assert_eq!(state.phase, Phase::Upload);
    assert!(state.selected_file.is_none());
    assert_eq!(
        state.error.as_deref(),
        Some("Invalid file format. Please select an MP4 file.")
    );

    assert!(matches!(dashboard.start().await, Err(DashboardError::NoFileSelected)));
    assert_eq!(service.network_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_oversized_file_keeps_previous_selection() {
    let service = Arc::new(ScriptedService::new());
    let dashboard = dashboard(&service);
    dashboard.select_file(mp4(1024)).unwrap();

    let oversized = VideoFile::on_disk("big.mp4", "video/mp4", 300 * 1024 * 1024, "/tmp/big.mp4");
    dashboard.select_file(oversized).unwrap_err();

    let state = dashboard.snapshot();
    assert!(state.error.as_deref().unwrap().contains("300 MB"));
    assert_eq!(state.selected_file.as_ref().unwrap().name, "clip.mp4");

    // A valid selection clears the overlay.
    dashboard.select_file(mp4(2048)).unwrap();
    assert!(dashboard.snapshot().error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_upload_rejection_surfaces_backend_error() {
    let service = Arc::new(
        ScriptedService::new()
            .with_upload(Ok(RelayedResponse::new(413, json!({ "error": "disk full" })))),
    );
    let dashboard = dashboard(&service);

    dashboard.select_file(mp4(1024)).unwrap();
    let err = dashboard.start().await.unwrap_err();
    assert!(matches!(err, DashboardError::Upload(_)));

    let state = dashboard.snapshot();
    assert_eq!(state.phase, Phase::Upload);
    assert_eq!(state.error.as_deref(), Some("disk full"));
    assert!(state.selected_file.is_some());
    assert_eq!(service.process_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_upload_transport_error_uses_fallback() {
    let service = Arc::new(ScriptedService::new().with_upload(Err(ClientError::UnexpectedStatus(0))));
    let dashboard = dashboard(&service);

    dashboard.select_file(mp4(1024)).unwrap();
    dashboard.start().await.unwrap_err();
    assert_eq!(dashboard.snapshot().error.as_deref(), Some("Upload failed"));
}

#[tokio::test(start_paused = true)]
async fn test_process_start_failure_reverts() {
    let service = Arc::new(
        ScriptedService::new().with_process(Ok(RelayedResponse::new(500, json!({ "message": "nope" })))),
    );
    let dashboard = dashboard(&service);

    dashboard.select_file(mp4(1024)).unwrap();
    let err = dashboard.start().await.unwrap_err();
    assert!(matches!(err, DashboardError::ProcessStart(_)));

    let state = dashboard.snapshot();
    assert_eq!(state.phase, Phase::Upload);
    assert_eq!(state.error.as_deref(), Some("Failed to start processing"));

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(service.status_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_status_stops_polling() {
    let service = Arc::new(ScriptedService::new().with_statuses(vec![
        json!({ "status": "processing", "progress": 30 }),
        json!({ "status": "failed", "error": "ffmpeg crashed" }),
    ]));
    let dashboard = dashboard(&service);

    dashboard.select_file(mp4(1024)).unwrap();
    dashboard.start().await.unwrap();

    let state = settled(&dashboard).await;
    assert_eq!(state.phase, Phase::Upload);
    assert_eq!(state.error.as_deref(), Some("ffmpeg crashed"));

    let calls = service.status_calls();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(service.status_calls(), calls);
}

#[tokio::test(start_paused = true)]
async fn test_step_markers_never_regress() {
    let service = Arc::new(ScriptedService::new().with_statuses(vec![
        json!({ "status": "processing", "progress": 55 }),
        json!({ "status": "processing", "progress": 20 }),
        json!({ "status": "processing", "progress": 20 }),
    ]));
    let dashboard = dashboard(&service);
    let mut rx = dashboard.subscribe();

    dashboard.select_file(mp4(1024)).unwrap();
    dashboard.start().await.unwrap();

    rx.wait_for(|s| s.progress == 55).await.unwrap();
    let state = rx
        .wait_for(|s| s.progress == 20 && s.phase == Phase::Processing)
        .await
        .unwrap()
        .clone();
    assert!(state.is_step_completed(ProcessingStep::AudioAnalysis));
    assert!(state.is_step_completed(ProcessingStep::SilenceRemoval));
    assert!(!state.is_step_completed(ProcessingStep::Finalizing));
}

#[tokio::test(start_paused = true)]
async fn test_status_http_error_reverts() {
    let service = Arc::new(ScriptedService::new().with_status_results(vec![Ok(
        RelayedResponse::new(500, json!({ "error": "Failed to get status", "message": "boom" })),
    )]));
    let dashboard = dashboard(&service);

    dashboard.select_file(mp4(1024)).unwrap();
    dashboard.start().await.unwrap();

    let state = settled(&dashboard).await;
    assert_eq!(state.phase, Phase::Upload);
    assert_eq!(state.error.as_deref(), Some("Error retrieving status"));
}

#[tokio::test(start_paused = true)]
async fn test_status_transport_error_reverts() {
    let service = Arc::new(
        ScriptedService::new().with_status_results(vec![Err(ClientError::UnexpectedStatus(0))]),
    );
    let dashboard = dashboard(&service);

    dashboard.select_file(mp4(1024)).unwrap();
    dashboard.start().await.unwrap();

    let state = settled(&dashboard).await;
    assert_eq!(state.error.as_deref(), Some("Error checking status"));
}

#[tokio::test(start_paused = true)]
async fn test_error_overlay_clears_after_display_time() {
    let service = Arc::new(ScriptedService::new());
    let dashboard = dashboard(&service);

    let movie = VideoFile::in_memory("movie.mov", "video/quicktime", vec![0u8; 16]);
    dashboard.select_file(movie).unwrap_err();
    assert!(dashboard.snapshot().error.is_some());

    tokio::time::sleep(Duration::from_secs(7)).await;
    assert!(dashboard.snapshot().error.is_some());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(dashboard.snapshot().error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_newer_error_outlives_older_timer() {
    let service = Arc::new(ScriptedService::new());
    let dashboard = dashboard(&service);
    let movie = || VideoFile::in_memory("movie.mov", "video/quicktime", vec![0u8; 16]);

    dashboard.select_file(movie()).unwrap_err();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let oversized = VideoFile::on_disk("big.mp4", "video/mp4", 300 * 1024 * 1024, "/tmp/big.mp4");
    dashboard.select_file(oversized).unwrap_err();

    // The first timer would have fired at 8s.
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(dashboard.snapshot().error.unwrap().contains("300 MB"));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(dashboard.snapshot().error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_error() {
    let service = Arc::new(ScriptedService::new());
    let dashboard = dashboard(&service);

    dashboard
        .select_file(VideoFile::in_memory("a.webm", "video/webm", vec![1]))
        .unwrap_err();
    dashboard.dismiss_error();
    assert!(dashboard.snapshot().error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_reset_deletes_job_and_is_idempotent() {
    let service = Arc::new(ScriptedService::new().with_statuses(vec![json!({
        "status": "completed",
        "result": { "percentageSaved": 35, "finalDuration": 125 }
    })]));
    let dashboard = dashboard(&service);

    dashboard.select_file(mp4(1024)).unwrap();
    dashboard.start().await.unwrap();
    settled(&dashboard).await;

    dashboard.reset().await;
    let first = dashboard.snapshot();
    assert_cleared(&first);
    assert_eq!(*service.deleted.lock().unwrap(), vec!["job-1".to_string()]);

    dashboard.reset().await;
    assert_cleared(&dashboard.snapshot());
    assert_eq!(service.deleted.lock().unwrap().len(), 1);
    assert!(dashboard.download_url().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_reset_swallows_delete_failure() {
    let service = Arc::new(
        ScriptedService::new()
            .failing_delete()
            .with_statuses(vec![json!({ "status": "completed" })]),
    );
    let dashboard = dashboard(&service);

    dashboard.select_file(mp4(1024)).unwrap();
    dashboard.start().await.unwrap();
    settled(&dashboard).await;

    dashboard.reset().await;
    assert_cleared(&dashboard.snapshot());
    assert_eq!(service.deleted.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reset_while_processing_stops_updates() {
    let service = Arc::new(ScriptedService::new().with_statuses(vec![json!({
        "status": "processing",
        "progress": 40
    })]));
    let dashboard = dashboard(&service);

    dashboard.select_file(mp4(1024)).unwrap();
    dashboard.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(dashboard.snapshot().progress, 40);

    dashboard.reset().await;
    let calls = service.status_calls();
    tokio::time::sleep(Duration::from_secs(20)).await;

    assert_eq!(service.status_calls(), calls);
    assert_cleared(&dashboard.snapshot());
}

#[tokio::test(start_paused = true)]
async fn test_poll_deadline_times_out() {
    let service = Arc::new(ScriptedService::new());
    let config = DashboardConfig {
        max_poll_duration: Some(Duration::from_secs(7)),
        ..Default::default()
    };
    let dashboard = Dashboard::new(config, service.clone(), service.clone()).unwrap();

    dashboard.select_file(mp4(1024)).unwrap();
    dashboard.start().await.unwrap();

    let state = settled(&dashboard).await;
    assert_eq!(state.phase, Phase::Upload);
    assert_eq!(state.error.as_deref(), Some("Processing timed out"));
    assert_eq!(service.status_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_select_outside_upload_is_rejected() {
    let service = Arc::new(ScriptedService::new());
    let dashboard = dashboard(&service);

    dashboard.select_file(mp4(1024)).unwrap();
    dashboard.start().await.unwrap();

    let err = dashboard.select_file(mp4(2048)).unwrap_err();
    assert!(matches!(err, DashboardError::InvalidPhase(Phase::Processing)));
    assert!(matches!(dashboard.remove_file(), Err(DashboardError::InvalidPhase(_))));
    assert_eq!(dashboard.snapshot().selected_file.unwrap().size, 1024);
}

#[tokio::test(start_paused = true)]
async fn test_remove_file() {
    let service = Arc::new(ScriptedService::new());
    let dashboard = dashboard(&service);

    dashboard.select_file(mp4(1024)).unwrap();
    dashboard.remove_file().unwrap();
    assert!(dashboard.snapshot().selected_file.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_drop_stops_polling() {
    let service = Arc::new(ScriptedService::new());
    let dashboard = dashboard(&service);

    dashboard.select_file(mp4(1024)).unwrap();
    dashboard.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(4500)).await;
    assert_eq!(service.status_calls(), 2);

    drop(dashboard);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(service.status_calls(), 2);
}
