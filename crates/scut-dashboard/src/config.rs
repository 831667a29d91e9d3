//! Dashboard configuration.

use std::time::Duration;

/// Dashboard controller configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Base URL of the gateway (upload, process, status)
    pub gateway_url: String,
    /// Public base URL of the backend (delete, download)
    pub public_api_url: String,
    /// Delay between two status requests
    pub poll_interval: Duration,
    /// How long the error overlay stays up
    pub error_display: Duration,
    /// Give up polling after this long without a terminal status
    pub max_poll_duration: Option<Duration>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            gateway_url: "http://localhost:3000".to_string(),
            public_api_url: "http://localhost:3333".to_string(),
            poll_interval: Duration::from_millis(2000),
            error_display: Duration::from_secs(8),
            max_poll_duration: None,
        }
    }
}

impl DashboardConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            gateway_url: std::env::var("GATEWAY_URL").unwrap_or(defaults.gateway_url),
            public_api_url: std::env::var("PUBLIC_API_URL").unwrap_or(defaults.public_api_url),
            poll_interval: std::env::var("POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|ms: &u64| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            error_display: std::env::var("ERROR_DISPLAY_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.error_display),
            max_poll_duration: std::env::var("MAX_POLL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}
