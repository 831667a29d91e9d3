//! Application state.

use std::sync::Arc;

use scut_client::{ClientResult, VideoClient, VideoClientConfig, VideoService};

use crate::config::GatewayConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub backend: Arc<dyn VideoService>,
}

impl AppState {
    /// Create state talking to the backend at `config.api_url`.
    pub fn new(config: GatewayConfig) -> ClientResult<Self> {
        let client = VideoClient::new(VideoClientConfig {
            base_url: config.api_url.clone(),
            timeout: config.backend_timeout,
        })?;

        Ok(Self::with_backend(config, Arc::new(client)))
    }

    /// Create state around an already built backend.
    pub fn with_backend(config: GatewayConfig, backend: Arc<dyn VideoService>) -> Self {
        Self { config, backend }
    }
}
