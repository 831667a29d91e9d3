//! Axum proxy gateway.
//!
//! This crate provides:
//! - Upload, process-start and status forwarders to the processing backend
//! - Uniform `{error, message}` envelope when the backend is unavailable
//! - Health/readiness probes and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::GatewayConfig;
pub use error::{Forward, GatewayError, GatewayResult};
pub use routes::create_router;
pub use state::AppState;
