//! Upload/process/poll controller for the SilenceCut dashboard.
//!
//! The [`Dashboard`] drives one video through `upload -> processing ->
//! download`: it validates the selected file, uploads it through the
//! gateway, starts processing, polls the job status on a cancellable task and
//! publishes every state change on a `watch` channel for views to render.

pub mod config;
pub mod controller;
pub mod error;
pub mod files;
pub mod poller;
pub mod state;
pub mod task;
pub mod view;

pub use config::DashboardConfig;
pub use controller::Dashboard;
pub use error::{DashboardError, DashboardResult};
pub use state::{DashboardState, Phase};
pub use task::ScopedTask;
