//! Headless SilenceCut dashboard: process one video from the command line.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use scut_client::{VideoClient, VideoClientConfig};
use scut_dashboard::files::video_file_from_path;
use scut_dashboard::{view, Dashboard, DashboardConfig, DashboardState, Phase};

#[derive(Parser, Debug)]
#[command(name = "scut", version, about = "Remove silences from an MP4 video")]
struct Args {
    /// MP4 file to process
    input: PathBuf,

    /// Save the processed video here
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep the job on the backend instead of deleting it at the end
    #[arg(long)]
    keep: bool,

    /// Gateway base URL
    #[arg(long, env = "GATEWAY_URL")]
    gateway_url: Option<String>,

    /// Backend base URL used for download and delete
    #[arg(long, env = "PUBLIC_API_URL")]
    api_url: Option<String>,

    /// Status poll interval in milliseconds
    #[arg(long, env = "POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();

    let mut config = DashboardConfig::from_env();
    if let Some(url) = args.gateway_url {
        config.gateway_url = url;
    }
    if let Some(url) = args.api_url {
        config.public_api_url = url;
    }
    if let Some(ms) = args.poll_interval_ms.filter(|ms| *ms > 0) {
        config.poll_interval = Duration::from_millis(ms);
    }

    let gateway = VideoClient::new(VideoClientConfig::from_env().with_base_url(&config.gateway_url))
        .context("Invalid gateway URL")?;
    let backend = Arc::new(
        VideoClient::new(VideoClientConfig::from_env().with_base_url(&config.public_api_url))
            .context("Invalid backend URL")?,
    );
    let dashboard = Dashboard::new(config, Arc::new(gateway), backend.clone())?;

    let file = video_file_from_path(&args.input)
        .await
        .with_context(|| format!("Cannot read {}", args.input.display()))?;
    dashboard.select_file(file)?;

    let renderer = tokio::spawn(render_changes(dashboard.subscribe()));

    let video_id = dashboard.start().await?;
    info!(video_id = %video_id, "Processing started");

    let outcome = dashboard.wait_until_settled().await;
    renderer.abort();

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            if !args.keep {
                dashboard.reset().await;
            }
            return Err(e.into());
        }
    };

    println!("Time saved:     {}", result.saved_display());
    println!("Final duration: {}", result.duration_display());
    if let Some(url) = dashboard.download_url() {
        println!("Download:       {}", url);
    }

    if let Some(output) = &args.output {
        let written = backend
            .download_to(&video_id, output)
            .await
            .with_context(|| format!("Failed to download to {}", output.display()))?;
        println!("Saved {} bytes to {}", written, output.display());
    }

    if !args.keep {
        dashboard.reset().await;
    }

    Ok(())
}

/// Print the dashboard each time the phase, progress or message changes.
async fn render_changes(mut rx: tokio::sync::watch::Receiver<DashboardState>) {
    let mut last: Option<(Phase, u8, String, Option<String>)> = None;
    loop {
        {
            let state = rx.borrow_and_update();
            let key = (
                state.phase,
                state.progress,
                state.status_message.clone(),
                state.error.clone(),
            );
            if last.as_ref() != Some(&key) {
                print!("{}", view::render(&state));
                last = Some(key);
            }
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

/// Logs go to stderr so stdout carries only the dashboard.
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .with(env_filter)
            .init();
    }
}
