//! Plain-text rendering of the dashboard state.

use std::fmt::Write;

use scut_models::{format_file_size, ProcessingStep};

use crate::state::{DashboardState, Phase};

const BAR_WIDTH: usize = 30;

/// `[#########---------------------]  30%`
pub fn progress_bar(progress: u8) -> String {
    let progress = progress.min(100) as usize;
    let filled = progress * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        progress
    )
}

/// Render the whole dashboard as a block of lines.
pub fn render(state: &DashboardState) -> String {
    let mut out = String::new();

    match state.phase {
        Phase::Upload => {
            let _ = writeln!(out, "== Upload ==");
            match &state.selected_file {
                Some(file) => {
                    let _ = writeln!(out, "{} ({})", file.name, format_file_size(file.size));
                }
                None => {
                    let _ = writeln!(out, "No file selected (MP4, max 250 MB)");
                }
            }
        }
        Phase::Processing => {
            let _ = writeln!(out, "== Processing ==");
            let _ = writeln!(out, "{}", progress_bar(state.progress));
            let _ = writeln!(out, "{}", state.status_message);
            for step in ProcessingStep::ALL {
                let mark = if state.is_step_completed(step) { 'x' } else { ' ' };
                let _ = writeln!(out, "  [{}] {}", mark, step.label());
            }
        }
        Phase::Download => {
            let _ = writeln!(out, "== Download ==");
            if let Some(result) = &state.result {
                let _ = writeln!(out, "Time saved:     {}", result.saved_display());
                let _ = writeln!(out, "Final duration: {}", result.duration_display());
            }
        }
    }

    if let Some(error) = &state.error {
        let _ = writeln!(out, "Error: {}", error);
    }

    out
}
