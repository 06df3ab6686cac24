//! Text and icon state shown in the tray for one display snapshot.

use crate::{DisplayMode, TrayIconState};

use obs_tally_core::{ConnectionState, DisplaySnapshot};

/// Everything the main thread needs to redraw the tray.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayView {
    /// Icon colour.
    pub icon: TrayIconState,
    /// Short figure shown next to the icon (macOS menu bar title).
    pub title: String,
    /// Multi-line hover text.
    pub tooltip: String,
    /// Connection line for the disabled status menu item.
    pub status: String,
    /// Mode the title is rendered in.
    pub mode: DisplayMode,
}

impl TrayView {
    /// Render `snapshot` in `mode`.
    pub fn render(snapshot: &DisplaySnapshot, mode: DisplayMode) -> Self {
        let current = snapshot.formatted_current_time();
        let total = snapshot.formatted_total_time();

        // `~` marks a locally extrapolated clock.
        let marker = if snapshot.estimated { "~" } else { "" };

        let title = match mode {
            DisplayMode::Session => format!("{}{}", marker, current),
            DisplayMode::Total => total.clone(),
        };

        let status = match &snapshot.connection {
            ConnectionState::Disconnected => "Disconnected".to_string(),
            ConnectionState::Connecting => "Connecting...".to_string(),
            ConnectionState::Connected { version } => format!("Connected to OBS {}", version),
        };

        let mut tooltip = format!(
            "OBS Tally - {}\nSession: {}{}\nTotal: {}\n{}",
            snapshot.state, marker, current, total, status
        );
        if snapshot.unsaved_seconds > 0 {
            tooltip.push_str(&format!("\nUnsaved: {}s", snapshot.unsaved_seconds));
        }

        Self {
            icon: TrayIconState::from_snapshot(snapshot),
            title,
            tooltip,
            status,
            mode,
        }
    }
}

/// Menu label for an adjust step, e.g. `1 min` or `45 s`.
pub fn step_label(seconds: u64) -> String {
    if seconds > 0 && seconds.is_multiple_of(60) {
        format!("{} min", seconds / 60)
    } else {
        format!("{} s", seconds)
    }
}
