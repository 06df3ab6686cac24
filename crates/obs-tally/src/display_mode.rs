use std::fmt;

use serde::{Deserialize, Serialize};

/// Which figure the tray title shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Duration of the current (or just stopped) recording.
    Session,
    /// Running total across all recordings.
    #[default]
    Total,
}

impl DisplayMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Session => DisplayMode::Total,
            DisplayMode::Total => DisplayMode::Session,
        }
    }

    /// Label of the menu item that switches away from this mode.
    pub fn toggle_label(self) -> &'static str {
        match self {
            DisplayMode::Session => "Show Total Time",
            DisplayMode::Total => "Show Session Time",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayMode::Session => f.write_str("session"),
            DisplayMode::Total => f.write_str("total"),
        }
    }
}
