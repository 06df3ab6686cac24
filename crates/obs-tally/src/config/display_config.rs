use crate::{
    DisplayMode,
    config::{default_adjust_step_seconds, default_mode},
};

use serde::{Deserialize, Serialize};

/// Tray display configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Figure shown in the tray title.
    #[serde(default = "default_mode")]
    pub mode: DisplayMode,
    /// Seconds added or removed per adjust hotkey or menu click.
    #[serde(default = "default_adjust_step_seconds")]
    pub adjust_step_seconds: u64,
}

impl DisplayConfig {
    /// Signed step; saturates for absurdly large values.
    pub fn adjust_step(&self) -> i64 {
        i64::try_from(self.adjust_step_seconds).unwrap_or(i64::MAX)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            adjust_step_seconds: default_adjust_step_seconds(),
        }
    }
}
