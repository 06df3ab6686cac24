use crate::session::timecode;

use std::fmt;

use serde::{Deserialize, Serialize};

/// One observation of the device's recording output, from a push event or a poll.
///
/// Push events carry no timecode, so `output_timecode` is `None` for them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStatus {
    /// Whether the recording output is running (including while paused).
    pub output_active: bool,
    /// Whether the recording output is paused.
    #[serde(default)]
    pub output_paused: bool,
    /// Device clock for the current recording, `HH:MM:SS.mmm`.
    #[serde(default)]
    pub output_timecode: Option<String>,
}

impl RawStatus {
    /// A polled snapshot carrying the device timecode.
    pub fn polled(output_active: bool, output_paused: bool, timecode: impl Into<String>) -> Self {
        Self {
            output_active,
            output_paused,
            output_timecode: Some(timecode.into()),
        }
    }

    /// A pushed snapshot, which carries no timecode.
    pub fn pushed(output_active: bool, output_paused: bool) -> Self {
        Self {
            output_active,
            output_paused,
            output_timecode: None,
        }
    }

    /// Whether this snapshot carries a timecode at all.
    pub fn has_timecode(&self) -> bool {
        self.output_timecode.is_some()
    }
}

/// Normalized recording state derived from a single snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    /// Nothing recorded and nothing running.
    #[default]
    Idle,
    /// Output is running.
    Recording,
    /// Output is running but paused.
    Paused,
    /// Output just ended; the timecode is still meaningful for display.
    Stopped,
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecordingState::Idle => "Idle",
            RecordingState::Recording => "Recording",
            RecordingState::Paused => "Paused",
            RecordingState::Stopped => "Stopped",
        };
        f.write_str(label)
    }
}

/// State and elapsed time computed fresh from one [`RawStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NormalizedStatus {
    /// Derived recording state.
    pub state: RecordingState,
    /// Device timecode in whole seconds.
    pub elapsed_seconds: u64,
}

impl NormalizedStatus {
    /// Derive the state from the output flags and the device clock.
    ///
    /// Rules are checked in order and the first match wins.
    pub fn derive(output_active: bool, output_paused: bool, elapsed_seconds: u64) -> Self {
        let state = match (output_active, output_paused) {
            (true, true) => RecordingState::Paused,
            (true, false) => RecordingState::Recording,
            (false, _) if elapsed_seconds > 0 => RecordingState::Stopped,
            (false, _) => RecordingState::Idle,
        };

        Self {
            state,
            elapsed_seconds,
        }
    }

    /// Whether the device reports any recorded time.
    pub fn has_recorded_time(&self) -> bool {
        self.elapsed_seconds > 0
    }
}

/// Map a raw snapshot onto a [`NormalizedStatus`]. Pure; never fails.
pub fn normalize(raw: &RawStatus) -> NormalizedStatus {
    NormalizedStatus::derive(
        raw.output_active,
        raw.output_paused,
        timecode::parse(raw.output_timecode.as_deref()),
    )
}
