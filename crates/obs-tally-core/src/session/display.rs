use crate::{
    link::ConnectionState,
    session::{RecordingState, timecode},
};

use serde::Serialize;

/// Read-only fields published to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DisplaySnapshot {
    /// Recording state of the latest snapshot.
    pub state: RecordingState,
    /// Connection state of the control socket.
    pub connection: ConnectionState,
    /// Duration of the current (or just stopped) recording.
    pub current_seconds: u64,
    /// Persisted total plus any unsaved and in-flight seconds.
    pub total_seconds: u64,
    /// Folded seconds whose storage write has not succeeded yet.
    pub unsaved_seconds: u64,
    /// `current_seconds` is extrapolated locally because polling failed.
    pub estimated: bool,
}

impl DisplaySnapshot {
    /// `current_seconds` as `HH:MM:SS`.
    pub fn formatted_current_time(&self) -> String {
        timecode::format(i64::try_from(self.current_seconds).unwrap_or(i64::MAX))
    }

    /// `total_seconds` as `HH:MM:SS`.
    pub fn formatted_total_time(&self) -> String {
        timecode::format(i64::try_from(self.total_seconds).unwrap_or(i64::MAX))
    }
}
