use obs_tally_core::{ConnectionState, DisplaySnapshot, RecordingState};

/// Tray icon states, one colour each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayIconState {
    /// No connection to OBS.
    Offline,
    /// Connected, nothing recording.
    Idle,
    /// Recording output running.
    Recording,
    /// Recording output paused.
    Paused,
}

impl TrayIconState {
    /// Pick the icon for the latest display fields.
    pub fn from_snapshot(snapshot: &DisplaySnapshot) -> Self {
        if !matches!(snapshot.connection, ConnectionState::Connected { .. }) {
            return TrayIconState::Offline;
        }
        match snapshot.state {
            RecordingState::Recording => TrayIconState::Recording,
            RecordingState::Paused => TrayIconState::Paused,
            RecordingState::Idle | RecordingState::Stopped => TrayIconState::Idle,
        }
    }

    /// RGBA fill colour of the icon.
    pub fn color(self) -> [u8; 4] {
        match self {
            TrayIconState::Offline => [128, 128, 128, 255],
            TrayIconState::Idle => [46, 160, 67, 255],
            TrayIconState::Recording => [218, 54, 51, 255],
            TrayIconState::Paused => [227, 160, 8, 255],
        }
    }
}
