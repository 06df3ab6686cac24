mod display;
mod status;
pub mod timecode;
pub(crate) mod transition;
mod tracker;

pub use {
    display::DisplaySnapshot,
    status::{NormalizedStatus, RawStatus, RecordingState, normalize},
    tracker::RecordingSessionTracker,
    transition::{SessionState, Step, apply_snapshot, finalize, reset},
};
