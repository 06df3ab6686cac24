//! Pure session transitions.
//!
//! A session runs from the rising edge of `output_active` to its falling
//! edge. Every transition returns the next [`SessionState`] together with
//! the number of seconds that must be folded into the persisted total, so
//! the at-most-once fold can be checked without sockets or storage.
//!
//! ```text
//! NoSession ──active──> SessionActive ──inactive / connection lost──> NoSession
//!                          │    ▲                 (fold current seconds)
//!                          └────┘ snapshot: replace current seconds
//! ```
//!
//! Seconds folded because the connection dropped are remembered as a
//! carry-over. If the first snapshot after reconnecting shows the same
//! recording still running, those seconds become its baseline so they are
//! not folded a second time.

use crate::session::status::{NormalizedStatus, RawStatus, normalize};

/// Session bookkeeping, owned by exactly one tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    /// Last known `output_active`; the falling-edge detector.
    pub previous_output_active: bool,
    /// Seconds of the in-flight session not yet folded.
    pub current_session_seconds: u64,
    /// Device clock reading that counts as zero for this session.
    ///
    /// Non-zero only after a reset during an active session.
    pub baseline_seconds: u64,
    /// Most recent device clock reading for this session.
    pub last_device_seconds: u64,
    /// Seconds already folded for a session cut off by a connection loss.
    ///
    /// Consumed by the next snapshot, whatever it reports.
    pub carry_over_seconds: u64,
}

impl SessionState {
    /// Whether a session is currently in flight.
    pub fn is_active(&self) -> bool {
        self.previous_output_active
    }
}

/// Result of feeding one snapshot to [`apply_snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// State after the snapshot.
    pub state: SessionState,
    /// Normalized view of the snapshot, for display.
    pub normalized: NormalizedStatus,
    /// Seconds to add to the persisted total; zero unless a session ended.
    pub fold_seconds: u64,
}

/// Feed one snapshot through the session state machine.
///
/// The device timecode replaces, never accumulates, the current session
/// seconds. A snapshot without a timecode (push event) or an inactive
/// snapshot reporting a zeroed clock leaves the last known value in place,
/// so a stop event folds what the polls last observed.
pub fn apply_snapshot(state: SessionState, raw: &RawStatus) -> Step {
    let normalized = normalize(raw);
    let mut next = state;

    let rising = !state.previous_output_active && raw.output_active;
    let falling = state.previous_output_active && !raw.output_active;

    if rising {
        // Same recording still running after a reconnect.
        let resumed = raw.has_timecode() && normalized.elapsed_seconds >= state.carry_over_seconds;
        next = SessionState {
            previous_output_active: true,
            baseline_seconds: if resumed { state.carry_over_seconds } else { 0 },
            ..SessionState::default()
        };
    }
    next.carry_over_seconds = 0;

    let in_session = raw.output_active || falling;
    let carries_time = raw.has_timecode() && (raw.output_active || normalized.has_recorded_time());

    if in_session && carries_time {
        next.last_device_seconds = normalized.elapsed_seconds;
        next.current_session_seconds = normalized
            .elapsed_seconds
            .saturating_sub(next.baseline_seconds);
    }

    let mut fold_seconds = 0;
    if falling {
        fold_seconds = next.current_session_seconds;
        next = SessionState::default();
    }

    next.previous_output_active = raw.output_active;

    Step {
        state: next,
        normalized,
        fold_seconds,
    }
}

/// Close the session as if a falling edge had been observed.
///
/// Used when the connection drops: the device can no longer be asked for a
/// final value, so the last known seconds are folded. Returns the new state
/// and the seconds to fold (zero if no session was active).
///
/// The device clock reached at the cut becomes the carry-over that
/// [`apply_snapshot`] checks on the next rising edge.
pub fn finalize(state: SessionState) -> (SessionState, u64) {
    if !state.previous_output_active {
        return (state, 0);
    }
    let next = SessionState {
        carry_over_seconds: state.last_device_seconds,
        ..SessionState::default()
    };
    (next, state.current_session_seconds)
}

/// Discard the unfolded seconds of the in-flight session.
///
/// Later snapshots of the same session count from the current device clock,
/// so seconds recorded before the reset are never folded.
pub fn reset(state: SessionState) -> SessionState {
    if !state.previous_output_active {
        // A pending carry-over still marks seconds that must not count again.
        return SessionState {
            carry_over_seconds: state.carry_over_seconds,
            ..SessionState::default()
        };
    }
    SessionState {
        previous_output_active: true,
        current_session_seconds: 0,
        baseline_seconds: state.last_device_seconds,
        last_device_seconds: state.last_device_seconds,
        carry_over_seconds: 0,
    }
}
