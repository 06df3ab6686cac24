//! Recording session tracker.
//!
//! Owns the [`SessionState`], applies every snapshot through the pure
//! transitions in [`crate::session::transition`] and performs the folds
//! they ask for against a [`TotalTimeStore`].
//!
//! # Thread Safety
//!
//! All mutation goes through `&mut self`. The engine owns the tracker from a
//! single task, so a poll result and a push event for the same falling edge
//! are applied one after the other and the second sees the reset state.

use crate::{
    CoreResult,
    link::ConnectionState,
    session::{
        DisplaySnapshot, NormalizedStatus, RawStatus, RecordingState, SessionState, transition,
    },
    store::TotalTimeStore,
};

use std::{sync::Arc, time::Instant};

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Folds recording sessions into the persisted total exactly once.
pub struct RecordingSessionTracker {
    state: SessionState,
    store: Arc<dyn TotalTimeStore>,
    stored_total: u64,
    pending_fold_seconds: u64,
    last_status: NormalizedStatus,
    last_snapshot_at: Option<Instant>,
    estimated_seconds: Option<u64>,
    connection: ConnectionState,
    display_tx: watch::Sender<DisplaySnapshot>,
}

impl RecordingSessionTracker {
    /// Create a tracker on top of `store`, reading the persisted total once.
    pub fn new(store: Arc<dyn TotalTimeStore>) -> Self {
        let stored_total = store.load();
        let (display_tx, _) = watch::channel(DisplaySnapshot {
            total_seconds: stored_total,
            ..DisplaySnapshot::default()
        });

        info!(total_seconds = stored_total, "Session tracker initialized");

        Self {
            state: SessionState::default(),
            store,
            stored_total,
            pending_fold_seconds: 0,
            last_status: NormalizedStatus::default(),
            last_snapshot_at: None,
            estimated_seconds: None,
            connection: ConnectionState::Disconnected,
            display_tx,
        }
    }

    /// Subscribe to display updates.
    pub fn subscribe(&self) -> watch::Receiver<DisplaySnapshot> {
        self.display_tx.subscribe()
    }

    /// The latest published display fields.
    pub fn display(&self) -> DisplaySnapshot {
        self.display_tx.borrow().clone()
    }

    /// Current session bookkeeping.
    pub fn session(&self) -> SessionState {
        self.state
    }

    /// Seconds of the in-flight session not yet folded.
    pub fn current_session_seconds(&self) -> u64 {
        self.state.current_session_seconds
    }

    /// Apply one snapshot, from a push event or a poll.
    ///
    /// Returns the seconds written to the store by this call (including any
    /// previously failed fold that was retried). When the write fails the
    /// seconds stay pending, the error is returned and the next call retries.
    #[instrument(skip(self, raw), fields(active = raw.output_active, paused = raw.output_paused))]
    pub fn apply_snapshot(&mut self, raw: &RawStatus) -> CoreResult<u64> {
        let rising = !self.state.previous_output_active && raw.output_active;
        let step = transition::apply_snapshot(self.state, raw);

        self.state = step.state;
        self.estimated_seconds = None;

        self.last_status = if raw.has_timecode() {
            self.last_snapshot_at = Some(Instant::now());
            step.normalized
        } else {
            // Push events carry no clock; keep showing the last one seen.
            let elapsed = if rising {
                0
            } else {
                self.last_status.elapsed_seconds
            };
            NormalizedStatus::derive(raw.output_active, raw.output_paused, elapsed)
        };

        if rising {
            info!("Recording session started");
        }
        if step.fold_seconds > 0 {
            info!(session_seconds = step.fold_seconds, "Recording session ended");
        }

        let result = self.commit(step.fold_seconds);
        self.publish();
        result
    }

    /// Close an active session because the connection was lost.
    ///
    /// Equivalent to a synthetic falling edge carrying the last known time.
    #[instrument(skip(self))]
    pub fn connection_lost(&mut self) -> CoreResult<u64> {
        let (state, fold_seconds) = transition::finalize(self.state);
        self.state = state;
        self.estimated_seconds = None;

        if fold_seconds > 0 {
            info!(
                session_seconds = fold_seconds,
                "Folding session interrupted by connection loss"
            );
        }

        self.last_status = NormalizedStatus::derive(false, false, self.last_status.elapsed_seconds);

        let result = self.commit(fold_seconds);
        self.publish();
        result
    }

    /// Record the connection state for display.
    pub fn set_connection(&mut self, connection: ConnectionState) {
        if self.connection != connection {
            debug!(connection = ?connection, "Connection state changed");
            self.connection = connection;
            self.publish();
        }
    }

    /// Zero the persisted total and drop unfolded seconds of the active session.
    ///
    /// On a failed write nothing changes in memory, so unsaved and in-flight
    /// seconds are still counted.
    #[instrument(skip(self))]
    pub fn reset_total(&mut self) -> CoreResult<()> {
        self.store.reset()?;

        self.state = transition::reset(self.state);
        self.pending_fold_seconds = 0;
        self.stored_total = 0;

        self.publish();
        Ok(())
    }

    /// Manually correct the persisted total by `delta` seconds (clamped at zero).
    #[instrument(skip(self))]
    pub fn adjust_total_by(&mut self, delta: i64) -> CoreResult<u64> {
        // Unsaved seconds land first so the clamp sees the full total.
        if self.commit(0).is_err() {
            debug!("Pending seconds still unsaved before adjustment");
        }

        let result = self.store.adjust_by(delta);
        if let Ok(total) = result {
            self.stored_total = total;
        }

        self.publish();
        result
    }

    /// Extrapolate the displayed clock after a failed poll.
    ///
    /// Display only: the estimate is never folded and is dropped as soon as
    /// a real snapshot arrives.
    pub fn note_poll_failure(&mut self, now: Instant) {
        if self.last_status.state != RecordingState::Recording {
            return;
        }
        let Some(at) = self.last_snapshot_at else {
            return;
        };

        let estimate = self.last_status.elapsed_seconds + now.saturating_duration_since(at).as_secs();
        if self.estimated_seconds != Some(estimate) {
            self.estimated_seconds = Some(estimate);
            self.publish();
        }
    }

    fn commit(&mut self, fold_seconds: u64) -> CoreResult<u64> {
        let amount = self.pending_fold_seconds.saturating_add(fold_seconds);
        if amount == 0 {
            return Ok(0);
        }

        match self.store.add(amount) {
            Ok(total) => {
                self.stored_total = total;
                self.pending_fold_seconds = 0;
                Ok(amount)
            }
            Err(e) => {
                warn!(error = %e, unsaved_seconds = amount, "Failed to save total, will retry");
                self.pending_fold_seconds = amount;
                Err(e)
            }
        }
    }

    fn publish(&self) {
        let in_flight = if self.state.is_active() {
            self.state.current_session_seconds
        } else {
            0
        };

        let snapshot = DisplaySnapshot {
            state: self.last_status.state,
            connection: self.connection.clone(),
            current_seconds: self
                .estimated_seconds
                .unwrap_or(self.last_status.elapsed_seconds),
            total_seconds: self
                .stored_total
                .saturating_add(self.pending_fold_seconds)
                .saturating_add(in_flight),
            unsaved_seconds: self.pending_fold_seconds,
            estimated: self.estimated_seconds.is_some(),
        };

        self.display_tx.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}
