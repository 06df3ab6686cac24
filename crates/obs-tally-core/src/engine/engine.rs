//! Single consumer of the ingress queue.
//!
//! Push events, poll results and UI commands are all applied here, one at a
//! time, so the tracker never sees two snapshots interleave. Timers (poll
//! cadence and reconnect backoff) are driven from the same `select!` loop.

use crate::{
    CoreResult,
    engine::{
        DEFAULT_POLL_INTERVAL, EngineCommand, EngineHandle, Ingress, PollAction, PollScheduler,
    },
    link::{ConnectionEvent, ConnectionSettings, ConnectionState, DeviceLink},
    session::{RawStatus, RecordingSessionTracker},
    store::TotalTimeStore,
};

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::mpsc,
    time::{self, Instant},
};
use tracing::{debug, error, info, instrument, warn};

/// Default fixed delay between reconnect attempts.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

/// Engine tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Where to connect.
    pub connection: ConnectionSettings,
    /// Poll cadence while a session may be active.
    pub poll_interval: Duration,
    /// Fixed delay before reconnecting after a disconnect or failed attempt.
    pub reconnect_interval: Duration,
    /// Connect as soon as the engine starts.
    pub auto_connect: bool,
    /// Reconnect after a disconnect that the user did not ask for.
    pub auto_reconnect: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            connection: ConnectionSettings::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            auto_connect: true,
            auto_reconnect: true,
        }
    }
}

enum Step {
    Ingress(Ingress),
    PollTick,
    Reconnect,
    Closed,
}

/// Reconciles push events and polls into one timeline and one total.
pub struct Engine<L: DeviceLink> {
    link: L,
    tracker: RecordingSessionTracker,
    scheduler: PollScheduler,
    settings: EngineSettings,
    ingress_tx: mpsc::Sender<Ingress>,
    ingress_rx: mpsc::Receiver<Ingress>,
    reconnect_at: Option<Instant>,
    user_disconnected: bool,
    poll_sequence: u64,
    applied_poll_sequence: u64,
}

impl<L: DeviceLink> Engine<L> {
    /// Build an engine around `link`, which must report into `ingress_tx`.
    pub fn new(
        link: L,
        store: Arc<dyn TotalTimeStore>,
        settings: EngineSettings,
        ingress_tx: mpsc::Sender<Ingress>,
        ingress_rx: mpsc::Receiver<Ingress>,
    ) -> Self {
        Self {
            link,
            tracker: RecordingSessionTracker::new(store),
            scheduler: PollScheduler::new(settings.poll_interval),
            settings,
            ingress_tx,
            ingress_rx,
            reconnect_at: None,
            user_disconnected: false,
            poll_sequence: 0,
            applied_poll_sequence: 0,
        }
    }

    /// A handle for sending commands and watching display fields.
    pub fn handle(&self) -> EngineHandle {
        EngineHandle::new(self.ingress_tx.clone(), self.tracker.subscribe())
    }

    /// Run until a [`EngineCommand::Shutdown`] is received.
    #[instrument(skip(self))]
    pub async fn run(mut self) -> CoreResult<()> {
        info!("Engine starting");

        if self.settings.auto_connect {
            self.spawn_connect();
        }

        loop {
            let step = tokio::select! {
                message = self.ingress_rx.recv() => match message {
                    Some(message) => Step::Ingress(message),
                    None => Step::Closed,
                },
                _ = self.scheduler.tick() => Step::PollTick,
                _ = sleep_until(self.reconnect_at) => Step::Reconnect,
            };

            match step {
                Step::Ingress(Ingress::Connection { generation, event }) => {
                    self.handle_connection_event(generation, event);
                }
                Step::Ingress(Ingress::Poll {
                    generation,
                    sequence,
                    result,
                }) => {
                    self.handle_poll(generation, sequence, result);
                }
                Step::Ingress(Ingress::Command(EngineCommand::Shutdown)) => {
                    info!("Shutdown requested");
                    self.close_connection().await;
                    break;
                }
                Step::Ingress(Ingress::Command(command)) => {
                    self.handle_command(command).await;
                }
                Step::PollTick => self.request_poll(),
                Step::Reconnect => {
                    self.reconnect_at = None;
                    info!("Reconnecting");
                    self.spawn_connect();
                }
                Step::Closed => {
                    info!("Ingress queue closed, shutting down");
                    self.close_connection().await;
                    break;
                }
            }
        }

        info!("Engine stopped");
        Ok(())
    }

    fn handle_connection_event(&mut self, generation: u64, event: ConnectionEvent) {
        if generation != self.link.generation() {
            debug!(
                generation,
                current = self.link.generation(),
                event = ?event,
                "Discarding stale connection event"
            );
            return;
        }

        match event {
            ConnectionEvent::Connecting => {
                self.tracker.set_connection(ConnectionState::Connecting);
            }
            ConnectionEvent::Connected { version } => {
                self.reconnect_at = None;
                self.tracker
                    .set_connection(ConnectionState::Connected { version });
                // Picks up a recording that started before we connected.
                self.request_poll();
            }
            ConnectionEvent::Disconnected => {
                info!("Connection lost");
                self.connection_down();
            }
            ConnectionEvent::ConnectionError { message } => {
                warn!(message = %message, "Connection error");
                self.connection_down();
            }
            ConnectionEvent::RecordStateChanged(raw) => {
                // Polls issued before this event describe an older state.
                self.applied_poll_sequence = self.poll_sequence;
                // A stop folds the last polled clock here. The final poll that
                // follows can only refresh the display: once stopped, OBS
                // reports a zeroed timecode, and the session is already closed.
                let action = self.scheduler.on_push(raw.output_active);
                self.apply(&raw);
                if action != PollAction::None {
                    self.request_poll();
                }
            }
        }
    }

    fn handle_poll(&mut self, generation: u64, sequence: u64, result: CoreResult<RawStatus>) {
        if generation != self.link.generation() {
            debug!(generation, sequence, "Discarding poll from a previous connection");
            return;
        }
        if sequence <= self.applied_poll_sequence {
            debug!(sequence, applied = self.applied_poll_sequence, "Discarding out-of-order poll");
            return;
        }
        self.applied_poll_sequence = sequence;

        match result {
            Ok(raw) => {
                self.scheduler.on_poll_result(raw.output_active);
                self.apply(&raw);
            }
            Err(e) => {
                debug!(error = %e, "Status poll failed");
                self.tracker.note_poll_failure(std::time::Instant::now());
            }
        }
    }

    async fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::ResetTotal => {
                if let Err(e) = self.tracker.reset_total() {
                    error!(error = %e, "Failed to reset total");
                }
            }
            EngineCommand::AdjustTotalBy(seconds) => {
                if let Err(e) = self.tracker.adjust_total_by(seconds) {
                    error!(error = %e, seconds, "Failed to adjust total");
                }
            }
            EngineCommand::Connect => {
                self.user_disconnected = false;
                self.reconnect_at = None;
                self.spawn_connect();
            }
            EngineCommand::Disconnect => {
                self.user_disconnected = true;
                self.close_connection().await;
            }
            EngineCommand::Reconfigure(connection) => {
                info!(settings = ?connection, "Connection settings changed");
                self.close_connection().await;
                self.settings.connection = connection;
                self.user_disconnected = false;
                self.spawn_connect();
            }
            EngineCommand::Shutdown => {}
        }
    }

    fn apply(&mut self, raw: &RawStatus) {
        if let Err(e) = self.tracker.apply_snapshot(raw) {
            // Seconds stay pending in the tracker and are retried next snapshot.
            warn!(error = %e, "Snapshot applied but total not saved");
        }
    }

    /// Fold the active session before any connection state is dropped.
    fn connection_down(&mut self) {
        self.scheduler.stop();
        if let Err(e) = self.tracker.connection_lost() {
            warn!(error = %e, "Interrupted session folded but total not saved");
        }
        self.tracker.set_connection(ConnectionState::Disconnected);
        self.schedule_reconnect();
    }

    async fn close_connection(&mut self) {
        self.reconnect_at = None;
        self.scheduler.stop();
        if let Err(e) = self.tracker.connection_lost() {
            warn!(error = %e, "Interrupted session folded but total not saved");
        }
        self.link.disconnect().await;
        self.tracker.set_connection(ConnectionState::Disconnected);
    }

    fn schedule_reconnect(&mut self) {
        if self.user_disconnected || !self.settings.auto_reconnect || self.reconnect_at.is_some() {
            return;
        }
        debug!(
            delay_ms = self.settings.reconnect_interval.as_millis(),
            "Reconnect scheduled"
        );
        self.reconnect_at = Some(Instant::now() + self.settings.reconnect_interval);
    }

    fn spawn_connect(&self) {
        let link = self.link.clone();
        let settings = self.settings.connection.clone();
        tokio::spawn(async move {
            // Failures are reported as ConnectionError events as well.
            if let Err(e) = link.connect(&settings).await {
                debug!(error = %e, "Connect attempt returned an error");
            }
        });
    }

    fn request_poll(&mut self) {
        self.poll_sequence += 1;
        let sequence = self.poll_sequence;
        let generation = self.link.generation();
        let link = self.link.clone();
        let ingress_tx = self.ingress_tx.clone();

        tokio::spawn(async move {
            let result = link.get_record_status().await;
            let _ = ingress_tx
                .send(Ingress::Poll {
                    generation,
                    sequence,
                    result,
                })
                .await;
        });
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
