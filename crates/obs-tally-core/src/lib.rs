//! obs-tally core library
//!
//! Tracks recording time reported by OBS Studio over obs-websocket and folds
//! every finished recording into a persisted running total, exactly once.
//!
//! Push events and status polls are funnelled through a single ingress
//! queue into one [`Engine`] task. The engine applies each snapshot to a
//! [`RecordingSessionTracker`], which detects the falling edge of
//! `outputActive` and adds the session's seconds to a [`TotalTimeStore`].
//!
//! # Example
//!
//! ```no_run
//! use obs_tally_core::{
//!     ConnectionSupervisor, CoreResult, Engine, EngineSettings, FileTotalStore, ingress_channel,
//! };
//!
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let (ingress_tx, ingress_rx) = ingress_channel();
//!     let supervisor = ConnectionSupervisor::new(ingress_tx.clone());
//!     let store = Arc::new(FileTotalStore::new("total.toml"));
//!
//!     let engine = Engine::new(supervisor, store, EngineSettings::default(), ingress_tx, ingress_rx);
//!     let mut display = engine.handle().subscribe();
//!
//!     tokio::spawn(async move {
//!         while display.changed().await.is_ok() {
//!             let snapshot = display.borrow().clone();
//!             println!("{} / {}", snapshot.formatted_current_time(), snapshot.formatted_total_time());
//!         }
//!     });
//!
//!     engine.run().await
//! }
//! ```

mod engine;
mod error;
mod link;
pub mod protocol;
mod session;
mod store;

pub use {
    engine::{
        DEFAULT_POLL_INTERVAL, DEFAULT_RECONNECT_INTERVAL, Engine, EngineCommand, EngineHandle,
        EngineSettings, INGRESS_CAPACITY, Ingress, PollAction, PollScheduler, ingress_channel,
    },
    error::{CoreError, Result as CoreResult},
    link::{
        ConnectionEvent, ConnectionSettings, ConnectionState, ConnectionSupervisor, DEFAULT_HOST,
        DEFAULT_PORT, DeviceLink,
    },
    session::{
        DisplaySnapshot, NormalizedStatus, RawStatus, RecordingSessionTracker, RecordingState,
        SessionState, Step, apply_snapshot, finalize, normalize, reset, timecode,
    },
    store::{FileTotalStore, TotalTimeStore},
};
