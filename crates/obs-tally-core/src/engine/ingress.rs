use crate::{
    CoreResult,
    link::{ConnectionEvent, ConnectionSettings},
    session::RawStatus,
};

use tokio::sync::mpsc;

/// Capacity of the engine's ingress queue.
pub const INGRESS_CAPACITY: usize = 64;

/// Commands issued by the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    /// Zero the persisted total.
    ResetTotal,
    /// Correct the persisted total by the given seconds.
    AdjustTotalBy(i64),
    /// Connect (or reconnect) using the current settings.
    Connect,
    /// Close the connection and stop reconnecting.
    Disconnect,
    /// Replace the connection settings and reconnect.
    Reconfigure(ConnectionSettings),
    /// Fold any active session, disconnect and stop the engine.
    Shutdown,
}

/// Everything the engine reacts to, funnelled through one queue.
#[derive(Debug)]
pub enum Ingress {
    /// Lifecycle or push event from the device link.
    Connection {
        /// Link generation the event belongs to.
        generation: u64,
        /// The event itself.
        event: ConnectionEvent,
    },
    /// Result of a `GetRecordStatus` poll.
    Poll {
        /// Link generation the poll was issued under.
        generation: u64,
        /// Monotonic poll number; older results than the last applied are dropped.
        sequence: u64,
        /// Snapshot or failure.
        result: CoreResult<RawStatus>,
    },
    /// Command from the UI layer.
    Command(EngineCommand),
}

/// Create the ingress queue shared by the engine and its device link.
pub fn ingress_channel() -> (mpsc::Sender<Ingress>, mpsc::Receiver<Ingress>) {
    mpsc::channel(INGRESS_CAPACITY)
}
