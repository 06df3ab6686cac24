use crate::session::RawStatus;

use serde::Serialize;

/// Lifecycle of the control-socket connection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ConnectionState {
    /// No socket open and no attempt in flight.
    #[default]
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Identified with the server.
    Connected {
        /// OBS version reported by `GetVersion`.
        version: String,
    },
}

/// Notifications emitted by a [`crate::link::DeviceLink`].
///
/// Each one is tagged with the connection generation it belongs to when it
/// enters the engine's ingress queue.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// A connection attempt started.
    Connecting,
    /// Handshake completed; exactly one per successful handshake.
    Connected {
        /// OBS version reported by `GetVersion`.
        version: String,
    },
    /// The socket closed; exactly one per socket closure.
    Disconnected,
    /// The connection attempt failed before a socket was established.
    ConnectionError {
        /// Human-readable failure description.
        message: String,
    },
    /// `RecordStateChanged` push event.
    RecordStateChanged(RawStatus),
}
