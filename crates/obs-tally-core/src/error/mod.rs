use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

/// Errors raised by the tally engine with source location tracking.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The control socket could not be opened or the handshake failed.
    #[error("Connection failed: {reason} {location}")]
    ConnectionFailed {
        /// Description of the transport or handshake failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The server asked for authentication but no password is configured.
    #[error("Server requires a password but none is configured {location}")]
    AuthenticationRequired {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A connection attempt was cancelled by `disconnect()`.
    #[error("Connection attempt cancelled {location}")]
    ConnectionCancelled {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A request was issued while no connection is established.
    #[error("Not connected {location}")]
    NotConnected {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The server sent a message that does not follow the protocol.
    #[error("Protocol error: {reason} {location}")]
    Protocol {
        /// Description of the unexpected message.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The server answered a request with a failure status.
    #[error("Request {request_type} failed with code {code}: {comment:?} {location}")]
    RequestFailed {
        /// Request type that failed, e.g. `GetRecordStatus`.
        request_type: String,
        /// Status code reported by the server.
        code: u16,
        /// Optional human-readable comment from the server.
        comment: Option<String>,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A timecode string could not be parsed.
    #[error("Malformed timecode: {input:?} {location}")]
    MalformedTimecode {
        /// The rejected input.
        input: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A persisted value could not be read or decoded.
    #[error("Storage read failed: {reason} {location}")]
    StorageRead {
        /// Description of the read failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A persisted value could not be written.
    #[error("Storage write failed: {reason} {location}")]
    StorageWrite {
        /// Description of the write failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// An internal channel was closed before a message could be delivered.
    #[error("Channel closed: {message} {location}")]
    ChannelClosed {
        /// What was being sent or received.
        message: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// IO error from filesystem operations.
    #[error("IO error: {source} {location}")]
    Io {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl CoreError {
    /// Build a [`CoreError::NotConnected`] at the caller's location.
    #[track_caller]
    pub fn not_connected() -> Self {
        CoreError::NotConnected {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Build a [`CoreError::Protocol`] at the caller's location.
    #[track_caller]
    pub fn protocol(reason: impl Into<String>) -> Self {
        CoreError::Protocol {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Build a [`CoreError::ConnectionFailed`] at the caller's location.
    #[track_caller]
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        CoreError::ConnectionFailed {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<std::io::Error> for CoreError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        CoreError::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for CoreError {
    #[track_caller]
    fn from(source: tokio_tungstenite::tungstenite::Error) -> Self {
        CoreError::ConnectionFailed {
            reason: source.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
