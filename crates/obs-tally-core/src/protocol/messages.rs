//! obs-websocket v5 wire messages.
//!
//! Every frame is a JSON text message `{"op": <opcode>, "d": <payload>}`.

use crate::{
    CoreError, CoreResult,
    protocol::authentication_string,
    session::RawStatus,
};

use std::panic::Location;

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Highest RPC version this client speaks.
pub const RPC_VERSION: u32 = 1;

/// `EventSubscription::Outputs`, which includes `RecordStateChanged`.
pub const OUTPUTS_SUBSCRIPTION: u32 = 1 << 6;

/// Request type returning the server's version information.
pub const GET_VERSION: &str = "GetVersion";

/// Request type returning the record output status.
pub const GET_RECORD_STATUS: &str = "GetRecordStatus";

/// Event pushed whenever the record output changes state.
pub const RECORD_STATE_CHANGED: &str = "RecordStateChanged";

const PAUSED_OUTPUT_STATE: &str = "OBS_WEBSOCKET_OUTPUT_PAUSED";

mod opcode {
    pub const HELLO: u8 = 0;
    pub const IDENTIFY: u8 = 1;
    pub const IDENTIFIED: u8 = 2;
    pub const EVENT: u8 = 5;
    pub const REQUEST: u8 = 6;
    pub const REQUEST_RESPONSE: u8 = 7;
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    op: u8,
    d: Value,
}

/// Authentication challenge sent in `Hello`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthChallenge {
    /// Per-connection challenge.
    pub challenge: String,
    /// Per-password salt.
    pub salt: String,
}

/// First message from the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    /// Version of the obs-websocket plugin.
    pub obs_web_socket_version: String,
    /// RPC version offered by the server.
    pub rpc_version: u32,
    /// Present when the server requires a password.
    #[serde(default)]
    pub authentication: Option<AuthChallenge>,
}

/// Server confirmation that the session is identified.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identified {
    /// RPC version both sides agreed on.
    pub negotiated_rpc_version: u32,
}

/// Event pushed by the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMessage {
    /// Event name, e.g. `RecordStateChanged`.
    pub event_type: String,
    /// Event-specific payload.
    #[serde(default)]
    pub event_data: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordStateChanged {
    output_active: bool,
    #[serde(default)]
    output_state: String,
}

impl EventMessage {
    /// Convert a `RecordStateChanged` event into a timecode-less snapshot.
    ///
    /// Returns `None` for any other event type.
    pub fn record_state(&self) -> Option<CoreResult<RawStatus>> {
        if self.event_type != RECORD_STATE_CHANGED {
            return None;
        }

        let parsed = serde_json::from_value::<RecordStateChanged>(self.event_data.clone())
            .map(|data| {
                RawStatus::pushed(data.output_active, data.output_state == PAUSED_OUTPUT_STATE)
            })
            .map_err(|e| CoreError::protocol(format!("Bad RecordStateChanged payload: {}", e)));

        Some(parsed)
    }
}

/// Outcome of a request as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RequestStatus {
    /// Whether the request succeeded.
    pub result: bool,
    /// Status code; 100 is success.
    pub code: u16,
    /// Optional explanation on failure.
    #[serde(default)]
    pub comment: Option<String>,
}

/// Response to a request previously sent by this client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
    /// Request type echoed back.
    pub request_type: String,
    /// Request id echoed back.
    pub request_id: String,
    /// Success or failure of the request.
    pub request_status: RequestStatus,
    /// Response payload, absent for some requests.
    #[serde(default)]
    pub response_data: Option<Value>,
}

impl RequestResponse {
    /// Turn the response into its payload or a [`CoreError::RequestFailed`].
    #[track_caller]
    pub fn into_result(self) -> CoreResult<Value> {
        if !self.request_status.result {
            return Err(CoreError::RequestFailed {
                request_type: self.request_type,
                code: self.request_status.code,
                comment: self.request_status.comment,
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(self.response_data.unwrap_or(Value::Null))
    }
}

/// Messages the client acts on.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Opcode 0.
    Hello(Hello),
    /// Opcode 2.
    Identified(Identified),
    /// Opcode 5.
    Event(EventMessage),
    /// Opcode 7.
    RequestResponse(RequestResponse),
    /// Any other opcode; ignored.
    Other(u8),
}

fn payload<T: for<'de> Deserialize<'de>>(op: u8, d: Value) -> CoreResult<T> {
    serde_json::from_value(d).map_err(|e| CoreError::protocol(format!("Bad payload for op {}: {}", op, e)))
}

/// Decode one text frame from the server.
pub fn decode(text: &str) -> CoreResult<ServerMessage> {
    let envelope: Envelope = serde_json::from_str(text)
        .map_err(|e| CoreError::protocol(format!("Invalid frame: {}", e)))?;

    let message = match envelope.op {
        opcode::HELLO => ServerMessage::Hello(payload(envelope.op, envelope.d)?),
        opcode::IDENTIFIED => ServerMessage::Identified(payload(envelope.op, envelope.d)?),
        opcode::EVENT => ServerMessage::Event(payload(envelope.op, envelope.d)?),
        opcode::REQUEST_RESPONSE => {
            ServerMessage::RequestResponse(payload(envelope.op, envelope.d)?)
        }
        other => ServerMessage::Other(other),
    };

    Ok(message)
}

fn encode(op: u8, d: Value) -> String {
    json!({ "op": op, "d": d }).to_string()
}

/// Build the `Identify` frame answering `hello`.
///
/// Fails with [`CoreError::AuthenticationRequired`] when the server demands
/// a password and none is configured.
#[track_caller]
pub fn identify(hello: &Hello, password: Option<&str>) -> CoreResult<String> {
    let mut d = json!({
        "rpcVersion": RPC_VERSION.min(hello.rpc_version),
        "eventSubscriptions": OUTPUTS_SUBSCRIPTION,
    });

    if let Some(auth) = &hello.authentication {
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| CoreError::AuthenticationRequired {
                location: ErrorLocation::from(Location::caller()),
            })?;
        d["authentication"] =
            Value::String(authentication_string(password, &auth.salt, &auth.challenge));
    }

    Ok(encode(opcode::IDENTIFY, d))
}

/// Build a `Request` frame without request data.
pub fn request(request_type: &str, request_id: &str) -> String {
    encode(
        opcode::REQUEST,
        json!({ "requestType": request_type, "requestId": request_id }),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionData {
    obs_version: String,
}

/// Extract the OBS version from a `GetVersion` response payload.
pub fn version(data: Value) -> CoreResult<String> {
    serde_json::from_value::<VersionData>(data)
        .map(|v| v.obs_version)
        .map_err(|e| CoreError::protocol(format!("Bad GetVersion payload: {}", e)))
}

/// Extract a polled snapshot from a `GetRecordStatus` response payload.
pub fn record_status(data: Value) -> CoreResult<RawStatus> {
    serde_json::from_value::<RawStatus>(data)
        .map_err(|e| CoreError::protocol(format!("Bad GetRecordStatus payload: {}", e)))
}
