mod auth;
mod messages;

pub use auth::authentication_string;
pub use messages::{
    AuthChallenge, EventMessage, GET_RECORD_STATUS, GET_VERSION, Hello, Identified,
    OUTPUTS_SUBSCRIPTION, RECORD_STATE_CHANGED, RPC_VERSION, RequestResponse, RequestStatus,
    ServerMessage, decode, identify, record_status, request, version,
};
