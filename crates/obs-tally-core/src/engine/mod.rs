#[allow(clippy::module_inception)]
mod engine;
mod handle;
mod ingress;
mod poller;

pub use {
    engine::{DEFAULT_RECONNECT_INTERVAL, Engine, EngineSettings},
    handle::EngineHandle,
    ingress::{EngineCommand, INGRESS_CAPACITY, Ingress, ingress_channel},
    poller::{DEFAULT_POLL_INTERVAL, PollAction, PollScheduler},
};
