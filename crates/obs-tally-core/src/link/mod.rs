mod device_link;
mod event;
mod settings;
mod supervisor;

pub use {
    device_link::DeviceLink,
    event::{ConnectionEvent, ConnectionState},
    settings::{ConnectionSettings, DEFAULT_HOST, DEFAULT_PORT},
    supervisor::ConnectionSupervisor,
};
