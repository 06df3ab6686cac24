#[allow(clippy::module_inception)]
mod config;
mod connection_config;
mod display_config;
mod timing_config;

pub(crate) use {
    config::{Config, ConfigSource},
    connection_config::ConnectionConfig,
    display_config::DisplayConfig,
    timing_config::TimingConfig,
};

use crate::DisplayMode;

use obs_tally_core::{DEFAULT_HOST, DEFAULT_PORT};

pub(crate) const DEFAULT_AUTO_CONNECT: bool = true;
pub(crate) const DEFAULT_POLL_INTERVAL_MS: u64 = 250;
pub(crate) const DEFAULT_RECONNECT_INTERVAL_MS: u64 = 5000;
pub(crate) const DEFAULT_ADJUST_STEP_SECONDS: u64 = 60;

pub(crate) fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

pub(crate) fn default_port() -> u16 {
    DEFAULT_PORT
}

pub(crate) fn default_auto_connect() -> bool {
    DEFAULT_AUTO_CONNECT
}

pub(crate) fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

pub(crate) fn default_reconnect_interval_ms() -> u64 {
    DEFAULT_RECONNECT_INTERVAL_MS
}

pub(crate) fn default_mode() -> DisplayMode {
    DisplayMode::default()
}

pub(crate) fn default_adjust_step_seconds() -> u64 {
    DEFAULT_ADJUST_STEP_SECONDS
}
