use crate::config::{default_auto_connect, default_host, default_port};

use obs_tally_core::ConnectionSettings;

use serde::{Deserialize, Serialize};

/// obs-websocket connection configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Host running OBS.
    #[serde(default = "default_host")]
    pub host: String,
    /// obs-websocket server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Server password (None = authentication disabled).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Connect on startup.
    #[serde(default = "default_auto_connect")]
    pub auto_connect: bool,
}

impl ConnectionConfig {
    /// Settings handed to the connection supervisor.
    pub fn to_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            host: self.host.clone(),
            port: self.port,
            password: self.password.clone().filter(|p| !p.is_empty()),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            password: None,
            auto_connect: default_auto_connect(),
        }
    }
}

// Same output as ConnectionSettings: the password never reaches the logs.
impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("auto_connect", &self.auto_connect)
            .finish()
    }
}
