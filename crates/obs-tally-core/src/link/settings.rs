/// Default obs-websocket host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default obs-websocket port.
pub const DEFAULT_PORT: u16 = 4455;

/// Where and how to reach the control socket.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Host name or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Server password, if authentication is enabled.
    pub password: Option<String>,
}

impl ConnectionSettings {
    /// WebSocket URL for these settings.
    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            password: None,
        }
    }
}

// Keep the password out of logs.
impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
