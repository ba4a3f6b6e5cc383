//! Service configuration.

use std::env;

/// Configuration for the service runner.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Advertised (and bind) address. Defaults to the host's primary
    /// outward-facing IPv4 address when unset.
    pub address: Option<String>,
    /// Explicit listening port. When unset a free port is picked from
    /// `port_range`.
    pub port: Option<u16>,
    /// Candidate range scanned when no explicit port is configured.
    pub port_range: (u16, u16),
}

pub const DEFAULT_START_PORT: u16 = 5678;
pub const DEFAULT_END_PORT: u16 = 60000;

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            address: None,
            port: None,
            port_range: (DEFAULT_START_PORT, DEFAULT_END_PORT),
        }
    }
}

impl ServiceConfig {
    /// Read `LARIAT_SERVICE_ADDRESS` and `LARIAT_SERVICE_PORT` from the
    /// environment; unset or unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        let address = env::var("LARIAT_SERVICE_ADDRESS")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let port = env::var("LARIAT_SERVICE_PORT")
            .ok()
            .and_then(|s| s.trim().parse().ok());
        Self {
            address,
            port,
            ..Self::default()
        }
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn port_range(mut self, start: u16, end: u16) -> Self {
        self.port_range = (start, end);
        self
    }
}
