//! Endpoint resolution: pick a free listening port, or validate an
//! explicitly configured one, and compose the externally advertised URL.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use rand::seq::SliceRandom;
use tokio::net::TcpListener;
use tracing::{debug, warn};

use lariat_core::{Error, Result};

use crate::config::ServiceConfig;

/// Reports whether a port is currently bindable. A trait so tests can
/// report specific ports as occupied deterministically.
pub trait PortProbe: Send + Sync {
    fn is_free(&self, port: u16) -> bool;
}

/// Probes by binding and immediately dropping a listener.
pub struct BindProbe {
    address: IpAddr,
}

impl BindProbe {
    pub fn new(address: IpAddr) -> Self {
        Self { address }
    }
}

impl PortProbe for BindProbe {
    fn is_free(&self, port: u16) -> bool {
        std::net::TcpListener::bind((self.address, port)).is_ok()
    }
}

/// Ports in the configured range not currently listening, in random order.
pub fn free_candidates(config: &ServiceConfig, probe: &dyn PortProbe) -> Vec<u16> {
    let (start, end) = config.port_range;
    let mut candidates: Vec<u16> = (start..end).filter(|p| probe.is_free(*p)).collect();
    candidates.shuffle(&mut rand::rng());
    candidates
}

/// Resolve a listener for the service.
///
/// An explicitly configured port that is already occupied is fatal; without
/// one, the shuffled free candidates are tried in order and the first
/// successful bind wins.
pub async fn resolve(
    config: &ServiceConfig,
    bind_address: IpAddr,
    probe: &dyn PortProbe,
) -> Result<(TcpListener, u16)> {
    if let Some(port) = config.port {
        if !probe.is_free(port) {
            return Err(Error::PortInUse(port));
        }
        let listener = TcpListener::bind((bind_address, port)).await?;
        return Ok((listener, port));
    }

    for port in free_candidates(config, probe) {
        match TcpListener::bind((bind_address, port)).await {
            Ok(listener) => return Ok((listener, port)),
            Err(e) => {
                // Lost the race for the port since probing; keep going.
                warn!(port, error = %e, "unable to bind candidate port");
            }
        }
    }

    let (start, end) = config.port_range;
    Err(Error::NoFreePort(start, end))
}

/// The externally advertised base URL.
pub fn advertised_url(address: &str, port: u16) -> String {
    format!("http://{}:{}/", address, port)
}

/// The host's primary outward-facing IPv4 address, discovered by routing a
/// (never sent) datagram. Falls back to loopback when the host is offline.
pub fn primary_ipv4() -> String {
    let discovered = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|socket| {
            socket.connect(("8.8.8.8", 80))?;
            socket.local_addr()
        })
        .map(|addr| addr.ip().to_string());
    match discovered {
        Ok(ip) => ip,
        Err(e) => {
            debug!(error = %e, "falling back to loopback address");
            Ipv4Addr::LOCALHOST.to_string()
        }
    }
}
