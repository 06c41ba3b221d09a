//! Device configuration for the multicast control channel and firmware updates
//!
//! Loaded once at startup from a JSON file; every field has a default so a
//! missing or partial file still yields a usable configuration. The `RECONF`
//! trigger discards the persisted file and restarts the device rather than
//! hot-swapping values in place.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Configuration for the control channel and update endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP connect timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// HTTP data timeout in milliseconds (per request / per streamed chunk)
    pub data_timeout_ms: u64,
    /// UDP port for the multicast group
    pub port: u16,
    /// IPv4 multicast group address
    pub multicast_addr: Ipv4Addr,
    /// Base URL serving `<node>.version` and `<node>.bin`
    pub firmware_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 500,
            data_timeout_ms: 1000,
            port: 2323,
            multicast_addr: Ipv4Addr::new(239, 1, 23, 42),
            firmware_url: "http://192.168.188.250/firmware/".into(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn data_timeout(&self) -> Duration {
        Duration::from_millis(self.data_timeout_ms)
    }

    /// The multicast group as a socket address
    pub fn group(&self) -> SocketAddr {
        SocketAddr::from((self.multicast_addr, self.port))
    }
}
