//! Broadcast notifier - fire-and-forget status lines to the multicast group
//!
//! Distinct from the unicast reply path: every listener on the group observes
//! update progress, not just the requester. Send failures are logged and
//! dropped; status reporting must never abort an update.

use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::debug;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn broadcast(&self, line: &str);
}

pub struct MulticastNotifier {
    socket: UdpSocket,
    group: SocketAddr,
}

impl MulticastNotifier {
    pub async fn new(config: &Config) -> Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .await
            .context("binding notifier socket")?;
        Ok(Self {
            socket,
            group: config.group(),
        })
    }
}

#[async_trait]
impl Notifier for MulticastNotifier {
    async fn broadcast(&self, line: &str) {
        debug!(%line, "broadcast");
        if let Err(e) = self.socket.send_to(line.as_bytes(), self.group).await {
            debug!("broadcast to {} failed: {}", self.group, e);
        }
    }
}
