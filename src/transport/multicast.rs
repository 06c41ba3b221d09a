//! Multicast datagram listener and the per-packet reply context
//!
//! The listener joins the configured group and feeds each datagram through
//! the command registry. Oversized payloads, non-UTF-8 payloads and unknown
//! triggers are dropped without a reply; handler errors are swallowed so the
//! listener never dies to a misbehaving packet.

use crate::command::CommandRegistry;
use crate::config::Config;
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, info, trace};

/// Longest accepted trigger token; datagrams past this are dropped outright
pub const MAX_TRIGGER_LEN: usize = 9;

/// Outbound side of the reply path, abstracted so dispatch is testable
/// without sockets
#[async_trait]
pub trait DatagramSink: Send + Sync {
    async fn send_to(&self, buf: &[u8], peer: SocketAddr) -> std::io::Result<usize>;
}

#[async_trait]
impl DatagramSink for UdpSocket {
    async fn send_to(&self, buf: &[u8], peer: SocketAddr) -> std::io::Result<usize> {
        UdpSocket::send_to(self, buf, peer).await
    }
}

/// Context handed to a handler for one inbound datagram
///
/// Reply text is buffered and sent as a single unicast datagram to the
/// packet's originator on `flush`. The listener flushes any remainder after
/// the handler returns `Ok`, and discards it when the handler errors.
pub struct PacketContext<'a> {
    peer: SocketAddr,
    payload: &'a [u8],
    sink: &'a dyn DatagramSink,
    reply: String,
}

impl<'a> PacketContext<'a> {
    pub fn new(peer: SocketAddr, payload: &'a [u8], sink: &'a dyn DatagramSink) -> Self {
        Self {
            peer,
            payload,
            sink,
            reply: String::new(),
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn payload(&self) -> &[u8] {
        self.payload
    }

    /// Append text to the pending reply
    pub fn reply(&mut self, text: &str) {
        self.reply.push_str(text);
    }

    /// Send the pending reply to the originator as one datagram
    pub async fn flush(&mut self) -> Result<()> {
        if self.reply.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.reply);
        self.sink
            .send_to(text.as_bytes(), self.peer)
            .await
            .with_context(|| format!("replying to {}", self.peer))?;
        Ok(())
    }
}

/// Resolve one inbound datagram against the registry and run the handler
pub async fn dispatch(
    registry: &CommandRegistry,
    sink: &dyn DatagramSink,
    payload: &[u8],
    peer: SocketAddr,
) {
    if payload.len() > MAX_TRIGGER_LEN {
        trace!(len = payload.len(), %peer, "oversized datagram ignored");
        return;
    }
    let Ok(trigger) = std::str::from_utf8(payload) else {
        trace!(%peer, "non-text datagram ignored");
        return;
    };
    let Some(handler) = registry.resolve(trigger).await else {
        trace!(trigger, %peer, "unknown trigger ignored");
        return;
    };

    let mut ctx = PacketContext::new(peer, payload, sink);
    if let Err(e) = handler.handle(&mut ctx).await {
        debug!(trigger, "handler failed: {e:#}");
        return;
    }
    if let Err(e) = ctx.flush().await {
        debug!(trigger, "reply not sent: {e:#}");
    }
}

/// Listens on the multicast group and dispatches triggers to the registry
pub struct MulticastListener {
    socket: Arc<UdpSocket>,
    registry: Arc<CommandRegistry>,
}

impl MulticastListener {
    /// Bind the configured port and join the multicast group
    pub async fn bind(config: &Config, registry: Arc<CommandRegistry>) -> Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, config.port))
            .await
            .with_context(|| format!("binding UDP port {}", config.port))?;
        socket
            .join_multicast_v4(config.multicast_addr, Ipv4Addr::UNSPECIFIED)
            .with_context(|| format!("joining multicast group {}", config.multicast_addr))?;
        info!("listening on {}", config.group());
        Ok(Self {
            socket: Arc::new(socket),
            registry,
        })
    }

    pub async fn run(self) -> Result<()> {
        let mut buf = [0u8; 1500];
        loop {
            let (len, peer) = self
                .socket
                .recv_from(&mut buf)
                .await
                .context("receiving datagram")?;
            dispatch(&self.registry, self.socket.as_ref(), &buf[..len], peer).await;
        }
    }
}
