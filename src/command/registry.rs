//! Command registry - resolves trigger tokens to handler objects

use crate::transport::PacketContext;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A handler invoked for one inbound datagram
///
/// Handlers reply through the context and produce side effects only. An `Err`
/// is swallowed by the listener: the buffered reply is discarded and the
/// device keeps running.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, ctx: &mut PacketContext<'_>) -> Result<()>;
}

/// Maps trigger tokens to handlers
///
/// Registration is open to external collaborators at any time; the last
/// registration for a trigger wins.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn CommandHandler>>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, silently overwriting any existing one
    pub async fn register(&self, trigger: impl Into<String>, handler: Arc<dyn CommandHandler>) {
        self.handlers.write().await.insert(trigger.into(), handler);
    }

    /// Pure lookup; an unknown trigger is not an error
    pub async fn resolve(&self, trigger: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.read().await.get(trigger).cloned()
    }
}
