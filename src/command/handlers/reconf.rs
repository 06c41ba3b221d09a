//! RECONF trigger handler

use crate::command::CommandHandler;
use crate::hardware::Hardware;
use crate::transport::PacketContext;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Discards the persisted configuration, acknowledges, then resets so the
/// device comes back up with defaults. Terminal, like `RESET`.
pub struct ReconfHandler {
    hardware: Arc<dyn Hardware>,
}

impl ReconfHandler {
    pub fn new(hardware: Arc<dyn Hardware>) -> Self {
        Self { hardware }
    }
}

#[async_trait]
impl CommandHandler for ReconfHandler {
    async fn handle(&self, ctx: &mut PacketContext<'_>) -> Result<()> {
        info!("RECONF called");
        self.hardware.reset_config();
        ctx.reply(&format!("OK RECONF:{}", self.hardware.node_name()));
        ctx.flush().await?;
        self.hardware.reset_with_reason("UDP RECONF request", true);
        Ok(())
    }
}
