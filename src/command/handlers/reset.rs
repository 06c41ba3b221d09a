//! RESET trigger handler

use crate::command::CommandHandler;
use crate::hardware::Hardware;
use crate::transport::PacketContext;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Acknowledges the request, then resets the device. Terminal on real
/// hardware: nothing runs after the reset call.
pub struct ResetHandler {
    hardware: Arc<dyn Hardware>,
}

impl ResetHandler {
    pub fn new(hardware: Arc<dyn Hardware>) -> Self {
        Self { hardware }
    }
}

#[async_trait]
impl CommandHandler for ResetHandler {
    async fn handle(&self, ctx: &mut PacketContext<'_>) -> Result<()> {
        info!("RESET called");
        ctx.reply(&format!("OK RESET:{}", self.hardware.node_name()));
        ctx.flush().await?;
        self.hardware.reset_with_reason("UDP RESET request", true);
        Ok(())
    }
}
