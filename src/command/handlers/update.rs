//! UPDATE trigger handler

use crate::command::CommandHandler;
use crate::hardware::Hardware;
use crate::transport::PacketContext;
use crate::update::UpdateSession;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Acknowledges the request and arms the deferred update session
///
/// The version check and download run on the next orchestrator tick, never
/// inline; a device mid-download must still answer `RESET`.
pub struct UpdateHandler {
    hardware: Arc<dyn Hardware>,
    session: Arc<UpdateSession>,
}

impl UpdateHandler {
    pub fn new(hardware: Arc<dyn Hardware>, session: Arc<UpdateSession>) -> Self {
        Self { hardware, session }
    }
}

#[async_trait]
impl CommandHandler for UpdateHandler {
    async fn handle(&self, ctx: &mut PacketContext<'_>) -> Result<()> {
        info!("UPDATE called");
        ctx.reply(&format!("OK UPDATE:{}", self.hardware.node_name()));
        ctx.flush().await?;
        self.session.arm();
        Ok(())
    }
}
