//! VERSION trigger handler

use crate::command::CommandHandler;
use crate::hardware::Hardware;
use crate::transport::PacketContext;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Replies with the running firmware version. No side effects; the listener
/// sends the buffered reply after the handler returns.
pub struct VersionHandler {
    hardware: Arc<dyn Hardware>,
}

impl VersionHandler {
    pub fn new(hardware: Arc<dyn Hardware>) -> Self {
        Self { hardware }
    }
}

#[async_trait]
impl CommandHandler for VersionHandler {
    async fn handle(&self, ctx: &mut PacketContext<'_>) -> Result<()> {
        info!("VERSION called");
        ctx.reply(&format!(
            "OK VERSION:{}\nVersion:{}",
            self.hardware.node_name(),
            self.hardware.firmware_version()
        ));
        Ok(())
    }
}
