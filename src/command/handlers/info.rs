//! INFO trigger handler

use crate::command::CommandHandler;
use crate::hardware::{Component, ComponentVisitor, Hardware, ResetSource};
use crate::transport::PacketContext;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::info;

/// Replies with a point-in-time status block: identity, firmware version,
/// reset causes, uptime, addresses, and one `name.key:value` line per
/// statistic in the component tree. One multi-line packet.
pub struct InfoHandler {
    hardware: Arc<dyn Hardware>,
}

impl InfoHandler {
    pub fn new(hardware: Arc<dyn Hardware>) -> Self {
        Self { hardware }
    }
}

/// Collects `name.key:value` lines from the component tree
#[derive(Default)]
struct StatsCollector {
    out: String,
}

impl ComponentVisitor for StatsCollector {
    fn visit(&mut self, component: &dyn Component) {
        for (key, value) in component.statistics() {
            let _ = writeln!(self.out, "{}.{}:{}", component.name(), key, value);
        }
    }
}

#[async_trait]
impl CommandHandler for InfoHandler {
    async fn handle(&self, ctx: &mut PacketContext<'_>) -> Result<()> {
        info!("INFO called");
        let hw = &self.hardware;
        let mut stats = StatsCollector::default();
        hw.accept(&mut stats);
        let (code0, code1) = hw.reset_codes();

        ctx.reply(&format!(
            "OK INFO:{node}\n\
             Version:{version}\n\
             ResetReason:{reason}\n\
             RunTimeInMillis:{uptime}\n\
             ResetSource:{source0}:{source1}\n\
             LocalIP:{ip}\n\
             Mac:{mac}\n\
             {stats}",
            node = hw.node_name(),
            version = hw.firmware_version(),
            reason = hw.last_reset_reason(),
            uptime = hw.uptime().as_millis(),
            source0 = ResetSource::from_code(code0),
            source1 = ResetSource::from_code(code1),
            ip = hw.local_ip(),
            mac = hw.mac_address(),
            stats = stats.out,
        ));
        ctx.flush().await
    }
}
