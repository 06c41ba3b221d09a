//! Built-in trigger handlers
//!
//! Every handler replies on the unicast channel to the requester as
//! `OK <CMD>:<node>` or `ERR <CMD>:<node> <reason>`. `RESET` and `RECONF`
//! are terminal; `UPDATE` only arms the deferred session so the listener
//! stays responsive while the orchestrator works.

mod info;
mod reconf;
mod reset;
mod update;
mod version;

pub use info::InfoHandler;
pub use reconf::ReconfHandler;
pub use reset::ResetHandler;
pub use update::UpdateHandler;
pub use version::VersionHandler;

use crate::command::CommandRegistry;
use crate::hardware::Hardware;
use crate::update::UpdateSession;
use std::sync::Arc;

/// Register the built-in trigger set
pub async fn register_builtins(
    registry: &CommandRegistry,
    hardware: Arc<dyn Hardware>,
    session: Arc<UpdateSession>,
) {
    registry
        .register("UPDATE", Arc::new(UpdateHandler::new(hardware.clone(), session)))
        .await;
    registry
        .register("RESET", Arc::new(ResetHandler::new(hardware.clone())))
        .await;
    registry
        .register("RECONF", Arc::new(ReconfHandler::new(hardware.clone())))
        .await;
    registry
        .register("INFO", Arc::new(InfoHandler::new(hardware.clone())))
        .await;
    registry
        .register("VERSION", Arc::new(VersionHandler::new(hardware)))
        .await;
}
