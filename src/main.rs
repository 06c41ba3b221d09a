mod command;
mod config;
mod hardware;
mod transport;
mod update;

#[cfg(test)]
mod test_support;

use command::{handlers, CommandRegistry};
use config::Config;
use hardware::host::HostHardware;
use hardware::Hardware;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use transport::{MulticastListener, MulticastNotifier, Notifier};
use update::{FirmwareClient, UpdateOrchestrator, UpdateSession};

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Cadence of the deferred-work tick servicing the update session
const TICK_INTERVAL: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config_path = PathBuf::from(
        std::env::args()
            .nth(1)
            .unwrap_or_else(|| "nodecast.json".into()),
    );
    let config = Config::load(&config_path)?;

    // Node identity comes from the hardware collaborator; on the host
    // simulator it is taken from the environment.
    let node_name = std::env::var("NODECAST_NODE").unwrap_or_else(|_| "node-001".into());
    let hardware: Arc<dyn Hardware> =
        Arc::new(HostHardware::new(node_name).with_config_path(&config_path));

    info!(
        "node {} starting, firmware {}",
        hardware.node_name(),
        hardware.firmware_version()
    );
    info!("  control channel: {}", config.group());
    info!("  firmware server: {}", config.firmware_url);

    let registry = Arc::new(CommandRegistry::new());
    let session = Arc::new(UpdateSession::new());
    handlers::register_builtins(&registry, hardware.clone(), session.clone()).await;

    let notifier: Arc<dyn Notifier> = Arc::new(MulticastNotifier::new(&config).await?);
    let orchestrator = UpdateOrchestrator::new(
        hardware,
        notifier,
        session,
        FirmwareClient::new(&config)?,
    );

    let listener = MulticastListener::bind(&config, registry).await?;
    tokio::spawn(async move {
        if let Err(e) = listener.run().await {
            error!("listener stopped: {e:#}");
        }
    });

    // The tick loop is the single consumer of the update session; ticks are
    // sequential, so at most one update flow runs at a time.
    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    loop {
        ticker.tick().await;
        if let Some(outcome) = orchestrator.tick().await {
            info!(?outcome, "update attempt finished");
        }
    }
}
