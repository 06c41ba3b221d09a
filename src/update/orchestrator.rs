//! Update orchestrator - the single-flow OTA state machine
//!
//! Runs at most once per periodic tick, and only when the session flag is
//! armed. Every failure is reported as a broadcast line plus a state
//! transition, never as an error crossing the component boundary; the only
//! paths that end in a reset are a completed update and nothing else.

use super::firmware::FirmwareClient;
use super::UpdateSession;
use crate::hardware::Hardware;
use crate::transport::Notifier;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// States of one update attempt
///
/// `Failed` is terminal for the session without a reset: the device keeps
/// running the old firmware and the state returns to `Idle` when the tick
/// ends. Only `Success` leads to `ResetPending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    Idle,
    CheckingVersion,
    NoUpdate,
    Downloading,
    Writing,
    Verifying,
    Success,
    ResetPending,
    Failed,
}

/// How a serviced session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    NoUpdate,
    Updated,
    Failed,
}

pub struct UpdateOrchestrator {
    hardware: Arc<dyn Hardware>,
    notifier: Arc<dyn Notifier>,
    session: Arc<UpdateSession>,
    client: FirmwareClient,
    state: Mutex<UpdateState>,
}

impl UpdateOrchestrator {
    pub fn new(
        hardware: Arc<dyn Hardware>,
        notifier: Arc<dyn Notifier>,
        session: Arc<UpdateSession>,
        client: FirmwareClient,
    ) -> Self {
        Self {
            hardware,
            notifier,
            session,
            client,
            state: Mutex::new(UpdateState::Idle),
        }
    }

    pub fn state(&self) -> UpdateState {
        *self.state.lock().expect("state lock poisoned")
    }

    fn set_state(&self, next: UpdateState) {
        let mut state = self.state.lock().expect("state lock poisoned");
        debug!("update state {:?} -> {:?}", *state, next);
        *state = next;
    }

    /// Service the session flag once; returns `None` when nothing was armed
    ///
    /// The flag is consumed before the attempt starts, so the outcome -
    /// success, failure or no update - always ends the session.
    pub async fn tick(&self) -> Option<UpdateOutcome> {
        if !self.session.take() {
            return None;
        }
        let outcome = self.run_once().await;
        self.set_state(UpdateState::Idle);
        Some(outcome)
    }

    async fn run_once(&self) -> UpdateOutcome {
        let node = self.hardware.node_name().to_string();

        self.set_state(UpdateState::CheckingVersion);
        let current = self.hardware.firmware_version();
        let remote = match self.client.remote_version(&node).await {
            Some(remote) if remote.as_str() > current => remote,
            other => {
                info!(
                    current,
                    remote = other.as_deref().unwrap_or("unavailable"),
                    "no newer firmware"
                );
                self.set_state(UpdateState::NoUpdate);
                self.notifier
                    .broadcast(&format!("OK UPDATE:{node} No Update available"))
                    .await;
                return UpdateOutcome::NoUpdate;
            }
        };
        info!(current, remote = remote.as_str(), "newer firmware available");

        self.set_state(UpdateState::Downloading);
        let Some(mut download) = self.client.download(&node).await else {
            self.set_state(UpdateState::Failed);
            return UpdateOutcome::Failed;
        };
        let Some(total) = download.declared_size() else {
            self.notifier
                .broadcast(&format!("ERR UPDATE:{node} Abort, no size"))
                .await;
            self.set_state(UpdateState::Failed);
            return UpdateOutcome::Failed;
        };

        self.set_state(UpdateState::Writing);
        let mut writer = match self.hardware.begin_firmware_write(total) {
            Ok(writer) => writer,
            Err(e) => {
                debug!("flash reservation failed: {e}");
                self.notifier
                    .broadcast(&format!("ERR UPDATE:{node} Abort, not enough space"))
                    .await;
                self.set_state(UpdateState::Failed);
                return UpdateOutcome::Failed;
            }
        };
        self.notifier
            .broadcast(&format!("OK UPDATE:{node} Starting"))
            .await;

        loop {
            match download.next_chunk().await {
                Ok(Some(chunk)) => {
                    if let Err(e) = writer.write(&chunk) {
                        warn!("flash write failed: {e}");
                        break;
                    }
                    // Progress doubles as the watchdog feed: a long write
                    // must not look like a hung device.
                    self.notifier
                        .broadcast(&format!(
                            "OK UPDATE:{node} {}/{total}",
                            writer.bytes_written()
                        ))
                        .await;
                    self.hardware.feed_watchdog();
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("download interrupted: {e}");
                    break;
                }
            }
        }

        let written = writer.bytes_written();
        if written != total {
            self.notifier
                .broadcast(&format!(
                    "ERR UPDATE:{node} Abort, written:{written} size:{total}"
                ))
                .await;
            self.set_state(UpdateState::Failed);
            return UpdateOutcome::Failed;
        }

        self.set_state(UpdateState::Verifying);
        self.notifier
            .broadcast(&format!("OK UPDATE:{node} Finishing"))
            .await;
        if let Err(e) = writer.finalize() {
            self.notifier
                .broadcast(&format!(
                    "ERR UPDATE:{node} Abort finish failed: {}",
                    e.code()
                ))
                .await;
            self.set_state(UpdateState::Failed);
            return UpdateOutcome::Failed;
        }
        self.notifier
            .broadcast(&format!("OK UPDATE:{node} Finished"))
            .await;
        self.set_state(UpdateState::Success);

        // A fresh image may carry new configuration defaults; force
        // reconfiguration rather than booting it against stale settings.
        self.hardware.reset_config();
        self.set_state(UpdateState::ResetPending);
        self.hardware.reset_with_reason("Firmware updated", true);
        UpdateOutcome::Updated
    }
}
