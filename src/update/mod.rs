//! Over-the-air firmware update flow
//!
//! `UPDATE` datagrams only arm a one-shot session flag; the periodic tick in
//! `main` drives [`orchestrator::UpdateOrchestrator`] through the actual
//! version check, download, flash write and reset. This keeps the listener
//! responsive while an update is in flight.

pub mod firmware;
pub mod orchestrator;

pub use firmware::FirmwareClient;
pub use orchestrator::{UpdateOrchestrator, UpdateOutcome, UpdateState};

use std::sync::atomic::{AtomicBool, Ordering};

/// Transient state of at most one in-flight update attempt
///
/// Armed by the `UPDATE` handler, consumed by the next tick regardless of
/// outcome. Nothing survives a reset; a failed attempt needs a fresh
/// `UPDATE` trigger.
#[derive(Default)]
pub struct UpdateSession {
    pending: AtomicBool,
}

impl UpdateSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request an update; re-arming while pending is a no-op
    pub fn arm(&self) -> bool {
        !self.pending.swap(true, Ordering::SeqCst)
    }

    /// Consume the pending request, returning whether one was armed
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }
}
