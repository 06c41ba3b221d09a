//! Hardware collaborator boundary
//!
//! The surrounding sensor framework owns node identity, the watchdog, resets
//! and flash programming. This module defines the narrow trait surface the
//! dispatcher and update flow consume; implementations are injected as
//! `Arc<dyn Hardware>`. [`host::HostHardware`] is the development
//! implementation used by the binary.

pub mod host;
pub mod reset;

pub use reset::ResetSource;

use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

/// Flash programming errors
///
/// `code()` is the numeric identifier reported over the broadcast channel in
/// abort messages.
#[derive(Debug, Error)]
pub enum FlashError {
    #[error("not enough space for {size} byte image")]
    NotEnoughSpace { size: u64 },
    #[error("flash write failed: {0}")]
    Write(#[source] std::io::Error),
    #[error("flash finalize failed: {0}")]
    Finalize(#[source] std::io::Error),
}

impl FlashError {
    pub fn code(&self) -> i32 {
        match self {
            FlashError::NotEnoughSpace { .. } => 1,
            FlashError::Write(_) => 2,
            FlashError::Finalize(_) => 3,
        }
    }
}

/// One in-flight firmware write, created by [`Hardware::begin_firmware_write`]
///
/// Data is staged incrementally; nothing is bootable until `finalize`
/// succeeds. Dropping a writer without finalizing discards the staged image.
pub trait FirmwareWriter: Send {
    fn write(&mut self, chunk: &[u8]) -> Result<(), FlashError>;
    fn bytes_written(&self) -> u64;
    /// Make the staged image bootable
    fn finalize(self: Box<Self>) -> Result<(), FlashError>;
}

/// A component of the device tree that contributes statistics
pub trait Component {
    fn name(&self) -> &str;
    /// Key/value statistics, reported as `name.key:value` lines
    fn statistics(&self) -> Vec<(String, String)>;
}

/// Visitor over the device's component tree
pub trait ComponentVisitor {
    fn visit(&mut self, component: &dyn Component);
}

/// The hardware collaborator consumed by handlers and the update flow
pub trait Hardware: Send + Sync {
    fn node_name(&self) -> &str;
    fn firmware_version(&self) -> &str;
    fn uptime(&self) -> Duration;
    fn local_ip(&self) -> IpAddr;
    fn mac_address(&self) -> String;
    /// Reason recorded for the last software-triggered reset
    fn last_reset_reason(&self) -> String;
    /// Raw reset-cause codes for both CPUs, decoded via [`ResetSource`]
    fn reset_codes(&self) -> (u8, u8);
    fn feed_watchdog(&self);
    /// Discard the persisted device configuration
    fn reset_config(&self);
    /// Reset the device, recording `reason`. Never returns on real hardware.
    fn reset_with_reason(&self, reason: &str, immediate: bool);
    /// Reserve flash space for an image of `size` bytes
    fn begin_firmware_write(&self, size: u64) -> Result<Box<dyn FirmwareWriter>, FlashError>;
    /// Walk the component tree with a statistics visitor
    fn accept(&self, visitor: &mut dyn ComponentVisitor);
}
