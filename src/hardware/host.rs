//! Host hardware implementation for development machines
//!
//! Stands in for the real device framework: firmware images are staged to a
//! directory with a capacity limit, watchdog feeds are logged, and a reset
//! exits the process. The real device links its own `Hardware` implementation
//! instead.

use super::{Component, ComponentVisitor, FirmwareWriter, FlashError, Hardware};
use std::fs::{self, File};
use std::io::Write;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const DEFAULT_FLASH_CAPACITY: u64 = 4 * 1024 * 1024;

pub struct HostHardware {
    node_name: String,
    firmware_version: String,
    started: Instant,
    local_ip: IpAddr,
    staging_dir: PathBuf,
    flash_capacity: u64,
    config_path: Option<PathBuf>,
}

impl HostHardware {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            firmware_version: env!("CARGO_PKG_VERSION").into(),
            started: Instant::now(),
            local_ip: detect_local_ip(),
            staging_dir: std::env::temp_dir().join("nodecast-firmware"),
            flash_capacity: DEFAULT_FLASH_CAPACITY,
            config_path: None,
        }
    }

    /// File removed by `reset_config`
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn with_flash_capacity(mut self, capacity: u64) -> Self {
        self.flash_capacity = capacity;
        self
    }
}

impl Hardware for HostHardware {
    fn node_name(&self) -> &str {
        &self.node_name
    }

    fn firmware_version(&self) -> &str {
        &self.firmware_version
    }

    fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    fn local_ip(&self) -> IpAddr {
        self.local_ip
    }

    fn mac_address(&self) -> String {
        // Locally administered placeholder; the real framework reads the NIC.
        "02:00:00:00:00:01".into()
    }

    fn last_reset_reason(&self) -> String {
        "Power on".into()
    }

    fn reset_codes(&self) -> (u8, u8) {
        (1, 1)
    }

    fn feed_watchdog(&self) {
        debug!("watchdog fed");
    }

    fn reset_config(&self) {
        if let Some(path) = &self.config_path {
            match fs::remove_file(path) {
                Ok(()) => info!("persisted config {} removed", path.display()),
                Err(e) => debug!("config {} not removed: {}", path.display(), e),
            }
        }
    }

    fn reset_with_reason(&self, reason: &str, immediate: bool) {
        warn!(reason, immediate, "device reset requested, exiting");
        std::process::exit(0);
    }

    fn begin_firmware_write(&self, size: u64) -> Result<Box<dyn FirmwareWriter>, FlashError> {
        if size > self.flash_capacity {
            return Err(FlashError::NotEnoughSpace { size });
        }
        fs::create_dir_all(&self.staging_dir).map_err(FlashError::Write)?;
        let staged = self.staging_dir.join(format!("{}.bin.staged", self.node_name));
        let target = self.staging_dir.join(format!("{}.bin", self.node_name));
        let file = File::create(&staged).map_err(FlashError::Write)?;
        Ok(Box::new(HostFirmwareWriter {
            file,
            staged,
            target,
            written: 0,
        }))
    }

    fn accept(&self, visitor: &mut dyn ComponentVisitor) {
        visitor.visit(self);
    }
}

impl Component for HostHardware {
    fn name(&self) -> &str {
        &self.node_name
    }

    fn statistics(&self) -> Vec<(String, String)> {
        vec![(
            "uptimeSeconds".into(),
            self.started.elapsed().as_secs().to_string(),
        )]
    }
}

struct HostFirmwareWriter {
    file: File,
    staged: PathBuf,
    target: PathBuf,
    written: u64,
}

impl FirmwareWriter for HostFirmwareWriter {
    fn write(&mut self, chunk: &[u8]) -> Result<(), FlashError> {
        self.file.write_all(chunk).map_err(FlashError::Write)?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    fn bytes_written(&self) -> u64 {
        self.written
    }

    fn finalize(self: Box<Self>) -> Result<(), FlashError> {
        self.file.sync_all().map_err(FlashError::Finalize)?;
        fs::rename(&self.staged, &self.target).map_err(FlashError::Finalize)?;
        info!("firmware image staged at {}", self.target.display());
        Ok(())
    }
}

fn detect_local_ip() -> IpAddr {
    // Routing trick: connecting a UDP socket picks the outbound interface
    // without sending anything.
    std::net::UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("239.1.23.42:2323")?;
            socket.local_addr()
        })
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}
