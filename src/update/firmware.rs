//! HTTP client for the firmware server
//!
//! The server publishes `<base>/<node>.version` (plain-text version) and
//! `<base>/<node>.bin` (image with Content-Length). Timeouts are deliberately
//! tight: an unreachable server must degrade to "no update available" within
//! the configured bounds, and a stalled download must not hang the device.
//! The data timeout applies per streamed chunk rather than to the whole
//! transfer, since a full image takes longer than any sane read timeout.

use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::time::Duration;
use tracing::debug;

pub struct FirmwareClient {
    http: reqwest::Client,
    base_url: String,
    data_timeout: Duration,
}

impl FirmwareClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .context("building HTTP client")?;
        let mut base_url = config.firmware_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self {
            http,
            base_url,
            data_timeout: config.data_timeout(),
        })
    }

    /// Fetch the advertised firmware version for this node
    ///
    /// Non-2xx, timeouts and transport errors all mean "no update
    /// available"; the control channel treats an unreachable firmware server
    /// as routine.
    pub async fn remote_version(&self, node: &str) -> Option<String> {
        let url = format!("{}{}.version", self.base_url, node);
        let response = match self.http.get(&url).timeout(self.data_timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("version probe {url} failed: {e}");
                return None;
            }
        };
        if !response.status().is_success() {
            debug!(status = %response.status(), "version probe {url}");
            return None;
        }
        match response.text().await {
            Ok(body) => Some(body.trim().to_string()),
            Err(e) => {
                debug!("version probe body failed: {e}");
                None
            }
        }
    }

    /// Start downloading the firmware image; `None` on non-2xx or transport
    /// failure
    pub async fn download(&self, node: &str) -> Option<FirmwareDownload> {
        let url = format!("{}{}.bin", self.base_url, node);
        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("image download {url} failed: {e}");
                return None;
            }
        };
        if !response.status().is_success() {
            debug!(status = %response.status(), "image download {url}");
            return None;
        }
        let declared = response.content_length();
        Some(FirmwareDownload {
            stream: response.bytes_stream().boxed(),
            declared,
            data_timeout: self.data_timeout,
        })
    }
}

/// An in-progress image download
pub struct FirmwareDownload {
    stream: BoxStream<'static, reqwest::Result<Bytes>>,
    declared: Option<u64>,
    data_timeout: Duration,
}

impl FirmwareDownload {
    /// Size from the Content-Length header, if the server declared one
    pub fn declared_size(&self) -> Option<u64> {
        self.declared
    }

    /// Next body chunk; `Ok(None)` at end of stream
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        match tokio::time::timeout(self.data_timeout, self.stream.next()).await {
            Err(_) => Err(anyhow!("timed out waiting for image data")),
            Ok(None) => Ok(None),
            Ok(Some(Ok(chunk))) => Ok(Some(chunk)),
            Ok(Some(Err(e))) => Err(e).context("reading image stream"),
        }
    }
}
