//! Shared test doubles: a scriptable hardware mock, recording sinks for both
//! reply and broadcast channels, and a canned-response HTTP server for
//! driving the update flow against a real socket.

use crate::hardware::{Component, ComponentVisitor, FirmwareWriter, FlashError, Hardware};
use crate::transport::{DatagramSink, Notifier};
use async_trait::async_trait;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A fixed requester address for handler tests
pub fn peer() -> SocketAddr {
    "192.0.2.10:31337".parse().unwrap()
}

// ---------------------------------------------------------------------------
// Hardware mock

/// Observable flash state shared between the mock and its writers
#[derive(Default)]
pub struct MockFlash {
    begun_with: Mutex<Option<u64>>,
    written: Mutex<Vec<u8>>,
    finalized: AtomicBool,
    fail_finalize: AtomicBool,
}

impl MockFlash {
    pub fn begun_with(&self) -> Option<u64> {
        *self.begun_with.lock().unwrap()
    }

    pub fn written(&self) -> Vec<u8> {
        self.written.lock().unwrap().clone()
    }

    pub fn finalized(&self) -> bool {
        self.finalized.load(Ordering::SeqCst)
    }
}

struct MockWriter {
    flash: Arc<MockFlash>,
    written: u64,
}

impl FirmwareWriter for MockWriter {
    fn write(&mut self, chunk: &[u8]) -> Result<(), FlashError> {
        self.flash.written.lock().unwrap().extend_from_slice(chunk);
        self.written += chunk.len() as u64;
        Ok(())
    }

    fn bytes_written(&self) -> u64 {
        self.written
    }

    fn finalize(self: Box<Self>) -> Result<(), FlashError> {
        if self.flash.fail_finalize.load(Ordering::SeqCst) {
            return Err(FlashError::Finalize(std::io::Error::new(
                std::io::ErrorKind::Other,
                "scripted finalize failure",
            )));
        }
        self.flash.finalized.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Scriptable `Hardware` implementation that records every terminal call
pub struct MockHardware {
    node: String,
    version: String,
    flash_capacity: u64,
    reset_codes: (u8, u8),
    components: Vec<(String, Vec<(String, String)>)>,
    watchdog_feeds: AtomicUsize,
    events: Mutex<Vec<String>>,
    pub flash: Arc<MockFlash>,
}

impl MockHardware {
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            version: "1.0.0".into(),
            flash_capacity: u64::MAX,
            reset_codes: (1, 1),
            components: Vec::new(),
            watchdog_feeds: AtomicUsize::new(0),
            events: Mutex::new(Vec::new()),
            flash: Arc::new(MockFlash::default()),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_flash_capacity(mut self, capacity: u64) -> Self {
        self.flash_capacity = capacity;
        self
    }

    pub fn with_finalize_failure(self) -> Self {
        self.flash.fail_finalize.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_reset_codes(mut self, code0: u8, code1: u8) -> Self {
        self.reset_codes = (code0, code1);
        self
    }

    pub fn with_component(mut self, name: &str, stats: Vec<(&str, &str)>) -> Self {
        self.components.push((
            name.to_string(),
            stats
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));
        self
    }

    /// Terminal calls in invocation order: `reset_config`,
    /// `reset:<reason>:immediate`
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn watchdog_feeds(&self) -> usize {
        self.watchdog_feeds.load(Ordering::SeqCst)
    }
}

struct MockComponent<'a> {
    name: &'a str,
    stats: &'a [(String, String)],
}

impl Component for MockComponent<'_> {
    fn name(&self) -> &str {
        self.name
    }

    fn statistics(&self) -> Vec<(String, String)> {
        self.stats.to_vec()
    }
}

impl Hardware for MockHardware {
    fn node_name(&self) -> &str {
        &self.node
    }

    fn firmware_version(&self) -> &str {
        &self.version
    }

    fn uptime(&self) -> Duration {
        Duration::from_millis(12345)
    }

    fn local_ip(&self) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(192, 0, 2, 77))
    }

    fn mac_address(&self) -> String {
        "02:00:00:00:00:aa".into()
    }

    fn last_reset_reason(&self) -> String {
        "Power on".into()
    }

    fn reset_codes(&self) -> (u8, u8) {
        self.reset_codes
    }

    fn feed_watchdog(&self) {
        self.watchdog_feeds.fetch_add(1, Ordering::SeqCst);
    }

    fn reset_config(&self) {
        self.events.lock().unwrap().push("reset_config".into());
    }

    fn reset_with_reason(&self, reason: &str, immediate: bool) {
        let suffix = if immediate { ":immediate" } else { "" };
        self.events
            .lock()
            .unwrap()
            .push(format!("reset:{reason}{suffix}"));
    }

    fn begin_firmware_write(&self, size: u64) -> Result<Box<dyn FirmwareWriter>, FlashError> {
        if size > self.flash_capacity {
            return Err(FlashError::NotEnoughSpace { size });
        }
        *self.flash.begun_with.lock().unwrap() = Some(size);
        Ok(Box::new(MockWriter {
            flash: self.flash.clone(),
            written: 0,
        }))
    }

    fn accept(&self, visitor: &mut dyn ComponentVisitor) {
        for (name, stats) in &self.components {
            visitor.visit(&MockComponent {
                name: name.as_str(),
                stats: stats.as_slice(),
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Channel doubles

/// Captures unicast replies instead of sending them
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(SocketAddr, Vec<u8>)>>,
}

impl RecordingSink {
    pub fn sent(&self) -> Vec<(SocketAddr, Vec<u8>)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_text(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .map(|(_, bytes)| String::from_utf8(bytes).unwrap())
            .collect()
    }
}

#[async_trait]
impl DatagramSink for RecordingSink {
    async fn send_to(&self, buf: &[u8], peer: SocketAddr) -> std::io::Result<usize> {
        self.sent.lock().unwrap().push((peer, buf.to_vec()));
        Ok(buf.len())
    }
}

/// Captures broadcast status lines instead of multicasting them
#[derive(Default)]
pub struct RecordingNotifier {
    lines: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn broadcast(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}

// ---------------------------------------------------------------------------
// Canned HTTP server

/// One scripted response; paths not registered answer 404
#[derive(Clone)]
pub struct CannedResponse {
    status: u16,
    body: Vec<u8>,
    /// Content-Length header value; `None` omits the header entirely
    declared_length: Option<u64>,
}

impl CannedResponse {
    pub fn text(status: u16, body: &str) -> Self {
        Self::bytes(status, body.as_bytes().to_vec())
    }

    pub fn bytes(status: u16, body: Vec<u8>) -> Self {
        let declared_length = Some(body.len() as u64);
        Self {
            status,
            body,
            declared_length,
        }
    }

    pub fn without_content_length(mut self) -> Self {
        self.declared_length = None;
        self
    }

    /// Declare a length different from the actual body, to simulate a
    /// truncated transfer
    pub fn with_declared_length(mut self, length: u64) -> Self {
        self.declared_length = Some(length);
        self
    }
}

/// Minimal HTTP/1.1 server speaking just enough for the firmware client
pub struct TestHttpServer {
    pub base_url: String,
    hits: Arc<Mutex<Vec<String>>>,
}

impl TestHttpServer {
    pub async fn spawn(routes: Vec<(&str, CannedResponse)>) -> Self {
        let routes: HashMap<String, CannedResponse> = routes
            .into_iter()
            .map(|(path, response)| (path.to_string(), response))
            .collect();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(Mutex::new(Vec::new()));

        let hits_clone = hits.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let routes = routes.clone();
                let hits = hits_clone.clone();
                tokio::spawn(async move {
                    let _ = serve_one(stream, &routes, &hits).await;
                });
            }
        });

        Self {
            base_url: format!("http://{addr}/"),
            hits,
        }
    }

    /// Request paths in arrival order
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }
}

async fn serve_one(
    mut stream: tokio::net::TcpStream,
    routes: &HashMap<String, CannedResponse>,
    hits: &Mutex<Vec<String>>,
) -> std::io::Result<()> {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        request.extend_from_slice(&buf[..n]);
    }
    let head = String::from_utf8_lossy(&request);
    let path = head
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string();
    hits.lock().unwrap().push(path.clone());

    let response = routes.get(&path).cloned().unwrap_or(CannedResponse {
        status: 404,
        body: Vec::new(),
        declared_length: Some(0),
    });

    let reason = match response.status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "",
    };
    let mut header = format!("HTTP/1.1 {} {}\r\n", response.status, reason);
    if let Some(length) = response.declared_length {
        header.push_str(&format!("Content-Length: {length}\r\n"));
    }
    header.push_str("Connection: close\r\n\r\n");

    stream.write_all(header.as_bytes()).await?;
    stream.write_all(&response.body).await?;
    stream.flush().await?;
    Ok(())
}
