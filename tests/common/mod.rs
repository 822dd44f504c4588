//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use treblle_relay::publisher::HttpTransport;
use treblle_relay::{Publisher, Telemetry, TelemetryConfig};

/// One request received by the mock collector.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Collected {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Value,
}

/// A raw-TCP collector that records every POST it receives.
#[derive(Debug, Clone)]
pub struct MockCollector {
    pub url: String,
    received: Arc<Mutex<Vec<Collected>>>,
}

#[allow(dead_code)]
impl MockCollector {
    pub fn received(&self) -> Vec<Collected> {
        self.received.lock().unwrap().clone()
    }

    /// Wait until at least `n` requests arrived, or give up after 5 seconds.
    pub async fn wait_for(&self, n: usize) -> Vec<Collected> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while self.received.lock().unwrap().len() < n && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.received()
    }
}

/// Start a mock collector answering every request with `status`.
pub async fn start_mock_collector(status: u16) -> MockCollector {
    start_collector(status, None).await
}

/// Start a mock collector that records requests but answers after `delay`.
#[allow(dead_code)]
pub async fn start_slow_collector(delay: Duration) -> MockCollector {
    start_collector(200, Some(delay)).await
}

async fn start_collector(status: u16, delay: Option<Duration>) -> MockCollector {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let received = Arc::new(Mutex::new(Vec::new()));

    let store = received.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let store = store.clone();
                    tokio::spawn(async move {
                        handle_connection(socket, status, delay, store).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockCollector {
        url: format!("http://{}", addr),
        received,
    }
}

async fn handle_connection(
    mut socket: TcpStream,
    status: u16,
    delay: Option<Duration>,
    store: Arc<Mutex<Vec<Collected>>>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split(' ');
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    let length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    while buf.len() < header_end + length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let body = serde_json::from_slice(&buf[header_end..header_end + length]).unwrap_or(Value::Null);
    store.lock().unwrap().push(Collected {
        method,
        path,
        headers,
        body,
    });

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let status_text = match status {
        200 => "200 OK",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        status_text
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Telemetry config pointed at the given collectors.
pub fn telemetry_config(collectors: &[&MockCollector]) -> TelemetryConfig {
    let mut config = TelemetryConfig::new("test-key", "test-project");
    config.collector_hosts = collectors.iter().map(|c| c.url.clone()).collect();
    config
}

/// Publisher delivering straight to the mock collectors.
#[allow(dead_code)]
pub fn publisher(config: &TelemetryConfig) -> Publisher {
    Publisher::with_transport(config, HttpTransport::direct().unwrap()).unwrap()
}

/// Telemetry delivering straight to the mock collectors.
#[allow(dead_code)]
pub fn telemetry(config: &TelemetryConfig) -> Telemetry {
    Telemetry::with_transport(config, HttpTransport::direct().unwrap()).unwrap()
}
