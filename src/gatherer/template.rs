//! Static part of every payload.
//!
//! # Responsibilities
//! - Resolve host IP, timezone, OS and language facts once
//! - Stamp out a fresh, independent payload per request
//!
//! # Design Decisions
//! - The template is immutable after construction and shared behind `Arc`
//! - Per-request payloads are built by value; nothing mutable is shared

use std::net::UdpSocket;

use crate::gatherer::payload::{
    LanguageInfo, OsInfo, Payload, PayloadData, RequestRecord, ServerInfo, PAYLOAD_VERSION, SDK_NAME,
};

/// Credentials and environment facts resolved at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadTemplate {
    api_key: String,
    project_id: String,
    server: ServerInfo,
    language: LanguageInfo,
}

impl PayloadTemplate {
    /// Build a template, probing the running host.
    pub fn detect(api_key: impl Into<String>, project_id: impl Into<String>) -> Self {
        let server = ServerInfo {
            ip: host_ip(),
            timezone: chrono::Local::now().format("%Z").to_string(),
            os: OsInfo {
                name: std::env::consts::OS.to_string(),
                release: os_release(),
                architecture: std::env::consts::ARCH.to_string(),
            },
            ..ServerInfo::default()
        };

        let language = LanguageInfo {
            name: "rust".to_string(),
            version: option_env!("CARGO_PKG_RUST_VERSION")
                .unwrap_or_default()
                .to_string(),
        };

        Self::with_facts(api_key, project_id, server, language)
    }

    /// Build a template from known facts.
    pub fn with_facts(
        api_key: impl Into<String>,
        project_id: impl Into<String>,
        server: ServerInfo,
        language: LanguageInfo,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            project_id: project_id.into(),
            server,
            language,
        }
    }

    /// A new payload carrying only the static facts.
    pub fn instantiate(&self) -> Payload {
        Payload {
            api_key: self.api_key.clone(),
            project_id: self.project_id.clone(),
            sdk: SDK_NAME.to_string(),
            version: PAYLOAD_VERSION,
            data: PayloadData {
                server: self.server.clone(),
                language: self.language.clone(),
                request: RequestRecord::default(),
                response: None,
                errors: Vec::new(),
            },
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

/// IPv4 address of the interface used for outbound traffic, or "unknown".
///
/// Connecting a UDP socket only selects a route; nothing is sent.
fn host_ip() -> String {
    let probe = || -> std::io::Result<String> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect("192.0.2.1:9")?;
        Ok(socket.local_addr()?.ip().to_string())
    };
    probe().unwrap_or_else(|_| "unknown".to_string())
}

fn os_release() -> String {
    std::fs::read_to_string("/proc/sys/kernel/osrelease")
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}
