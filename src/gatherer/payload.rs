//! Payload shipped to the collector.
//!
//! The serialized form is the collector's wire format, so field names
//! here are part of the protocol.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// SDK identifier reported with every payload.
pub const SDK_NAME: &str = "rust";

/// Payload format version understood by the collector.
pub const PAYLOAD_VERSION: f64 = 0.6;

/// `source` value of every error entry.
pub const ERROR_SOURCE: &str = "onError";

/// Telemetry for one request/response cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub api_key: String,
    pub project_id: String,
    pub sdk: String,
    pub version: f64,
    pub data: PayloadData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadData {
    pub server: ServerInfo,
    pub language: LanguageInfo,
    pub request: RequestRecord,

    /// Absent until the response completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseRecord>,

    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
}

/// Facts about the serving host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub ip: String,
    pub timezone: String,
    pub software: String,
    pub signature: String,
    pub protocol: String,
    pub os: OsInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OsInfo {
    pub name: String,
    pub release: String,
    pub architecture: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub name: String,
    pub version: String,
}

/// Inbound request as captured at request start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// Local time, `%Y-%m-%d %H:%M:%S`.
    pub timestamp: String,
    pub method: String,
    pub url: String,
    pub user_agent: String,
    pub headers: Map<String, Value>,
    pub ip: String,

    /// Omitted when the declared body size exceeded the capture limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// Outbound response as captured at response end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub code: u16,
    pub headers: Map<String, Value>,
    pub body: Value,
    /// Raw body length in bytes; 0 for streamed bodies.
    pub size: u64,
    /// Seconds between request start and response end.
    pub load_time: f64,
}

/// One failure recorded on a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub source: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub file: String,
    pub line: u32,
}

impl ErrorEntry {
    pub fn new(
        kind: impl Into<String>,
        message: impl Into<String>,
        file: impl Into<String>,
        line: u32,
    ) -> Self {
        Self {
            source: ERROR_SOURCE.to_string(),
            kind: kind.into(),
            message: message.into(),
            file: file.into(),
            line,
        }
    }
}

/// The `{}` used whenever a body could not be captured.
pub fn empty_body() -> Value {
    Value::Object(Map::new())
}
