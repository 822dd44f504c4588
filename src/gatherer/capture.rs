//! The Gatherer: builds one payload per request across its lifecycle.

use std::collections::HashSet;
use std::sync::{Arc, Once};
use std::time::Instant;
use axum::http::{header, HeaderMap};
use serde_json::{Map, Value};

use crate::config::TelemetryConfig;
use crate::gatherer::errors::RaisedError;
use crate::gatherer::payload::{empty_body, ErrorEntry, Payload, RequestRecord, ResponseRecord};
use crate::gatherer::template::PayloadTemplate;
use crate::gatherer::transform::Transformer;
use crate::gatherer::view::{RequestView, ResponseBody, ResponseView};
use crate::security::{mask_auth_header, mask_owned};

static MISSING_CREDENTIALS: Once = Once::new();

/// Per-request state between request start and teardown.
#[derive(Debug)]
pub struct Capture {
    payload: Payload,
    started: Instant,
}

impl Capture {
    /// The payload as captured so far.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Drop the captured request body, for bodies that could not be read.
    pub fn discard_request_body(&mut self) {
        self.payload.data.request.body = None;
    }
}

/// Builds, populates and finalizes payloads.
#[derive(Debug, Clone)]
pub struct Gatherer {
    /// `None` when credentials are missing.
    template: Option<Arc<PayloadTemplate>>,
    hidden_keys: HashSet<String>,
    /// `hidden_keys` lowercased, matched against header names.
    hidden_headers: HashSet<String>,
    mask_auth_header: bool,
    limit_request_body_size: u64,
    request_transformer: Option<Transformer>,
    response_transformer: Option<Transformer>,
}

impl Gatherer {
    /// Create a gatherer, probing the host for the static payload facts.
    pub fn new(config: &TelemetryConfig) -> Self {
        let template = match (&config.api_key, &config.project_id) {
            (Some(key), Some(project)) if config.has_credentials() => {
                Some(PayloadTemplate::detect(key.as_str(), project.as_str()))
            }
            _ => None,
        };
        Self::with_template(config, template)
    }

    /// Create a gatherer around an existing template (`None` disables capture).
    pub fn with_template(config: &TelemetryConfig, template: Option<PayloadTemplate>) -> Self {
        if template.is_none() {
            MISSING_CREDENTIALS.call_once(|| {
                tracing::error!(
                    "Treblle API key and project ID are required, telemetry capture is disabled"
                );
            });
        }

        Self {
            template: template.map(Arc::new),
            hidden_keys: config.hidden_keys.clone(),
            hidden_headers: config.hidden_keys.iter().map(|k| k.to_ascii_lowercase()).collect(),
            mask_auth_header: config.mask_auth_header,
            limit_request_body_size: config.limit_request_body_size,
            request_transformer: None,
            response_transformer: None,
        }
    }

    pub fn with_request_transformer(mut self, transformer: Transformer) -> Self {
        self.request_transformer = Some(transformer);
        self
    }

    pub fn with_response_transformer(mut self, transformer: Transformer) -> Self {
        self.response_transformer = Some(transformer);
        self
    }

    pub fn is_disabled(&self) -> bool {
        self.template.is_none()
    }

    /// Whether a request body of the declared length would be captured.
    ///
    /// Without a declared length the body is captured regardless of size.
    /// This is best-effort, not a memory bound.
    pub fn captures_body(&self, content_length: Option<u64>) -> bool {
        !self.is_disabled() && content_length.unwrap_or(0) < self.limit_request_body_size
    }

    /// Start capturing a request. Returns `None` when disabled.
    pub fn on_request_start<R: RequestView + ?Sized>(&self, request: &R) -> Option<Capture> {
        let template = self.template.as_ref()?;
        let mut payload = template.instantiate();

        let software = request.server_software().unwrap_or_default();
        let (software, signature) = split_software(software);
        let server = &mut payload.data.server;
        server.software = software.to_string();
        server.signature = signature.to_string();
        server.protocol = request.protocol().to_string();

        let mut headers = mask_owned(headers_to_json(request.headers()), &self.hidden_headers);
        if self.mask_auth_header {
            if let Some(Value::String(auth)) = headers.get_mut(header::AUTHORIZATION.as_str()) {
                *auth = mask_auth_header(auth);
            }
        }

        payload.data.request = RequestRecord {
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            method: request.method().to_string(),
            url: request.url(),
            user_agent: request.user_agent().to_string(),
            headers: into_object(headers),
            ip: client_ip(request),
            body: None,
        };

        if self.captures_body(request.content_length()) {
            let body = self.read_body(
                request.body(),
                self.request_transformer.as_ref(),
                "request",
                &mut payload.data.errors,
            );
            payload.data.request.body = Some(body);
        }

        Some(Capture {
            payload,
            started: Instant::now(),
        })
    }

    /// Record the response on the capture and hand the response back.
    pub fn on_request_end<V: ResponseView>(&self, capture: Option<&mut Capture>, response: V) -> V {
        let Some(capture) = capture else {
            return response;
        };
        if self.is_disabled() {
            return response;
        }

        let mut record = ResponseRecord {
            code: response.status(),
            headers: into_object(mask_owned(headers_to_json(response.headers()), &self.hidden_headers)),
            body: empty_body(),
            size: 0,
            load_time: capture.started.elapsed().as_secs_f64(),
        };

        match response.body() {
            ResponseBody::Streaming => {}
            ResponseBody::Buffered(bytes) => {
                record.body = self.read_body(
                    bytes,
                    self.response_transformer.as_ref(),
                    "response",
                    &mut capture.payload.data.errors,
                );
                record.size = bytes.len() as u64;
            }
        }

        capture.payload.data.response = Some(record);
        response
    }

    /// Close the capture, recording `error` if the request failed.
    pub fn finalize(&self, capture: Option<Capture>, error: Option<&RaisedError>) -> Option<Payload> {
        if self.is_disabled() {
            return None;
        }
        let mut capture = capture?;

        if let Some(error) = error {
            capture.payload.data.errors.push(error.to_entry());
        }

        Some(capture.payload)
    }

    /// Transform or parse a body, then mask it.
    fn read_body(
        &self,
        bytes: &[u8],
        transformer: Option<&Transformer>,
        side: &'static str,
        errors: &mut Vec<ErrorEntry>,
    ) -> Value {
        let body = match transformer {
            Some(transformer) => match transformer.apply(bytes) {
                Ok(value) => value,
                Err(entry) => {
                    tracing::error!(
                        side,
                        kind = %entry.kind,
                        error = %entry.message,
                        "Error in {} transformer",
                        side
                    );
                    errors.push(entry);
                    empty_body()
                }
            },
            None => serde_json::from_str(&String::from_utf8_lossy(bytes)).unwrap_or_else(|_| empty_body()),
        };
        mask_owned(body, &self.hidden_keys)
    }
}

/// `"name/version"` splits into name and signature; anything else has no signature.
fn split_software(software: &str) -> (&str, &str) {
    match software.split_once('/') {
        Some((name, signature)) if !signature.contains('/') => (name, signature),
        _ => (software, ""),
    }
}

/// First `X-Forwarded-For` entry, else the socket address.
fn client_ip<R: RequestView + ?Sized>(request: &R) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    match forwarded {
        Some(ip) => ip.to_string(),
        None => request.remote_addr().unwrap_or_default(),
    }
}

/// Headers as a JSON object; repeated headers are joined with ", ".
fn headers_to_json(headers: &HeaderMap) -> Value {
    let mut object = Map::with_capacity(headers.keys_len());
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        object.insert(name.as_str().to_string(), Value::String(joined));
    }
    Value::Object(object)
}

fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
