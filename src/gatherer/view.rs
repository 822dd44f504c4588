//! Read-only accessors the host supplies for requests and responses.
//!
//! Hosts implement [`RequestView`] and [`ResponseView`] over their own
//! request/response types. [`OwnedRequest`] and [`OwnedResponse`] are plain
//! implementations for hosts that already have the pieces at hand.

use axum::http::{header, HeaderMap};

/// Request accessors used at request start.
pub trait RequestView {
    fn method(&self) -> &str;

    /// Full URL including scheme, host and query.
    fn url(&self) -> String;

    fn headers(&self) -> &HeaderMap;

    /// Raw body bytes. Only read when the body is going to be captured.
    fn body(&self) -> &[u8];

    /// Socket-reported peer address.
    fn remote_addr(&self) -> Option<String>;

    /// Serving software, e.g. `"hyper/1.5"`.
    fn server_software(&self) -> Option<&str> {
        None
    }

    /// Protocol string, e.g. `"HTTP/1.1"`.
    fn protocol(&self) -> &str;

    fn user_agent(&self) -> &str {
        self.headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    /// Declared body length, if the client sent one.
    fn content_length(&self) -> Option<u64> {
        declared_length(self.headers())
    }
}

/// Response body as seen at response end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseBody<'a> {
    /// Fully materialized body.
    Buffered(&'a [u8]),
    /// Body produced incrementally; must not be consumed.
    Streaming,
}

/// Response accessors used at response end.
pub trait ResponseView {
    fn status(&self) -> u16;

    fn headers(&self) -> &HeaderMap;

    fn body(&self) -> ResponseBody<'_>;

    fn content_length(&self) -> Option<u64> {
        declared_length(self.headers())
    }
}

impl<T: RequestView + ?Sized> RequestView for &T {
    fn method(&self) -> &str {
        (**self).method()
    }
    fn url(&self) -> String {
        (**self).url()
    }
    fn headers(&self) -> &HeaderMap {
        (**self).headers()
    }
    fn body(&self) -> &[u8] {
        (**self).body()
    }
    fn remote_addr(&self) -> Option<String> {
        (**self).remote_addr()
    }
    fn server_software(&self) -> Option<&str> {
        (**self).server_software()
    }
    fn protocol(&self) -> &str {
        (**self).protocol()
    }
    fn user_agent(&self) -> &str {
        (**self).user_agent()
    }
    fn content_length(&self) -> Option<u64> {
        (**self).content_length()
    }
}

impl<T: ResponseView + ?Sized> ResponseView for &T {
    fn status(&self) -> u16 {
        (**self).status()
    }
    fn headers(&self) -> &HeaderMap {
        (**self).headers()
    }
    fn body(&self) -> ResponseBody<'_> {
        (**self).body()
    }
    fn content_length(&self) -> Option<u64> {
        (**self).content_length()
    }
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// A request whose parts are already owned by the host.
#[derive(Debug, Clone, Default)]
pub struct OwnedRequest {
    pub method: String,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub remote_addr: Option<String>,
    pub server_software: Option<String>,
    pub protocol: String,
}

impl OwnedRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            protocol: "HTTP/1.1".to_string(),
            ..Self::default()
        }
    }

    /// Set a header, ignoring names or values that are not valid HTTP.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            header::HeaderName::from_bytes(name.as_bytes()),
            header::HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Set the body and a matching `Content-Length`.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self.headers.insert(header::CONTENT_LENGTH, self.body.len().into());
        self
    }

    /// Set the body without declaring its length (chunked upload).
    pub fn undeclared_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self.headers.remove(header::CONTENT_LENGTH);
        self
    }

    pub fn remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    pub fn server_software(mut self, software: impl Into<String>) -> Self {
        self.server_software = Some(software.into());
        self
    }
}

impl RequestView for OwnedRequest {
    fn method(&self) -> &str {
        &self.method
    }
    fn url(&self) -> String {
        self.url.clone()
    }
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }
    fn body(&self) -> &[u8] {
        &self.body
    }
    fn remote_addr(&self) -> Option<String> {
        self.remote_addr.clone()
    }
    fn server_software(&self) -> Option<&str> {
        self.server_software.as_deref()
    }
    fn protocol(&self) -> &str {
        &self.protocol
    }
}

/// A response whose parts are already owned by the host.
///
/// `body == None` marks a streaming response.
#[derive(Debug, Clone, Default)]
pub struct OwnedResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl OwnedResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Some(body.into()),
        }
    }

    pub fn streaming(status: u16) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            header::HeaderName::from_bytes(name.as_bytes()),
            header::HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }
}

impl ResponseView for OwnedResponse {
    fn status(&self) -> u16 {
        self.status
    }
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }
    fn body(&self) -> ResponseBody<'_> {
        match &self.body {
            Some(bytes) => ResponseBody::Buffered(bytes),
            None => ResponseBody::Streaming,
        }
    }
}
