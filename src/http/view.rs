//! Capture views over axum request and response parts.

use std::net::SocketAddr;
use axum::extract::ConnectInfo;
use axum::http::{header, request, response, HeaderMap, Version};

use crate::gatherer::{RequestView, ResponseBody, ResponseView};

/// Reported as the serving software on every payload.
pub const SERVER_SOFTWARE: &str = "axum/0.8";

/// An axum request whose body has already been buffered (or skipped).
#[derive(Debug, Clone, Copy)]
pub struct AxumRequest<'a> {
    parts: &'a request::Parts,
    body: &'a [u8],
}

impl<'a> AxumRequest<'a> {
    pub fn new(parts: &'a request::Parts, body: &'a [u8]) -> Self {
        Self { parts, body }
    }

    fn header(&self, name: &str) -> Option<&'a str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl RequestView for AxumRequest<'_> {
    fn method(&self) -> &str {
        self.parts.method.as_str()
    }

    fn url(&self) -> String {
        let uri = &self.parts.uri;
        let scheme = self
            .header("x-forwarded-proto")
            .or(uri.scheme_str())
            .unwrap_or("http");
        let host = uri
            .authority()
            .map(|a| a.as_str())
            .or_else(|| self.header(header::HOST.as_str()))
            .unwrap_or("localhost");
        let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
        format!("{scheme}://{host}{path}")
    }

    fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    fn body(&self) -> &[u8] {
        self.body
    }

    fn remote_addr(&self) -> Option<String> {
        self.parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    }

    fn server_software(&self) -> Option<&str> {
        Some(SERVER_SOFTWARE)
    }

    fn protocol(&self) -> &str {
        protocol(self.parts.version)
    }
}

/// An axum response; `body` is `None` for streaming bodies.
#[derive(Debug, Clone, Copy)]
pub struct AxumResponse<'a> {
    parts: &'a response::Parts,
    body: Option<&'a [u8]>,
}

impl<'a> AxumResponse<'a> {
    pub fn buffered(parts: &'a response::Parts, body: &'a [u8]) -> Self {
        Self {
            parts,
            body: Some(body),
        }
    }

    pub fn streaming(parts: &'a response::Parts) -> Self {
        Self { parts, body: None }
    }
}

impl ResponseView for AxumResponse<'_> {
    fn status(&self) -> u16 {
        self.parts.status.as_u16()
    }

    fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    fn body(&self) -> ResponseBody<'_> {
        match self.body {
            Some(bytes) => ResponseBody::Buffered(bytes),
            None => ResponseBody::Streaming,
        }
    }
}

fn protocol(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
}
