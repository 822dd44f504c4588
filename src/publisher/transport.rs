//! The network seam between the worker and a collector.

use std::cell::RefCell;
use std::future::Future;
use axum::http::header::CONTENT_TYPE;

use crate::publisher::types::{PublishError, Result};

/// Header carrying the project API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Delivers one encoded payload to one collector URL.
///
/// Futures run as local tasks on the worker's single-threaded runtime and
/// need not be `Send`.
pub trait Transport {
    /// POST `body` and return the response status.
    fn deliver(&self, url: &str, api_key: &str, body: Vec<u8>) -> impl Future<Output = Result<u16>>;

    /// Release connections. Called once when the worker stops.
    fn close(&self) {}
}

/// reqwest-backed transport with one pooled client.
///
/// Closing drops the client and its idle connections; later deliveries fail
/// with [`PublishError::Closed`].
#[derive(Debug)]
pub struct HttpTransport {
    client: RefCell<Option<reqwest::Client>>,
}

impl HttpTransport {
    /// Client honouring the system proxy settings.
    pub fn new() -> Result<Self> {
        Ok(Self::from_client(Self::builder().build()?))
    }

    /// Client that always connects to collectors directly.
    pub fn direct() -> Result<Self> {
        Ok(Self::from_client(Self::builder().no_proxy().build()?))
    }

    fn from_client(client: reqwest::Client) -> Self {
        Self {
            client: RefCell::new(Some(client)),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.client.borrow().is_none()
    }

    fn builder() -> reqwest::ClientBuilder {
        reqwest::Client::builder().user_agent(concat!("treblle-relay/", env!("CARGO_PKG_VERSION")))
    }
}

impl Transport for HttpTransport {
    async fn deliver(&self, url: &str, api_key: &str, body: Vec<u8>) -> Result<u16> {
        let client = self.client.borrow().clone().ok_or(PublishError::Closed)?;
        let response = client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, api_key)
            .body(body)
            .send()
            .await?;
        Ok(response.status().as_u16())
    }

    fn close(&self) {
        if self.client.borrow_mut().take().is_some() {
            tracing::debug!("HTTP transport closed");
        }
    }
}
