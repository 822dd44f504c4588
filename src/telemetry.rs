//! Host-facing facade over one Gatherer and one Publisher.

use std::sync::Arc;

use crate::config::TelemetryConfig;
use crate::gatherer::{Capture, Gatherer, RaisedError, RequestView, ResponseView, Transformer};
use crate::publisher::{Publisher, Result, Transport};

/// The three request callbacks plus process teardown.
///
/// Cheap to clone; clones share the same worker.
#[derive(Debug, Clone)]
pub struct Telemetry {
    gatherer: Gatherer,
    publisher: Arc<Publisher>,
}

impl Telemetry {
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        Ok(Self::from_parts(Gatherer::new(config), Publisher::new(config)?))
    }

    /// Build with a custom collector transport.
    pub fn with_transport<T>(config: &TelemetryConfig, transport: T) -> Result<Self>
    where
        T: Transport + Send + 'static,
    {
        Ok(Self::from_parts(
            Gatherer::new(config),
            Publisher::with_transport(config, transport)?,
        ))
    }

    pub fn from_parts(gatherer: Gatherer, publisher: Publisher) -> Self {
        Self {
            gatherer,
            publisher: Arc::new(publisher),
        }
    }

    pub fn with_request_transformer(mut self, transformer: Transformer) -> Self {
        self.gatherer = self.gatherer.with_request_transformer(transformer);
        self
    }

    pub fn with_response_transformer(mut self, transformer: Transformer) -> Self {
        self.gatherer = self.gatherer.with_response_transformer(transformer);
        self
    }

    pub fn gatherer(&self) -> &Gatherer {
        &self.gatherer
    }

    pub fn is_disabled(&self) -> bool {
        self.gatherer.is_disabled()
    }

    pub fn on_request_start<R: RequestView + ?Sized>(&self, request: &R) -> Option<Capture> {
        self.gatherer.on_request_start(request)
    }

    pub fn on_request_end<V: ResponseView>(&self, capture: Option<&mut Capture>, response: V) -> V {
        self.gatherer.on_request_end(capture, response)
    }

    /// Finalize the capture and hand the payload to the publisher.
    pub fn on_request_teardown(&self, capture: Option<Capture>, error: Option<&RaisedError>) {
        if let Some(payload) = self.gatherer.finalize(capture, error) {
            self.publisher.send(payload);
        }
    }

    /// Stop the publisher. Safe to call more than once.
    pub fn teardown(&self) {
        self.publisher.teardown();
    }
}
