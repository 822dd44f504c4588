//! Background delivery worker.
//!
//! # Responsibilities
//! - Own one OS thread running a single-threaded tokio runtime
//! - Accept payloads without ever blocking the caller
//! - Run each delivery attempt as a local task with a fixed timeout
//!
//! # Design Decisions
//! - Commands travel over an unbounded channel; `send` only enqueues
//! - No retry and no failover; failed attempts are logged at debug and dropped
//! - Teardown abandons in-flight attempts and joins the thread

use std::rc::Rc;
use std::sync::Mutex;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::LocalSet;
use tracing::{debug, error};

use crate::config::TelemetryConfig;
use crate::gatherer::Payload;
use crate::publisher::hosts::HostRotation;
use crate::publisher::transport::{HttpTransport, Transport};
use crate::publisher::types::{PublishError, Result};

#[derive(Debug)]
enum Command {
    Deliver(Payload),
    Close,
}

/// Ships finished payloads to the collectors.
#[derive(Debug)]
pub struct Publisher {
    tx: mpsc::UnboundedSender<Command>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Publisher {
    /// Start a publisher backed by the HTTP transport.
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        Self::with_transport(config, HttpTransport::new()?)
    }

    /// Start a publisher over a custom transport.
    pub fn with_transport<T>(config: &TelemetryConfig, transport: T) -> Result<Self>
    where
        T: Transport + Send + 'static,
    {
        if config.collector_hosts.is_empty() {
            return Err(PublishError::NoCollectorHosts);
        }

        let rotation = HostRotation::new(config.collector_hosts.clone());
        let timeout = Duration::from_millis(config.timeout_ms);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (tx, rx) = mpsc::unbounded_channel();

        let handle = std::thread::Builder::new()
            .name("treblle-publisher".to_string())
            .spawn(move || {
                let local = LocalSet::new();
                local.block_on(&runtime, run(rx, transport, rotation, timeout));
                // Abandon unfinished attempts while the runtime is still alive.
                let _enter = runtime.enter();
                drop(local);
            })?;

        debug!(
            hosts = config.collector_hosts.len(),
            timeout_ms = config.timeout_ms,
            "Publisher worker started"
        );

        Ok(Self {
            tx,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Queue a payload for delivery. Never blocks.
    pub fn send(&self, payload: Payload) {
        if self.tx.send(Command::Deliver(payload)).is_err() {
            debug!("Publisher is torn down, dropping payload");
        }
    }

    /// Stop the worker and wait for its thread to exit. Idempotent.
    pub fn teardown(&self) {
        let handle = match self.worker.lock() {
            Ok(mut worker) => worker.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(handle) = handle else {
            return;
        };

        let _ = self.tx.send(Command::Close);
        if handle.join().is_err() {
            error!("Publisher worker panicked");
        } else {
            debug!("Publisher worker stopped");
        }
    }

    pub fn is_torn_down(&self) -> bool {
        match self.worker.lock() {
            Ok(worker) => worker.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn run<T: Transport + 'static>(
    mut rx: mpsc::UnboundedReceiver<Command>,
    transport: T,
    mut rotation: HostRotation,
    timeout: Duration,
) {
    let transport = Rc::new(transport);

    while let Some(command) = rx.recv().await {
        let payload = match command {
            Command::Deliver(payload) => payload,
            Command::Close => break,
        };

        let Some(url) = rotation.next_host().map(str::to_string) else {
            debug!("No collector host available, dropping payload");
            continue;
        };

        let body = match serde_json::to_vec(&payload) {
            Ok(body) => body,
            Err(e) => {
                debug!(error = %PublishError::from(e), "Dropping payload");
                continue;
            }
        };

        let transport = transport.clone();
        let api_key = payload.api_key;
        tokio::task::spawn_local(async move {
            let outcome = tokio::time::timeout(timeout, transport.deliver(&url, &api_key, body))
                .await
                .unwrap_or(Err(PublishError::Timeout(timeout)))
                .and_then(|status| match status {
                    200..=299 => Ok(status),
                    _ => Err(PublishError::Status(status)),
                });

            match outcome {
                Ok(status) => debug!(url = %url, status, "Payload delivered"),
                Err(e) => debug!(url = %url, error = %e, "Payload delivery failed"),
            }
        });
    }

    transport.close();
}
