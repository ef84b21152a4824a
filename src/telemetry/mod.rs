//! Per-request access events and their delivery.
//!
//! Events are handed to a bounded queue with `try_send`; a single worker
//! drains the queue, echoes each event through `tracing` and forwards it to
//! the optional remote sink. A full queue drops the event instead of making
//! the request wait.

pub mod sink;

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::metrics;

pub use sink::{LogSink, LogglySink, MemorySink};

/// One completed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessEvent {
    /// HTTP method.
    pub method: String,
    /// Caller socket address, when the listener provides one.
    pub remote_addr: Option<SocketAddr>,
    /// Request path and query.
    pub path: String,
    /// Final status code.
    pub status: u16,
    /// Service tag.
    pub tag: String,
    /// When the response was produced.
    pub timestamp: DateTime<Utc>,
}

impl AccessEvent {
    /// Create an event stamped with the current time.
    pub fn new(
        method: impl Into<String>,
        remote_addr: Option<SocketAddr>,
        path: impl Into<String>,
        status: u16,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            remote_addr,
            path: path.into(),
            status,
            tag: tag.into(),
            timestamp: Utc::now(),
        }
    }

    /// Caller address as text, `unknown` when absent.
    pub fn remote_addr_str(&self) -> String {
        self.remote_addr
            .map_or_else(|| "unknown".to_string(), |addr| addr.to_string())
    }

    /// Single-line summary of the event.
    pub fn message(&self) -> String {
        format!(
            "Method type: {} | Source IP address: {} | Request Path: {} | Status Code: {}",
            self.method,
            self.remote_addr_str(),
            self.path,
            self.status
        )
    }
}

/// Handle used by request tasks to emit access events.
#[derive(Debug, Clone)]
pub struct AccessLogger {
    tx: mpsc::Sender<AccessEvent>,
    tag: Arc<str>,
}

impl AccessLogger {
    /// Start the delivery worker and return the emitting handle.
    ///
    /// The worker exits once every `AccessLogger` clone has been dropped and
    /// the queue is drained.
    pub fn spawn(
        tag: impl Into<Arc<str>>,
        capacity: usize,
        sink: Option<Arc<dyn LogSink>>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(rx, sink));
        (
            Self {
                tx,
                tag: tag.into(),
            },
            worker,
        )
    }

    /// Service tag applied to events.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Queue an event without waiting. Returns `false` if it was dropped.
    pub fn record(
        &self,
        method: &str,
        remote_addr: Option<SocketAddr>,
        path: &str,
        status: u16,
    ) -> bool {
        let event = AccessEvent::new(method, remote_addr, path, status, &*self.tag);
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                metrics::inc_access_events_dropped();
                debug!(path = %event.path, "Access log queue full, event dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                metrics::inc_access_events_dropped();
                false
            }
        }
    }
}

async fn run_worker(mut rx: mpsc::Receiver<AccessEvent>, sink: Option<Arc<dyn LogSink>>) {
    while let Some(event) = rx.recv().await {
        info!(
            target: "access",
            tag = %event.tag,
            method = %event.method,
            remote_addr = %event.remote_addr_str(),
            path = %event.path,
            status = event.status,
            "{}",
            event.message()
        );

        if let Some(sink) = &sink {
            if let Err(e) = sink.send(&event).await {
                warn!(error = %e, path = %event.path, "Failed to forward access event");
            }
        }
    }

    debug!("Access log worker stopped");
}
