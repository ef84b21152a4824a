//! Destinations for access events.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::SinkError;

use super::AccessEvent;

/// Remote destination for access events.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Deliver one event.
    async fn send(&self, event: &AccessEvent) -> Result<(), SinkError>;
}

/// Loggly HTTP/S event endpoint.
#[derive(Debug, Clone)]
pub struct LogglySink {
    /// HTTP client for event posts.
    http: reqwest::Client,
    /// Fully built `inputs/<token>/tag/<tag>/` endpoint.
    endpoint: Url,
}

impl LogglySink {
    /// Create a sink posting to `<base>/inputs/<token>/tag/<tag>/`.
    pub fn new(base_url: &str, token: &str, tag: &str) -> Result<Self, SinkError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(2))
            .build()?;

        Ok(Self {
            http,
            endpoint: Self::endpoint(base_url, token, tag)?,
        })
    }

    /// Build the event endpoint URL.
    pub fn endpoint(base_url: &str, token: &str, tag: &str) -> Result<Url, SinkError> {
        // Relative join keeps any path on the base, so it must end in '/'
        let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?;
        Ok(base.join(&format!("inputs/{token}/tag/{tag}/"))?)
    }

    /// Get the event endpoint.
    pub fn url(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl LogSink for LogglySink {
    async fn send(&self, event: &AccessEvent) -> Result<(), SinkError> {
        let body = json!({
            "level": "info",
            "message": event.message(),
            "method": event.method,
            "remote_addr": event.remote_addr_str(),
            "path": event.path,
            "status": event.status,
            "timestamp": event.timestamp.to_rfc3339(),
        });

        let response = self.http.post(self.endpoint.clone()).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(SinkError::Rejected {
                status: response.status().as_u16(),
            });
        }

        debug!(status = %response.status(), "Access event forwarded");
        Ok(())
    }
}

/// Sink that keeps events in memory, for testing.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<AccessEvent>>>,
    fail: bool,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink that rejects every event.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Events received so far.
    pub fn events(&self) -> Vec<AccessEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogSink for MemorySink {
    async fn send(&self, event: &AccessEvent) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::Rejected { status: 503 });
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}
