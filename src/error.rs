//! Unified error types for the gateway.

use std::time::Duration;

use thiserror::Error;

use crate::store::StoreOperation;

/// Unified error type for the gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Data store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Log sink error.
    #[error("log sink error: {0}")]
    Sink(#[from] SinkError),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the data access adapter.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A store request failed (connectivity, credentials, throttling, missing table).
    #[error("{operation} on table {table} failed: {reason}")]
    Request {
        /// Operation that failed.
        operation: StoreOperation,
        /// Table that was queried.
        table: String,
        /// Reason reported by the store client.
        reason: String,
    },

    /// An item returned by the store does not match the record shape.
    #[error("failed to decode item from table {table}: {reason}")]
    Decode {
        /// Table the item came from.
        table: String,
        /// Reason for failure.
        reason: String,
    },

    /// The per-request deadline elapsed before the store answered.
    #[error("{operation} on table {table} timed out after {elapsed:?}")]
    Timeout {
        /// Operation that timed out.
        operation: StoreOperation,
        /// Table that was queried.
        table: String,
        /// Deadline that elapsed.
        elapsed: Duration,
    },
}

/// Errors raised while forwarding access events to a remote sink.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The sink URL could not be built.
    #[error("invalid sink url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP request failed.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The sink answered with a non-success status.
    #[error("sink rejected event: HTTP {status}")]
    Rejected {
        /// Status returned by the sink.
        status: u16,
    },
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, GatewayError>;
