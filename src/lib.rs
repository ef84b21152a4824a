//! Read-only HTTP gateway for the citybikes station dataset.
//!
//! The dataset lives in a DynamoDB table where each item is one scrape of the
//! bike-share network: a timestamp, an id and the state of every station.
//! The gateway exposes four routes under a common prefix:
//!
//! ```text
//! GET /akc/server               -> {"SystemTime": "..."}
//! GET /akc/status               -> {"table": "...", "recordCount": 123}
//! GET /akc/all                  -> [record, ...]
//! GET /akc/search?date=yyyy-mm-dd -> [record, ...] | 400
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`dataset`]: Record types and search validation
//! - [`store`]: Store access (DynamoDB and mock)
//! - [`telemetry`]: Access events and their delivery
//! - [`api`]: HTTP handlers, middleware and routes
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod store;
pub mod telemetry;
pub mod utils;

pub use config::Config;
pub use error::{GatewayError, Result};
