//! Data access for the station dataset.
//!
//! This module handles:
//! - The `RecordStore` seam used by the HTTP handlers
//! - DynamoDB-backed implementation
//! - Attribute-map decoding into dataset records
//! - Per-call deadlines
//! - Mock store for testing

pub mod attribute;
pub mod dynamo;
pub mod mock;

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use strum::{Display, EnumString, IntoStaticStr};

use crate::dataset::{DatasetRecord, TableStatusSummary};
use crate::error::StoreError;
use crate::metrics;

pub use dynamo::DynamoStore;
pub use mock::{MockStore, MockStoreConfig, StoreCall};

/// Logical operations issued against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum StoreOperation {
    /// Table metadata lookup.
    DescribeTable,
    /// Unfiltered scan of every item.
    Scan,
    /// Scan with a store-side filter expression.
    FilteredScan,
}

/// Read-only access to a table of dataset records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the table name and approximate item count.
    async fn describe_table(&self, table: &str) -> Result<TableStatusSummary, StoreError>;

    /// Fetch every record, following pages until the table is exhausted.
    async fn scan_all(&self, table: &str) -> Result<Vec<DatasetRecord>, StoreError>;

    /// Fetch records whose `Time` attribute contains `needle`, filtered by the store.
    async fn scan_filtered(
        &self,
        table: &str,
        needle: &str,
    ) -> Result<Vec<DatasetRecord>, StoreError>;
}

/// Run a store call under a deadline.
///
/// The call future is dropped when the deadline elapses, which cancels any
/// request still in flight. Latency and failures are recorded per operation.
pub async fn with_deadline<T, F>(
    operation: StoreOperation,
    table: &str,
    deadline: Duration,
    call: F,
) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    let start = Instant::now();
    let result = match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout {
            operation,
            table: table.to_string(),
            elapsed: deadline,
        }),
    };

    metrics::record_store_latency(start, operation);
    if result.is_err() {
        metrics::inc_store_failures(operation);
    }

    result
}
