//! In-memory record store for unit and integration testing.
//!
//! Mirrors the store-side `contains` filter, records every call for
//! assertions, and can be told to fail or stall.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::dataset::{DatasetRecord, TableStatusSummary};
use crate::error::StoreError;

use super::{RecordStore, StoreOperation};

/// Record of a store call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `describe_table` was called.
    DescribeTable {
        /// Table that was described.
        table: String,
    },
    /// `scan_all` was called.
    ScanAll {
        /// Table that was scanned.
        table: String,
    },
    /// `scan_filtered` was called.
    ScanFiltered {
        /// Table that was scanned.
        table: String,
        /// Containment needle passed to the filter.
        needle: String,
    },
}

/// Configuration for mock store behavior.
#[derive(Debug, Clone, Default)]
pub struct MockStoreConfig {
    /// Fail every call as if the store were unreachable.
    pub unreachable: bool,
    /// Fail scans with a decode error.
    pub corrupt_items: bool,
    /// Report no item count from `describe_table`.
    pub hide_item_count: bool,
    /// Simulated latency per call.
    pub latency: Option<Duration>,
}

/// Mock record store for testing.
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    /// Mock configuration.
    config: MockStoreConfig,
    /// Records served by scans.
    records: Arc<Mutex<Vec<DatasetRecord>>>,
    /// Calls received so far.
    calls: Arc<Mutex<Vec<StoreCall>>>,
}

impl MockStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock store with custom configuration.
    pub fn with_config(config: MockStoreConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Create a mock store that fails every call.
    pub fn unreachable() -> Self {
        Self::with_config(MockStoreConfig {
            unreachable: true,
            ..MockStoreConfig::default()
        })
    }

    /// Add records in store order.
    pub fn insert(&self, records: impl IntoIterator<Item = DatasetRecord>) {
        self.records.lock().unwrap().extend(records);
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Clear all mock data and recorded calls.
    pub fn clear(&self) {
        self.records.lock().unwrap().clear();
        self.calls.lock().unwrap().clear();
    }

    async fn enter(
        &self,
        call: StoreCall,
        operation: StoreOperation,
        table: &str,
    ) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(call);

        if let Some(latency) = self.config.latency {
            tokio::time::sleep(latency).await;
        }

        if self.config.unreachable {
            return Err(StoreError::Request {
                operation,
                table: table.to_string(),
                reason: "dispatch failure: connection refused".to_string(),
            });
        }

        Ok(())
    }

    fn check_items(&self, table: &str) -> Result<(), StoreError> {
        if self.config.corrupt_items {
            return Err(StoreError::Decode {
                table: table.to_string(),
                reason: "Stations: invalid type: string, expected a sequence".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MockStore {
    async fn describe_table(&self, table: &str) -> Result<TableStatusSummary, StoreError> {
        self.enter(
            StoreCall::DescribeTable {
                table: table.to_string(),
            },
            StoreOperation::DescribeTable,
            table,
        )
        .await?;

        let count = self.records.lock().unwrap().len() as i64;
        Ok(TableStatusSummary {
            table_name: table.to_string(),
            record_count: (!self.config.hide_item_count).then_some(count),
        })
    }

    async fn scan_all(&self, table: &str) -> Result<Vec<DatasetRecord>, StoreError> {
        self.enter(
            StoreCall::ScanAll {
                table: table.to_string(),
            },
            StoreOperation::Scan,
            table,
        )
        .await?;
        self.check_items(table)?;

        Ok(self.records.lock().unwrap().clone())
    }

    async fn scan_filtered(
        &self,
        table: &str,
        needle: &str,
    ) -> Result<Vec<DatasetRecord>, StoreError> {
        self.enter(
            StoreCall::ScanFiltered {
                table: table.to_string(),
                needle: needle.to_string(),
            },
            StoreOperation::FilteredScan,
            table,
        )
        .await?;
        self.check_items(table)?;

        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.timestamp.contains(needle))
            .cloned()
            .collect())
    }
}
