//! DynamoDB-backed record store.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::dataset::{DatasetRecord, TableStatusSummary};
use crate::error::StoreError;

use super::attribute::decode_records;
use super::{RecordStore, StoreOperation};

/// Attribute holding the record timestamp, the only filterable field.
const TIME_ATTRIBUTE: &str = "Time";

/// Record store backed by a shared DynamoDB client.
#[derive(Debug, Clone)]
pub struct DynamoStore {
    /// SDK client; cheap to clone and safe to share between requests.
    client: Client,
}

impl DynamoStore {
    /// Wrap an existing SDK client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from ambient AWS credentials and the configured region.
    pub async fn from_config(config: &Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()));
        if let Some(endpoint) = &config.dynamodb_endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        debug!(region = %config.aws_region, endpoint = ?config.dynamodb_endpoint, "DynamoDB client created");

        Self::new(Client::new(&sdk_config))
    }

    /// Page through a scan, optionally with a `contains(Time, needle)` filter.
    async fn scan_pages(
        &self,
        table: &str,
        needle: Option<&str>,
    ) -> Result<Vec<DatasetRecord>, StoreError> {
        let operation = if needle.is_some() {
            StoreOperation::FilteredScan
        } else {
            StoreOperation::Scan
        };

        let mut records = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;
        let mut pages = 0u32;

        loop {
            let mut request = self
                .client
                .scan()
                .table_name(table)
                .set_exclusive_start_key(start_key.take());

            if let Some(needle) = needle {
                request = request
                    .filter_expression("contains(#time, :needle)")
                    .expression_attribute_names("#time", TIME_ATTRIBUTE)
                    .expression_attribute_values(":needle", AttributeValue::S(needle.to_string()));
            }

            let page = request.send().await.map_err(|e| StoreError::Request {
                operation,
                table: table.to_string(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

            pages += 1;
            records.extend(decode_records(table, page.items())?);

            match page.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        debug!(pages, count = records.len(), "Scan complete");

        Ok(records)
    }
}

#[async_trait]
impl RecordStore for DynamoStore {
    #[instrument(skip(self))]
    async fn describe_table(&self, table: &str) -> Result<TableStatusSummary, StoreError> {
        let output = self
            .client
            .describe_table()
            .table_name(table)
            .send()
            .await
            .map_err(|e| StoreError::Request {
                operation: StoreOperation::DescribeTable,
                table: table.to_string(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        let record_count = output.table().and_then(|t| t.item_count());

        debug!(?record_count, "Table described");

        Ok(TableStatusSummary {
            table_name: table.to_string(),
            record_count,
        })
    }

    #[instrument(skip(self))]
    async fn scan_all(&self, table: &str) -> Result<Vec<DatasetRecord>, StoreError> {
        self.scan_pages(table, None).await
    }

    #[instrument(skip(self))]
    async fn scan_filtered(
        &self,
        table: &str,
        needle: &str,
    ) -> Result<Vec<DatasetRecord>, StoreError> {
        self.scan_pages(table, Some(needle)).await
    }
}
