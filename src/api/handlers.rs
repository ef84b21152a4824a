//! HTTP API handlers.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error};

use crate::config::Config;
use crate::dataset::{
    is_valid_search_date, DatasetRecord, ServerTimeResponse, TableStatusSummary,
    SEARCH_FORMAT_MESSAGE,
};
use crate::error::StoreError;
use crate::metrics;
use crate::store::{with_deadline, RecordStore, StoreOperation};
use crate::telemetry::AccessLogger;
use url::form_urlencoded;

/// Body of every 500 response.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Store client, built once at startup.
    pub store: Arc<dyn RecordStore>,
    /// Table holding the dataset.
    pub table_name: Arc<str>,
    /// Deadline applied to every store call.
    pub store_timeout: Duration,
    /// Access event emitter.
    pub access_log: AccessLogger,
}

impl AppState {
    /// Create new app state.
    pub fn new(store: Arc<dyn RecordStore>, access_log: AccessLogger, config: &Config) -> Self {
        Self {
            store,
            table_name: config.table_name.as_str().into(),
            store_timeout: config.store_timeout(),
            access_log,
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("table_name", &self.table_name)
            .field("store_timeout", &self.store_timeout)
            .field("access_log", &self.access_log)
            .finish_non_exhaustive()
    }
}

/// Handler failures.
#[derive(Debug)]
pub enum ApiError {
    /// Search date missing or malformed.
    InvalidSearchDate,
    /// Store call failed or timed out.
    Store(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidSearchDate => {
                (StatusCode::BAD_REQUEST, Json(SEARCH_FORMAT_MESSAGE)).into_response()
            }
            Self::Store(err) => {
                error!(error = %err, "Store request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(INTERNAL_ERROR_MESSAGE)).into_response()
            }
        }
    }
}

/// Query parameters of the search route.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SearchParams {
    /// Date to search for, `yyyy-mm-dd`.
    pub date: Option<String>,
}

impl SearchParams {
    /// Parse a raw query string. Only the first `date` pair counts.
    pub fn from_query(query: Option<&str>) -> Self {
        let date = query.and_then(|q| {
            form_urlencoded::parse(q.as_bytes())
                .find(|(key, _)| key == "date")
                .map(|(_, value)| value.into_owned())
        });
        Self { date }
    }
}

/// Server time handler - always returns 200.
pub async fn server_time() -> impl IntoResponse {
    Json(ServerTimeResponse::now())
}

/// Status handler - returns table name and approximate record count.
pub async fn table_status(
    State(state): State<AppState>,
) -> Result<Json<TableStatusSummary>, ApiError> {
    let summary = with_deadline(
        StoreOperation::DescribeTable,
        &state.table_name,
        state.store_timeout,
        state.store.describe_table(&state.table_name),
    )
    .await?;

    Ok(Json(summary))
}

/// All-records handler - returns every record in the table.
pub async fn all_records(
    State(state): State<AppState>,
) -> Result<Json<Vec<DatasetRecord>>, ApiError> {
    let records = with_deadline(
        StoreOperation::Scan,
        &state.table_name,
        state.store_timeout,
        state.store.scan_all(&state.table_name),
    )
    .await?;

    debug!(count = records.len(), "Returning all records");
    Ok(Json(records))
}

/// Search handler - returns records whose timestamp contains `date`.
///
/// Returns 400 without touching the store when `date` is missing or malformed.
/// The query string is parsed leniently so every rejection carries the JSON body.
pub async fn search(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<DatasetRecord>>, ApiError> {
    let date = SearchParams::from_query(query.as_deref())
        .date
        .unwrap_or_default();
    if !is_valid_search_date(&date) {
        debug!(date = %date, "Rejected search date");
        return Err(ApiError::InvalidSearchDate);
    }

    let records = with_deadline(
        StoreOperation::FilteredScan,
        &state.table_name,
        state.store_timeout,
        state.store.scan_filtered(&state.table_name, &date),
    )
    .await?;

    debug!(date = %date, count = records.len(), "Search complete");
    Ok(Json(records))
}

/// Metrics handler - renders the Prometheus exposition.
pub async fn metrics_export() -> Response {
    match metrics::prometheus_handle() {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}
