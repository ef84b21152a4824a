//! Dataset record types and their JSON contract.
//!
//! Field names are fixed by existing API consumers and must not change.
//! Stored items vary in shape; absent fields decode to zero values.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One scrape of the bike-share network at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetRecord {
    /// Scrape timestamp, expected to start with `yyyy-mm-dd`.
    #[serde(rename = "Time")]
    pub timestamp: String,
    /// Record identifier.
    #[serde(rename = "Id")]
    pub id: String,
    /// Station states at `timestamp`, in store order.
    #[serde(rename = "Stations")]
    pub stations: Vec<StationSnapshot>,
}

/// One station's state within a record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StationSnapshot {
    /// Free docking slots.
    pub empty_slots: i64,
    /// Bikes available for rent.
    pub free_bikes: i64,
    /// Station display name.
    pub name: String,
    /// Operational flags.
    pub extra: ExtraInfo,
    /// Station identifier.
    pub id: String,
}

/// Operational flags of a station (1 = enabled, 0 = disabled).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraInfo {
    /// Station accepts rentals.
    pub renting: i64,
    /// Station accepts returns.
    pub returning: i64,
}

impl StationSnapshot {
    /// Check if the station currently allows both renting and returning.
    pub fn is_operational(&self) -> bool {
        self.extra.renting != 0 && self.extra.returning != 0
    }
}

impl DatasetRecord {
    /// Date part of the timestamp, if it has one.
    pub fn date_prefix(&self) -> Option<&str> {
        self.timestamp.get(..10)
    }
}

/// Table metadata returned by the status route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStatusSummary {
    /// Table name.
    #[serde(rename = "table")]
    pub table_name: String,
    /// Approximate item count; `null` when the store does not report one.
    #[serde(rename = "recordCount")]
    pub record_count: Option<i64>,
}

/// Wall-clock heartbeat returned by the server route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerTimeResponse {
    /// Server local time.
    #[serde(rename = "SystemTime")]
    pub system_time: String,
}

impl ServerTimeResponse {
    /// Build a response for the current instant.
    pub fn now() -> Self {
        Self::at(Local::now())
    }

    /// Build a response for a given instant.
    pub fn at(instant: DateTime<Local>) -> Self {
        Self {
            system_time: instant.to_string(),
        }
    }
}
