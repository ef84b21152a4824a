//! Dataset module for the bike-share station snapshots.
//!
//! This module handles:
//! - Record types and their JSON contract
//! - Validation of the search date parameter

pub mod types;
pub mod validation;

pub use types::{DatasetRecord, ExtraInfo, ServerTimeResponse, StationSnapshot, TableStatusSummary};
pub use validation::{is_valid_search_date, SEARCH_FORMAT_MESSAGE};
