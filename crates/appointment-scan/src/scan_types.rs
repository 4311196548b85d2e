use std::collections::BTreeMap;
use std::time::Instant;

use chrono::NaiveDate;
use sched_api::ApiError;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::aggregator::HourlyBucket;
use crate::weekly::WeekBucket;

/// A service center to include in a discovery run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CenterRef {
    /// Center identifier in the scheduling system
    pub id: String,
    /// Ordering priority; lower values are preferred
    pub priority: i32,
}

/// Request structure for one discovery run.
#[derive(Debug, Deserialize, Validate)]
pub struct DiscoverRequest {
    /// Centers to probe
    #[validate(length(min = 1, message = "At least one center is required"))]
    pub centers: Vec<CenterRef>,

    /// Services the appointment must cover
    #[validate(length(min = 1, message = "At least one service is required"))]
    pub services: Vec<String>,

    /// Number of weeks to probe, starting from today
    #[validate(range(min = 1, max = 4, message = "Weeks must be between 1 and 4"))]
    pub weeks: u32,
}

/// One step in the chain of probes that led to a discovered date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvenanceLink {
    /// Date of the originating probe
    pub date: NaiveDate,
    /// Booking id whose future-day hints surfaced this date
    pub booking_id: String,
}

/// Availability discovered for one center on one date.
#[derive(Debug, Clone, Serialize)]
pub struct CenterDateAvailability {
    /// Center identifier
    pub id: String,
    /// The date this availability is for
    pub date: NaiveDate,
    /// Provisional booking used to read the slots
    pub booking_id: String,
    /// Ordering priority carried from the request
    pub priority: i32,
    /// Total available slots across all hours
    pub count: usize,
    /// Available slots grouped by hour, ascending
    pub hourly_buckets: Vec<HourlyBucket>,
    /// How this (center, date) pair was discovered; empty for requested dates
    pub provenance: Vec<ProvenanceLink>,
}

/// Per-date summary across all centers.
#[derive(Debug, Clone, Serialize)]
pub struct DateAvailability {
    /// Whether any center has at least one available slot on this date
    pub has_slots: bool,
    /// Sum of available slots across all centers
    pub total_available_slots: usize,
    /// Per-center availability, ascending by priority (stable on ties)
    pub locations: Vec<CenterDateAvailability>,
}

/// A probe or fetch failure recorded for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct PairError {
    /// Center whose probe failed
    pub center_id: String,
    /// Date that was being probed
    pub date: NaiveDate,
    /// Upstream error message
    pub message: String,
}

/// Result of one discovery run.
#[derive(Debug, Serialize)]
pub struct DiscoveryResult {
    /// Per-date availability summaries, keyed by date
    pub date_availability: BTreeMap<NaiveDate, DateAvailability>,
    /// Dates with at least one available slot, ascending
    pub available_dates: Vec<NaiveDate>,
    /// Available dates grouped into calendar weeks
    pub weekly_availability: Vec<WeekBucket>,
    /// Per-pair failures; absorbed into the run, never fatal
    pub errors: Vec<PairError>,
    /// Wall-clock duration of the run in milliseconds
    pub processing_time_ms: u64,
}

impl DiscoveryResult {
    /// An empty success, used when no probe candidate survives the horizon
    /// filter or no probe finds availability.
    pub(crate) fn empty(started: Instant) -> Self {
        Self {
            date_availability: BTreeMap::new(),
            available_dates: Vec::new(),
            weekly_availability: Vec::new(),
            errors: Vec::new(),
            processing_time_ms: started.elapsed().as_millis() as u64,
        }
    }
}

/// Custom error type for discovery operations.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Missing or invalid configuration, detected before any network call
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid request input, detected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Rate-limit retries exhausted for one upstream call
    #[error("Rate limit retries exhausted")]
    RateLimitExceeded,

    /// Non-retryable upstream failure
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl From<ApiError> for ScanError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::RateLimited { .. } => ScanError::RateLimitExceeded,
            other => ScanError::Upstream(other.to_string()),
        }
    }
}
