//! # Appointment Scan
//!
//! This crate implements the availability-discovery engine: it probes an
//! external scheduling system with provisional bookings, follows future-date
//! hints to find open dates beyond the requested ones, aggregates 15-minute
//! slots into hourly buckets, and merges per-center results into a single
//! calendar view.

/// Hourly slot aggregation and cross-center merging
mod aggregator;
pub use aggregator::*;

/// Runtime configuration loaded from the environment
mod config;
pub use config::*;

/// Frontier-based discovery orchestration
mod discovery;
pub use discovery::*;

/// Availability probing and slot fetching
mod probe;
pub use probe::*;

/// Semaphore-bounded upstream call execution with rate-limit retry
mod rate_limit;
pub use rate_limit::*;

/// Process-wide TTL cache for upstream responses
mod response_cache;
pub use response_cache::*;

/// Request, result, and error types for discovery runs
mod scan_types;
pub use scan_types::*;

/// Calendar-week grouping of discovered dates
mod weekly;
pub use weekly::*;
