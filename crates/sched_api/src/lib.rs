//! # Sched API
//!
//! This crate provides a typed client for the external appointment-scheduling
//! system: creating provisional bookings and fetching slot data with
//! future-day availability hints.

/// Client trait and HTTP implementation for the scheduling API
mod client;
pub use client::*;

/// Error taxonomy for scheduling API calls
mod error;
pub use error::*;

/// Canonical types and wire-format normalization
mod types;
pub use types::*;
