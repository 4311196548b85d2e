use std::sync::Arc;

use chrono::NaiveDate;
use sched_api::{ProvisionalBooking, SchedulingApi, SlotData};
use tracing::{debug, warn};

use crate::rate_limit::RateLimitedClient;
use crate::response_cache::ResponseCache;
use crate::scan_types::ScanError;

/// Creates provisional bookings to test whether a (center, date, services)
/// triple has open appointment capacity.
pub struct BookingProbe {
    api: Arc<dyn SchedulingApi>,
    limiter: Arc<RateLimitedClient>,
    cache: Arc<ResponseCache>,
}

impl BookingProbe {
    /// Create a probe over the given upstream API, limiter, and cache.
    pub fn new(
        api: Arc<dyn SchedulingApi>,
        limiter: Arc<RateLimitedClient>,
        cache: Arc<ResponseCache>,
    ) -> Self {
        Self {
            api,
            limiter,
            cache,
        }
    }

    /// Stable cache-key fragment for a service set, independent of the order
    /// the caller listed the services in. The request payload keeps the
    /// caller's order.
    fn service_key(service_ids: &[String]) -> String {
        let mut sorted: Vec<&str> = service_ids.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted.join("+")
    }

    /// Probe one (center, date, services) triple, returning the booking id.
    ///
    /// A cached probe within the TTL window returns the prior booking id
    /// without a second network call.
    pub async fn probe(
        &self,
        center_id: &str,
        date: NaiveDate,
        service_ids: &[String],
    ) -> Result<String, ScanError> {
        let cache_key = format!(
            "probe:{}:{}:{}",
            center_id,
            date.format("%Y-%m-%d"),
            Self::service_key(service_ids)
        );

        if let Some(cached) = self.cache.get(&cache_key).await {
            if let Ok(booking) = serde_json::from_value::<ProvisionalBooking>(cached) {
                debug!("Probe cache hit for center {} on {}", center_id, date);
                return Ok(booking.id);
            }
        }

        let booking = self
            .limiter
            .execute(|| self.api.create_provisional_booking(center_id, date, service_ids))
            .await?;

        match serde_json::to_value(&booking) {
            Ok(raw) => self.cache.set(&cache_key, raw).await,
            Err(e) => warn!(
                "Failed to cache booking for center {} on {}: {}",
                center_id, date, e
            ),
        }

        Ok(booking.id)
    }
}

/// Fetches slot and future-day-hint data for a booking.
pub struct SlotFetcher {
    api: Arc<dyn SchedulingApi>,
    limiter: Arc<RateLimitedClient>,
    cache: Arc<ResponseCache>,
}

impl SlotFetcher {
    /// Create a fetcher over the given upstream API, limiter, and cache.
    pub fn new(
        api: Arc<dyn SchedulingApi>,
        limiter: Arc<RateLimitedClient>,
        cache: Arc<ResponseCache>,
    ) -> Self {
        Self {
            api,
            limiter,
            cache,
        }
    }

    /// Fetch slots for a booking, optionally including future-day hints.
    ///
    /// Fetching with hints enabled is a distinct cacheable operation from
    /// fetching without, so the key carries the flag.
    pub async fn fetch_slots(
        &self,
        booking_id: &str,
        include_future_days: bool,
    ) -> Result<SlotData, ScanError> {
        let cache_key = format!("slots:{}:{}", booking_id, include_future_days);

        if let Some(cached) = self.cache.get(&cache_key).await {
            if let Ok(data) = serde_json::from_value::<SlotData>(cached) {
                debug!("Slot cache hit for booking {}", booking_id);
                return Ok(data);
            }
        }

        let data = self
            .limiter
            .execute(|| self.api.get_slots(booking_id, include_future_days))
            .await?;

        match serde_json::to_value(&data) {
            Ok(raw) => self.cache.set(&cache_key, raw).await,
            Err(e) => warn!("Failed to cache slots for booking {}: {}", booking_id, e),
        }

        Ok(data)
    }
}
