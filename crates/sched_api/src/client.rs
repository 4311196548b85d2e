use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Response, StatusCode, header};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::types::{ProvisionalBooking, SlotData, WireBookingResponse, WireSlotsResponse};

/// Fallible operations exposed by the external scheduling system.
#[async_trait]
pub trait SchedulingApi: Send + Sync {
    /// Create a provisional booking for a (center, date, services) triple.
    async fn create_provisional_booking(
        &self,
        center_id: &str,
        date: NaiveDate,
        service_ids: &[String],
    ) -> Result<ProvisionalBooking, ApiError>;

    /// Fetch slot data for a booking, optionally including future-day hints.
    async fn get_slots(
        &self,
        booking_id: &str,
        include_future_days: bool,
    ) -> Result<SlotData, ApiError>;
}

/// HTTP client for the scheduling API.
pub struct SchedClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SchedClient {
    /// Create a new scheduling API client.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ApiError::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Map a non-success status to the error taxonomy.
    async fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok());
                Err(ApiError::RateLimited { retry_after })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::AuthenticationFailed),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound),
            _ => {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read response body".to_string());
                warn!("API request failed with status {}: {}", status, body);
                Err(ApiError::Api(format!("HTTP {} - {}", status, body)))
            }
        }
    }
}

#[async_trait]
impl SchedulingApi for SchedClient {
    async fn create_provisional_booking(
        &self,
        center_id: &str,
        date: NaiveDate,
        service_ids: &[String],
    ) -> Result<ProvisionalBooking, ApiError> {
        debug!(
            "Creating provisional booking for center {} on {}",
            center_id, date
        );

        let url = format!("{}/appointments/provisional", self.base_url);

        // Service ids keep the caller's order in the payload
        let payload = json!({
            "centerId": center_id,
            "date": date.format("%Y-%m-%d").to_string(),
            "serviceIds": service_ids,
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("HTTP request failed: {}", e)))?;

        let response = Self::check_status(response).await?;

        let booking: WireBookingResponse = response
            .json()
            .await
            .map_err(|e| ApiError::DataFormat(format!("Failed to parse booking response: {}", e)))?;

        Ok(ProvisionalBooking { id: booking.id })
    }

    async fn get_slots(
        &self,
        booking_id: &str,
        include_future_days: bool,
    ) -> Result<SlotData, ApiError> {
        debug!(
            "Fetching slots for booking {} (future days: {})",
            booking_id, include_future_days
        );

        let url = format!("{}/appointments/{}/slots", self.base_url, booking_id);

        let params = [(
            "futureDays",
            if include_future_days { "true" } else { "false" },
        )];

        let response = self
            .client
            .get(&url)
            .query(&params)
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("HTTP request failed: {}", e)))?;

        let response = Self::check_status(response).await?;

        let wire: WireSlotsResponse = response
            .json()
            .await
            .map_err(|e| ApiError::DataFormat(format!("Failed to parse slot response: {}", e)))?;

        Ok(wire.normalize())
    }
}
