use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Identifier returned when a provisional booking is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionalBooking {
    /// Upstream booking identifier
    pub id: String,
}

/// One 15-minute appointment slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    /// Slot time as reported upstream, either "HH:MM[:SS]" or a full date-time
    pub time: String,
    /// Whether the slot is open for booking
    pub available: bool,
}

/// A date the upstream reports as independently bookable at the same center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureDay {
    /// The hinted calendar date
    pub day: NaiveDate,
    /// Whether the upstream marks the date as available
    pub is_available: bool,
}

/// Slots and future-day hints fetched for one booking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotData {
    /// 15-minute slots for the probed date
    pub slots: Vec<Slot>,
    /// Hinted dates, used only to grow the discovery frontier
    pub future_days: Vec<FutureDay>,
}

// Wire shapes. The upstream is inconsistent about field names, so serde
// aliases absorb the variants here and nothing downstream ever sees them.

#[derive(Debug, Deserialize)]
pub(crate) struct WireBookingResponse {
    #[serde(alias = "bookingId", alias = "appointmentId")]
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireSlotsResponse {
    #[serde(default)]
    pub slots: Vec<WireSlot>,
    #[serde(default, alias = "futureDays")]
    pub future_days: Vec<WireFutureDay>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireSlot {
    #[serde(default, alias = "startTime", alias = "slotTime", alias = "start_time")]
    pub time: Option<String>,
    #[serde(default, alias = "isAvailable", alias = "open")]
    pub available: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireFutureDay {
    #[serde(alias = "date", alias = "futureDate")]
    pub day: String,
    #[serde(default, alias = "isAvailable", alias = "available")]
    pub is_available: bool,
}

impl WireSlotsResponse {
    /// Normalize the wire response into the canonical internal shape,
    /// dropping slots without a time field and hints without a parseable date.
    pub(crate) fn normalize(self) -> SlotData {
        let slots = self
            .slots
            .into_iter()
            .filter_map(|slot| {
                let time = slot.time?;
                Some(Slot {
                    time,
                    available: slot.available,
                })
            })
            .collect();

        let future_days = self
            .future_days
            .into_iter()
            .filter_map(|hint| {
                // Day may arrive as "2024-01-15" or "2024-01-15T00:00:00Z"
                let prefix = hint.day.get(..10).unwrap_or(&hint.day);
                match NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
                    Ok(day) => Some(FutureDay {
                        day,
                        is_available: hint.is_available,
                    }),
                    Err(_) => {
                        warn!("Failed to parse future day: {}", hint.day);
                        None
                    }
                }
            })
            .collect();

        SlotData { slots, future_days }
    }
}
