use std::collections::BTreeMap;

use sched_api::Slot;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// All available slots sharing one clock hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyBucket {
    /// Hour label in fixed "HH:00" form; lexicographic order is chronological
    pub hour: String,
    /// Number of available slots in this hour
    pub count: usize,
    /// The constituent slots
    pub slots: Vec<Slot>,
}

/// Extract the 0-23 hour from a slot time.
///
/// The time may be bare "HH:MM[:SS]" or a full date-time; when a date
/// separator is present, the hour comes from the time portion after it.
fn parse_hour(raw: &str) -> Option<u32> {
    let time_part = raw
        .split_once('T')
        .or_else(|| raw.split_once(' '))
        .map(|(_, time)| time)
        .unwrap_or(raw);

    let hour_field = time_part.split(':').next()?;
    let hour: u32 = hour_field.trim().parse().ok()?;
    (hour <= 23).then_some(hour)
}

/// Reduce 15-minute slots to hourly buckets, sorted ascending by hour label.
///
/// Unavailable slots are discarded; so is any slot whose time does not yield
/// an hour in 0-23. Malformed input never raises an error.
pub fn aggregate(slots: &[Slot]) -> Vec<HourlyBucket> {
    let mut buckets: BTreeMap<String, HourlyBucket> = BTreeMap::new();

    for slot in slots {
        if !slot.available {
            continue;
        }

        let Some(hour) = parse_hour(&slot.time) else {
            debug!("Dropping slot with unparseable time: {}", slot.time);
            continue;
        };

        let label = format!("{:02}:00", hour);
        let bucket = buckets.entry(label.clone()).or_insert_with(|| HourlyBucket {
            hour: label,
            count: 0,
            slots: Vec::new(),
        });
        bucket.count += 1;
        bucket.slots.push(slot.clone());
    }

    buckets.into_values().collect()
}

/// Merge per-center bucket lists into one list.
///
/// For each hour label present in any input, counts are summed and member
/// slots concatenated; the result is sorted ascending by label. Counts are
/// commutative and associative in the input order.
pub fn merge_across_centers(bucket_lists: &[Vec<HourlyBucket>]) -> Vec<HourlyBucket> {
    let mut merged: BTreeMap<String, HourlyBucket> = BTreeMap::new();

    for list in bucket_lists {
        for bucket in list {
            match merged.get_mut(&bucket.hour) {
                Some(existing) => {
                    existing.count += bucket.count;
                    existing.slots.extend(bucket.slots.iter().cloned());
                }
                None => {
                    merged.insert(bucket.hour.clone(), bucket.clone());
                }
            }
        }
    }

    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(time: &str, available: bool) -> Slot {
        Slot {
            time: time.to_string(),
            available,
        }
    }

    #[test]
    fn test_aggregate_buckets_by_hour() {
        let slots = vec![
            slot("09:00", true),
            slot("09:15", true),
            slot("09:30", false),
            slot("09:45", true),
        ];

        let buckets = aggregate(&slots);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].hour, "09:00");
        assert_eq!(buckets[0].count, 3);
        assert_eq!(buckets[0].slots.len(), 3);
    }

    #[test]
    fn test_aggregate_output_is_sorted() {
        let slots = vec![
            slot("14:00", true),
            slot("08:15", true),
            slot("11:30", true),
            slot("08:45", true),
        ];

        let buckets = aggregate(&slots);
        let labels: Vec<&str> = buckets.iter().map(|b| b.hour.as_str()).collect();
        assert_eq!(labels, vec!["08:00", "11:00", "14:00"]);
        assert_eq!(buckets[0].count, 2);
    }

    #[test]
    fn test_aggregate_parses_full_date_times() {
        let slots = vec![
            slot("2024-01-15T09:15:00", true),
            slot("2024-01-15 13:30:00", true),
        ];

        let buckets = aggregate(&slots);
        let labels: Vec<&str> = buckets.iter().map(|b| b.hour.as_str()).collect();
        assert_eq!(labels, vec!["09:00", "13:00"]);
    }

    #[test]
    fn test_aggregate_drops_malformed_slots_silently() {
        let slots = vec![
            slot("garbage", true),
            slot("27:00", true),
            slot("", true),
            slot("10:00", true),
        ];

        let buckets = aggregate(&slots);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].hour, "10:00");
        assert_eq!(buckets[0].count, 1);
    }

    #[test]
    fn test_aggregate_empty_input() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn test_merge_sums_counts_per_hour() {
        let a = aggregate(&[slot("09:00", true), slot("09:15", true), slot("10:00", true)]);
        let b = aggregate(&[slot("09:30", true), slot("11:00", true)]);

        let merged = merge_across_centers(&[a.clone(), b.clone()]);
        let at = |hour: &str| merged.iter().find(|bucket| bucket.hour == hour);

        assert_eq!(at("09:00").unwrap().count, 3);
        assert_eq!(at("10:00").unwrap().count, 1);
        assert_eq!(at("11:00").unwrap().count, 1);

        // Commutative in count
        let reversed = merge_across_centers(&[b, a]);
        for bucket in &merged {
            let other = reversed.iter().find(|r| r.hour == bucket.hour).unwrap();
            assert_eq!(other.count, bucket.count);
        }
    }

    #[test]
    fn test_merge_concatenates_member_slots() {
        let a = aggregate(&[slot("09:00", true)]);
        let b = aggregate(&[slot("09:15", true)]);

        let merged = merge_across_centers(&[a, b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].slots.len(), 2);
    }
}
