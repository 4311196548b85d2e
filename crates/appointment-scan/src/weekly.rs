use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Available dates grouped into one Sunday-start calendar week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekBucket {
    /// The Sunday starting this week
    pub week_start: NaiveDate,
    /// Presentation label: "Current Week" for the first chronological week,
    /// then "Week 2", "Week 3", ...
    pub label: String,
    /// Available dates within the week, ascending
    pub dates: Vec<NaiveDate>,
}

/// The Sunday on or before `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

/// Group dates into Sunday-start week buckets, ascending by week start.
pub fn index_by_week(dates: &[NaiveDate]) -> Vec<WeekBucket> {
    let mut weeks: BTreeMap<NaiveDate, Vec<NaiveDate>> = BTreeMap::new();

    for &date in dates {
        weeks.entry(week_start(date)).or_default().push(date);
    }

    weeks
        .into_iter()
        .enumerate()
        .map(|(index, (start, mut bucket_dates))| {
            bucket_dates.sort_unstable();
            bucket_dates.dedup();

            let label = if index == 0 {
                "Current Week".to_string()
            } else {
                format!("Week {}", index + 1)
            };

            WeekBucket {
                week_start: start,
                label,
                dates: bucket_dates,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_start_is_sunday() {
        // 2024-01-15 is a Monday
        assert_eq!(week_start(date(2024, 1, 15)), date(2024, 1, 14));
        // A Sunday maps to itself
        assert_eq!(week_start(date(2024, 1, 14)), date(2024, 1, 14));
        // Saturday belongs to the preceding Sunday
        assert_eq!(week_start(date(2024, 1, 20)), date(2024, 1, 14));
    }

    #[test]
    fn test_index_by_week_groups_and_labels() {
        let dates = vec![
            date(2024, 1, 24), // second week
            date(2024, 1, 16),
            date(2024, 1, 15),
            date(2024, 1, 31), // third week
        ];

        let buckets = index_by_week(&dates);
        assert_eq!(buckets.len(), 3);

        assert_eq!(buckets[0].week_start, date(2024, 1, 14));
        assert_eq!(buckets[0].label, "Current Week");
        assert_eq!(buckets[0].dates, vec![date(2024, 1, 15), date(2024, 1, 16)]);

        assert_eq!(buckets[1].week_start, date(2024, 1, 21));
        assert_eq!(buckets[1].label, "Week 2");
        assert_eq!(buckets[1].dates, vec![date(2024, 1, 24)]);

        assert_eq!(buckets[2].week_start, date(2024, 1, 28));
        assert_eq!(buckets[2].label, "Week 3");
    }

    #[test]
    fn test_index_by_week_empty() {
        assert!(index_by_week(&[]).is_empty());
    }
}
