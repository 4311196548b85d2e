use std::time::Duration;

use crate::scan_types::ScanError;

/// Runtime configuration for the discovery engine.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Base URL of the scheduling API
    pub api_base_url: String,

    /// API key for the scheduling API
    pub api_key: String,

    /// Width of the shared concurrency semaphore (default: 8)
    pub concurrency: usize,

    /// Time-to-live for cached upstream responses (default: 5 minutes)
    pub cache_ttl: Duration,

    /// Maximum date offset from today within which probing is permitted
    /// (default: 28 days, inclusive)
    pub horizon_days: i64,
}

impl ScanConfig {
    /// Load configuration from the environment.
    ///
    /// `SCHED_API_BASE_URL` and `SCHED_API_KEY` are required; missing values
    /// fail here, before any network activity. `SCAN_CONCURRENCY` optionally
    /// overrides the semaphore width.
    pub fn from_env() -> Result<Self, ScanError> {
        let api_base_url = std::env::var("SCHED_API_BASE_URL")
            .map_err(|_| ScanError::Config("SCHED_API_BASE_URL is not set".to_string()))?;

        let api_key = std::env::var("SCHED_API_KEY")
            .map_err(|_| ScanError::Config("SCHED_API_KEY is not set".to_string()))?;

        let concurrency = match std::env::var("SCAN_CONCURRENCY") {
            Ok(raw) => raw.parse::<usize>().map_err(|_| {
                ScanError::Config(format!("Invalid SCAN_CONCURRENCY value: {}", raw))
            })?,
            Err(_) => Self::DEFAULT_CONCURRENCY,
        };

        Ok(Self {
            api_base_url,
            api_key,
            concurrency,
            cache_ttl: Self::DEFAULT_CACHE_TTL,
            horizon_days: Self::DEFAULT_HORIZON_DAYS,
        })
    }

    /// Default width of the shared concurrency semaphore.
    pub const DEFAULT_CONCURRENCY: usize = 8;

    /// Default cache time-to-live.
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

    /// Default probing horizon in days.
    pub const DEFAULT_HORIZON_DAYS: i64 = 28;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(ScanConfig::DEFAULT_CONCURRENCY, 8);
        assert_eq!(ScanConfig::DEFAULT_CACHE_TTL, Duration::from_secs(300));
        assert_eq!(ScanConfig::DEFAULT_HORIZON_DAYS, 28);
    }
}
