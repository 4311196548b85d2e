/// Errors raised by scheduling API calls.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// Rate limited by the scheduling API; the upstream may specify how many
    /// seconds to wait before retrying.
    #[error("Rate limited by scheduling API")]
    RateLimited {
        /// Explicit retry delay in seconds, if the upstream sent one.
        retry_after: Option<u64>,
    },

    /// Authentication failed with the scheduling API
    #[error("Authentication failed with scheduling API")]
    AuthenticationFailed,

    /// Requested resource does not exist upstream
    #[error("Resource not found")]
    NotFound,

    /// Non-retryable API failure
    #[error("API error: {0}")]
    Api(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Response could not be parsed
    #[error("Data format error: {0}")]
    DataFormat(String),
}
