//! Typed errors for provider adapters.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can branch
//! on the failure class: only `RateLimited`, `Transient`, and `Timeout` are
//! worth retrying.

use thiserror::Error;

/// Errors surfaced by provider adapters.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider rejected the request as malformed; retrying is pointless.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The provider throttled us.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Network or 5xx-class failure that may succeed on retry.
    #[error("transient provider failure: {0}")]
    Transient(String),

    /// The call exceeded its deadline.
    #[error("provider call timed out: {0}")]
    Timeout(String),

    /// The provider answered but the payload could not be understood.
    #[error("unparseable provider response: {0}")]
    InvalidResponse(String),

    /// Adapter-level configuration problem (missing key, unknown model).
    #[error("provider configuration error: {0}")]
    Config(String),

    /// Underlying HTTP failure.
    #[error("http error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ProviderError {
    /// Whether the retry wrapper should attempt this call again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited(_)
                | ProviderError::Transient(_)
                | ProviderError::Timeout(_)
                | ProviderError::Http(_)
        )
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(err.to_string())
        } else if err.is_status() {
            let status = err.status().map(|s| s.as_u16()).unwrap_or(0);
            match status {
                429 => ProviderError::RateLimited(err.to_string()),
                400..=499 => ProviderError::BadRequest(err.to_string()),
                _ => ProviderError::Transient(err.to_string()),
            }
        } else {
            ProviderError::Http(Box::new(err))
        }
    }
}

/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(ProviderError::RateLimited("429".into()).is_retryable());
        assert!(ProviderError::Transient("502".into()).is_retryable());
        assert!(ProviderError::Timeout("deadline".into()).is_retryable());
        assert!(!ProviderError::BadRequest("bad json".into()).is_retryable());
        assert!(!ProviderError::Config("no key".into()).is_retryable());
        assert!(!ProviderError::InvalidResponse("garbage".into()).is_retryable());
    }
}
