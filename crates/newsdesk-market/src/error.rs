use newsdesk_core::ErrorKind;
use thiserror::Error;

/// Errors returned by the Alpha Vantage client.
#[derive(Debug, Error)]
pub enum MarketError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-2xx status.
    #[error("unexpected HTTP status {status} for {function}")]
    UnexpectedStatus { status: u16, function: String },

    /// Alpha Vantage answered 200 with a `Note` or `Information` envelope,
    /// which it uses for rate limits and premium-only endpoints.
    #[error("Alpha Vantage rate limit or plan restriction: {0}")]
    RateLimited(String),

    /// Alpha Vantage answered 200 with an `Error Message` envelope.
    #[error("Alpha Vantage API error: {0}")]
    ApiError(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl MarketError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(e) if e.is_timeout() => ErrorKind::Timeout,
            Self::Http(e) if e.is_decode() || e.is_body() => ErrorKind::MalformedResponse,
            Self::Http(e) => e
                .status()
                .map_or(ErrorKind::Transport, |s| ErrorKind::from_status(s.as_u16())),
            Self::UnexpectedStatus { status, .. } => ErrorKind::from_status(*status),
            Self::RateLimited(_) => ErrorKind::ProviderQuota,
            Self::ApiError(_) | Self::Deserialize { .. } => ErrorKind::MalformedResponse,
            Self::InvalidBaseUrl { .. } => ErrorKind::Unknown,
        }
    }
}
