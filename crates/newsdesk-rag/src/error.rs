use std::time::Duration;

use newsdesk_core::ErrorKind;
use newsdesk_market::MarketError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} rejected the request (quota or credentials): {message}")]
    Quota {
        service: &'static str,
        message: String,
    },

    #[error("{service} call timed out after {millis}ms")]
    Timeout { service: &'static str, millis: u64 },

    #[error("malformed response from {service}: {reason}")]
    Malformed {
        service: &'static str,
        reason: String,
    },

    #[error("invalid batch: {0}")]
    InvalidBatch(String),

    #[error("missing setting: {0}")]
    MissingSetting(&'static str),

    #[error("store persistence error: {0}")]
    Io(#[from] std::io::Error),

    #[error("market data error: {0}")]
    Market(#[from] MarketError),
}

impl RagError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(e) if e.is_timeout() => ErrorKind::Timeout,
            Self::Http(e) if e.is_decode() || e.is_body() => ErrorKind::MalformedResponse,
            Self::Http(e) => e
                .status()
                .map_or(ErrorKind::Transport, |s| ErrorKind::from_status(s.as_u16())),
            Self::Status { status, .. } => ErrorKind::from_status(*status),
            Self::Quota { .. } => ErrorKind::ProviderQuota,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Malformed { .. } => ErrorKind::MalformedResponse,
            Self::Market(e) => e.kind(),
            Self::InvalidBatch(_) | Self::MissingSetting(_) | Self::Io(_) => ErrorKind::Unknown,
        }
    }

    pub(crate) fn timeout(service: &'static str, limit: Duration) -> Self {
        Self::Timeout {
            service,
            millis: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// A classified, human-readable failure attached to a degraded result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

impl Failure {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&RagError> for Failure {
    fn from(err: &RagError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_kind_and_message() {
        let err = RagError::timeout("openai chat", Duration::from_millis(250));
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(err.to_string(), "openai chat call timed out after 250ms");
    }

    #[test]
    fn quota_is_operator_actionable() {
        let err = RagError::Quota {
            service: "openai chat",
            message: "insufficient_quota".into(),
        };
        assert!(err.kind().is_operator_actionable());
    }

    #[test]
    fn status_is_classified_by_code() {
        let err = RagError::Status {
            service: "qdrant",
            status: 502,
            body: String::new(),
        };
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn failure_display_includes_kind() {
        let failure = Failure::new(ErrorKind::MalformedResponse, "missing support_prob");
        assert_eq!(
            failure.to_string(),
            "[malformed_response] missing support_prob"
        );
    }
}
