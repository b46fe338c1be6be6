use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Coarse classification shared by every external-call wrapper.
///
/// `ProviderQuota` covers auth and billing rejections as well as rate
/// limits: all of them need an operator to act, unlike transient transport
/// failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    Timeout,
    MalformedResponse,
    ProviderQuota,
    Unknown,
}

impl ErrorKind {
    /// Classify an HTTP status that was not a success.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 402 | 403 | 429 => Self::ProviderQuota,
            408 | 504 => Self::Timeout,
            _ => Self::Transport,
        }
    }

    /// Whether the operator has to intervene (keys, billing, limits).
    #[must_use]
    pub fn is_operator_actionable(self) -> bool {
        matches!(self, Self::ProviderQuota)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Transport => "transport",
            Self::Timeout => "timeout",
            Self::MalformedResponse => "malformed_response",
            Self::ProviderQuota => "provider_quota",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}
