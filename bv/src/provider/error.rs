//! Provider error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when calling the company-data provider
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Rate limited by provider{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    #[error("Provider returned HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Malformed provider response: {0}")]
    Decode(String),
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(", wait {}s before retrying", d.as_secs()),
        None => ", wait before retrying".to_string(),
    }
}

impl FetchError {
    /// Short machine-readable reason
    pub fn reason(&self) -> &'static str {
        match self {
            FetchError::RateLimited { .. } => "rate_limited",
            FetchError::HttpStatus { .. } => "http_status",
            FetchError::Transport(_) => "transport",
            FetchError::Decode(_) => "decode",
        }
    }

    /// Check if this is a rate limit error
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. })
    }

    /// Provider-suggested wait, if this is a rate limit error that carried one
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            FetchError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}
