//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during a completion request
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    #[error("Completion timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Gateway error {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl CompletionError {
    /// Short machine-readable reason
    pub fn reason(&self) -> &'static str {
        match self {
            CompletionError::Timeout(_) => "timeout",
            CompletionError::Transport(_) => "transport",
            CompletionError::HttpStatus { .. } => "http_status",
            CompletionError::MalformedResponse(_) => "malformed_response",
        }
    }

    /// Check if this is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, CompletionError::Timeout(_))
    }

    /// Check if the gateway answered 429
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, CompletionError::HttpStatus { status: 429, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasons() {
        assert_eq!(CompletionError::Timeout(Duration::from_secs(30)).reason(), "timeout");
        assert_eq!(CompletionError::Transport("reset".into()).reason(), "transport");
        assert_eq!(CompletionError::MalformedResponse("no choices".into()).reason(), "malformed_response");
    }

    #[test]
    fn test_is_rate_limit() {
        let err = CompletionError::HttpStatus {
            status: 429,
            message: "slow down".to_string(),
        };
        assert!(err.is_rate_limit());
        assert!(!err.is_timeout());

        let err = CompletionError::HttpStatus {
            status: 500,
            message: "Server error".to_string(),
        };
        assert!(!err.is_rate_limit());
    }

    #[test]
    fn test_is_timeout() {
        assert!(CompletionError::Timeout(Duration::from_secs(30)).is_timeout());
        assert!(!CompletionError::Transport("refused".into()).is_timeout());
    }
}
