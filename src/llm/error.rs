//! Oracle backend errors
//!
//! Transport-level failures surfaced by [`LLMClient`](super::LLMClient) implementations.
//! Callers in the audit pipeline never propagate these past their own phase: a failed
//! oracle call degrades into placeholder data instead.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors that can occur while talking to the reasoning oracle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BackendError {
    /// API request failed with the given message
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    /// Request timed out after the specified duration (in seconds)
    TimeoutError { seconds: u64 },

    /// Invalid or malformed response from the oracle
    InvalidResponse {
        message: String,
        raw_response: Option<String>,
    },

    /// Configuration error (missing API keys, invalid settings, etc.)
    ConfigurationError { message: String },

    /// Generic error for other cases
    Other { message: String },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::ApiError {
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "API error ({}): {}", code, message)
                } else {
                    write!(f, "API error: {}", message)
                }
            }
            BackendError::TimeoutError { seconds } => {
                write!(f, "Request timed out after {} seconds", seconds)
            }
            BackendError::InvalidResponse { message, .. } => {
                write!(f, "Invalid response from oracle: {}", message)
            }
            BackendError::ConfigurationError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            BackendError::Other { message } => {
                write!(f, "Error: {}", message)
            }
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_api_error_with_status() {
        let err = BackendError::ApiError {
            message: "rate limited".to_string(),
            status_code: Some(429),
        };
        assert_eq!(err.to_string(), "API error (429): rate limited");
    }

    #[test]
    fn test_display_timeout() {
        let err = BackendError::TimeoutError { seconds: 30 };
        assert_eq!(err.to_string(), "Request timed out after 30 seconds");
    }
}
