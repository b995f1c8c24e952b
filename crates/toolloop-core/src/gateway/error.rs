//! Model gateway error types

use thiserror::Error;

/// Errors raised by a model gateway
///
/// Any of these ends the current loop run. Turning them into user guidance
/// ("is the backend running?") is up to the caller.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// No model is available to serve the request
    #[error("No model available: {0}")]
    NoModel(String),

    /// Missing API key
    #[error("API key is required for {provider}")]
    MissingApiKey { provider: String },

    /// API request failed
    #[error("{provider} API error ({status}): {message}")]
    ApiError {
        provider: String,
        status: u16,
        message: String,
    },

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request was cancelled
    #[error("Request cancelled")]
    Cancelled,

    /// Stream ended unexpectedly
    #[error("Stream ended unexpectedly")]
    StreamEnded,

    /// Invalid response from provider
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    /// Rate limited
    #[error("{provider} rate limited: {message}")]
    RateLimited { provider: String, message: String },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl GatewayError {
    /// Create an API error
    pub fn api_error(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a missing API key error
    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a rate limited error
    pub fn rate_limited(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether retrying the same request later may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::RateLimited { .. } | GatewayError::StreamEnded => true,
            GatewayError::ApiError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Whether the message looks like the model host could not be reached
    pub fn is_connection_error(&self) -> bool {
        let text = self.to_string().to_lowercase();
        ["connection refused", "econnrefused", "connect error", "timed out", "dns error"]
            .iter()
            .any(|needle| text.contains(needle))
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GatewayError::api_error("openai", 503, "overloaded");
        assert_eq!(err.to_string(), "openai API error (503): overloaded");
        assert!(err.is_retryable());

        let err = GatewayError::missing_api_key("anthropic");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_connection_error_detection() {
        let err = GatewayError::Other("tcp connect error: Connection refused (os error 111)".into());
        assert!(err.is_connection_error());
        assert!(!GatewayError::NoModel("none selected".into()).is_connection_error());
    }
}
