//! Error types for the gateway

use crate::core::provider::ProviderError;
use crate::core::rate_limit::RateLimitDecision;
use thiserror::Error;

/// Result type alias for the gateway
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication errors, message goes to the client verbatim
    #[error("{0}")]
    Auth(String),

    /// Upstream provider errors
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A generation quota horizon is exhausted
    #[error("Rate limit exceeded")]
    QuotaExhausted { decision: RateLimitDecision },

    /// Request validation failures, message goes to the client verbatim
    #[error("{0}")]
    Validation(String),

    /// Malformed request bodies, message goes to the client verbatim
    #[error("{0}")]
    BadRequest(String),

    /// Unprocessable input, message goes to the client verbatim
    #[error("{0}")]
    InvalidInput(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// Network errors
    #[error("Network error: {0}")]
    Network(String),
}
