//! Upstream provider error taxonomy

use thiserror::Error;

/// Errors from the upstream provider or the transport beneath it.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Upstream rejected the credential
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Upstream rejected the request payload
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Upstream throttled the gateway's own account
    #[error("Rate limited by provider: {message}")]
    RateLimited { message: String },

    /// The wall clock budget for the call elapsed
    #[error("Provider request timed out: {message}")]
    Timeout { message: String },

    /// Any other upstream HTTP error, status preserved
    #[error("Provider returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure
    #[error("Network error: {message}")]
    Network { message: String },

    /// Upstream responded but the payload did not parse
    #[error("Failed to parse provider response: {message}")]
    ResponseParsing { message: String },

    /// A generation completed without any image output
    #[error("No images generated")]
    MissingOutput,
}

impl ProviderError {
    /// Classify an upstream HTTP status together with its body text.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => Self::Authentication { message },
            422 => Self::InvalidInput { message },
            429 => Self::RateLimited { message },
            _ => Self::Api { status, message },
        }
    }

    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    pub fn parsing<S: Into<String>>(message: S) -> Self {
        Self::ResponseParsing {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                message: err.to_string(),
            }
        } else {
            Self::Network {
                message: err.to_string(),
            }
        }
    }
}
