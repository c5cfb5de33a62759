//! HTTP response handling for errors

use super::types::GatewayError;
use crate::core::provider::ProviderError;
use crate::core::rate_limit::{RateLimitDecision, format_reset_hint};
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

impl ResponseError for GatewayError {
    fn error_response(&self) -> HttpResponse {
        // Quota denials keep the response shape clients already parse.
        if let GatewayError::QuotaExhausted { decision } = self {
            return quota_response(decision);
        }

        let (status_code, error_code, message) = match self {
            GatewayError::Config(_) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                self.to_string(),
            ),
            GatewayError::Auth(_) => (
                actix_web::http::StatusCode::UNAUTHORIZED,
                "AUTH_ERROR",
                self.to_string(),
            ),
            GatewayError::Provider(provider_error) => match provider_error {
                ProviderError::Authentication { .. } => (
                    actix_web::http::StatusCode::UNAUTHORIZED,
                    "PROVIDER_AUTH_ERROR",
                    provider_error.to_string(),
                ),
                ProviderError::InvalidInput { .. } => (
                    actix_web::http::StatusCode::UNPROCESSABLE_ENTITY,
                    "PROVIDER_INVALID_INPUT",
                    provider_error.to_string(),
                ),
                ProviderError::RateLimited { .. } => (
                    actix_web::http::StatusCode::TOO_MANY_REQUESTS,
                    "PROVIDER_RATE_LIMIT",
                    provider_error.to_string(),
                ),
                ProviderError::Timeout { .. } => (
                    actix_web::http::StatusCode::GATEWAY_TIMEOUT,
                    "PROVIDER_TIMEOUT",
                    provider_error.to_string(),
                ),
                _ => (
                    actix_web::http::StatusCode::BAD_GATEWAY,
                    "PROVIDER_ERROR",
                    provider_error.to_string(),
                ),
            },
            GatewayError::Validation(_) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                self.to_string(),
            ),
            GatewayError::BadRequest(_) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                self.to_string(),
            ),
            GatewayError::InvalidInput(_) => (
                actix_web::http::StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_INPUT",
                self.to_string(),
            ),
            GatewayError::Network(_) => (
                actix_web::http::StatusCode::BAD_GATEWAY,
                "NETWORK_ERROR",
                self.to_string(),
            ),
            _ => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: error_code.to_string(),
                message,
                timestamp: chrono::Utc::now().timestamp(),
                request_id: None, // This should be set by middleware
            },
        };

        HttpResponse::build(status_code).json(error_response)
    }
}

/// 429 body for exhausted generation quotas.
///
/// Shape is fixed: top-level `error` and `message` strings plus a
/// `limits` object with remaining counts and resetIn seconds per
/// horizon. The human-readable retry hint lives only in `message`.
fn quota_response(decision: &RateLimitDecision) -> HttpResponse {
    let retry = decision.retry_after().unwrap_or_default();
    let hourly = decision.horizon("hourly");
    let daily = decision.horizon("daily");

    HttpResponse::TooManyRequests().json(json!({
        "error": "Rate limit exceeded",
        "message": format!(
            "You've reached your generation limit. Try again in {}.",
            format_reset_hint(retry)
        ),
        "limits": {
            "hourly": {
                "remaining": hourly.map(|h| h.remaining).unwrap_or(0),
                "resetIn": hourly.map(|h| h.reset_in.as_secs()).unwrap_or(0),
            },
            "daily": {
                "remaining": daily.map(|h| h.remaining).unwrap_or(0),
                "resetIn": daily.map(|h| h.reset_in.as_secs()).unwrap_or(0),
            },
        },
    }))
}

/// Standard error response format
#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(serde::Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub timestamp: i64,
    pub request_id: Option<String>,
}
