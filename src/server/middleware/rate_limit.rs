//! Per client rate limiting middleware

use crate::core::identity::resolve_client_identity;
use crate::core::rate_limit::SlidingWindowLimiter;
use actix_web::HttpResponse;
use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::header::{HeaderMap, HeaderName, HeaderValue};
use chrono::{SecondsFormat, Utc};
use futures::future::{Ready, ready};
use serde_json::json;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Sliding window rate limiting middleware for Actix-web
///
/// Checks the caller's identity against the configured limiter before
/// the request reaches any handler. Denials short-circuit with a 429;
/// admitted requests get `X-RateLimit-*` headers on their response.
pub struct RateLimitMiddleware {
    limiter: Arc<SlidingWindowLimiter>,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Arc<SlidingWindowLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = RateLimitMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service,
            limiter: self.limiter.clone(),
        }))
    }
}

/// Service implementation for rate limiting middleware
pub struct RateLimitMiddlewareService<S> {
    service: S,
    limiter: Arc<SlidingWindowLimiter>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let client = resolve_client_identity(req.headers());
        let decision = self.limiter.check(&client);

        // No horizons configured: fail open.
        let Some(status) = decision.horizons.first().cloned() else {
            let fut = self.service.call(req);
            return Box::pin(async move { Ok(fut.await?.map_into_left_body()) });
        };

        if !decision.allowed {
            debug!("Rate limit exceeded for {}", client);

            let reset_iso = reset_timestamp(status.reset_in);
            let body = json!({
                "error": "Rate limit exceeded",
                "message": "Too many requests. Please try again later.",
                "resetTime": reset_iso,
                "limit": status.limit,
            });

            let (request, _) = req.into_parts();
            let mut response = HttpResponse::TooManyRequests().json(body);
            let headers = response.headers_mut();
            let retry_secs = status.reset_in.as_secs().max(1);
            insert_header(headers, "retry-after", &retry_secs.to_string());
            insert_header(headers, "x-ratelimit-limit", &status.limit.to_string());
            insert_header(headers, "x-ratelimit-remaining", "0");
            insert_header(headers, "x-ratelimit-reset", &reset_iso);

            return Box::pin(async move {
                Ok(ServiceResponse::new(request, response).map_into_right_body())
            });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let mut res = fut.await?;
            let headers = res.headers_mut();
            insert_header(headers, "x-ratelimit-limit", &status.limit.to_string());
            insert_header(headers, "x-ratelimit-remaining", &status.remaining.to_string());
            insert_header(headers, "x-ratelimit-reset", &reset_timestamp(status.reset_in));
            Ok(res.map_into_left_body())
        })
    }
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    headers.insert(
        HeaderName::from_static(name),
        HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static("invalid")),
    );
}

/// RFC 3339 timestamp of the moment the window restarts.
fn reset_timestamp(reset_in: Duration) -> String {
    let reset_at = Utc::now()
        + chrono::Duration::from_std(reset_in).unwrap_or_else(|_| chrono::Duration::zero());
    reset_at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
