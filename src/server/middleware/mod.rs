//! HTTP middleware implementations
//!
//! This module provides middleware for request processing:
//! - Rate limiting
//! - Request ID tracking

mod rate_limit;
mod request_id;

// Re-export all middleware
pub use rate_limit::{RateLimitMiddleware, RateLimitMiddlewareService};
pub use request_id::{RequestIdMiddleware, RequestIdMiddlewareService};
