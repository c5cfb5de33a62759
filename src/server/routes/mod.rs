//! HTTP route handlers
//!
//! Every /api route runs the same admission sequence: field validation,
//! generation quota (skipped when the caller brings their own key),
//! model allowlist, then URL safety for any caller-supplied image URL.
//! Only requests that clear every step reach the provider.

pub mod compose;
pub mod describe;
pub mod edit;
pub mod generate;
pub mod health;
pub mod upload;
pub mod workflow;

mod quota;

pub use quota::QuotaSnapshot;

use crate::server::middleware::RateLimitMiddleware;
use crate::server::state::AppState;
use actix_web::web;

/// Wire up every route. `/health` sits outside the `/api` scope so
/// probes are never throttled.
pub fn configure_routes(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.route("/health", web::get().to(health::health_check)).service(
        web::scope("/api")
            .wrap(RateLimitMiddleware::new(state.api_limiter.clone()))
            .route("/generate", web::post().to(generate::generate))
            .route("/edit", web::post().to(edit::edit))
            .route("/workflow", web::post().to(workflow::workflow))
            .route("/upload", web::post().to(upload::upload))
            .route("/describe", web::post().to(describe::describe))
            .route("/compose", web::post().to(compose::compose)),
    );
}
