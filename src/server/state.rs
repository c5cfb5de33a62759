//! Application state shared across HTTP handlers
//!
//! This module provides the AppState struct and its implementations.

use crate::config::Config;
use crate::core::media::MediaFetcher;
use crate::core::provider::FalClient;
use crate::core::rate_limit::{Horizon, SlidingWindowLimiter};
use crate::core::url_guard::UrlGuard;
use crate::utils::error::Result;
use std::sync::Arc;

/// HTTP server state shared across handlers
///
/// This struct contains shared resources that need to be accessed across
/// multiple request handlers. All fields are wrapped in Arc for efficient
/// sharing across threads.
#[derive(Clone)]
pub struct AppState {
    /// Gateway configuration (shared read-only)
    pub config: Arc<Config>,
    /// Per client ceiling for the whole /api surface
    pub api_limiter: Arc<SlidingWindowLimiter>,
    /// Hourly and daily generation quotas
    pub generation_limiter: Arc<SlidingWindowLimiter>,
    /// Upstream provider client
    pub provider: Arc<FalClient>,
    /// Outbound URL validation
    pub url_guard: Arc<UrlGuard>,
    /// Remote image downloads
    pub media: Arc<MediaFetcher>,
}

impl AppState {
    /// Create a new AppState with shared resources
    pub fn new(config: Config) -> Result<Self> {
        let api_limiter = SlidingWindowLimiter::new(vec![Horizon::new(
            "api",
            config.api_rate_limit,
            config.api_rate_window,
        )]);

        let generation_horizons = vec![
            Horizon::new("hourly", config.hourly_limit, config.hourly_window),
            Horizon::new("daily", config.daily_limit, config.daily_window),
        ];
        // Generation quotas only bind in production.
        let generation_limiter = if config.environment.is_development() {
            SlidingWindowLimiter::bypassed(generation_horizons)
        } else {
            SlidingWindowLimiter::new(generation_horizons)
        };

        let url_guard = UrlGuard::new(
            config.allowed_image_origins.clone(),
            config.environment.is_production(),
        );
        let provider = FalClient::new(&config)?;
        let media = MediaFetcher::new()?;

        Ok(Self {
            config: Arc::new(config),
            api_limiter: Arc::new(api_limiter),
            generation_limiter: Arc::new(generation_limiter),
            provider: Arc::new(provider),
            url_guard: Arc::new(url_guard),
            media: Arc::new(media),
        })
    }
}
