//! Rate limiter types and data structures

use std::time::{Duration, Instant};

/// A named quota horizon: at most `limit` admitted requests per `window`.
#[derive(Debug, Clone, Copy)]
pub struct Horizon {
    /// Name as it appears in responses ("api", "hourly", "daily")
    pub name: &'static str,
    /// Maximum admitted requests per window
    pub limit: u32,
    /// Window duration
    pub window: Duration,
}

impl Horizon {
    /// Create a new horizon.
    pub const fn new(name: &'static str, limit: u32, window: Duration) -> Self {
        Self {
            name,
            limit,
            window,
        }
    }
}

/// Per-horizon outcome carried by a [`RateLimitDecision`].
#[derive(Debug, Clone)]
pub struct HorizonStatus {
    /// Horizon name
    pub name: &'static str,
    /// Configured limit
    pub limit: u32,
    /// Requests left in the current window, counted after this request
    /// when it was admitted
    pub remaining: u32,
    /// Time until the current window resets
    pub reset_in: Duration,
}

/// Result of one rate limit check. Computed per call, never stored.
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    /// Whether the request is admitted
    pub allowed: bool,
    /// Status per configured horizon, in configuration order
    pub horizons: Vec<HorizonStatus>,
}

impl RateLimitDecision {
    /// Look up a horizon's status by name.
    pub fn horizon(&self, name: &str) -> Option<&HorizonStatus> {
        self.horizons.iter().find(|h| h.name == name)
    }

    /// Time until the caller could be admitted again.
    ///
    /// The latest reset among exhausted horizons; retrying sooner would
    /// still be denied by the slowest one. `None` when no horizon is
    /// exhausted.
    pub fn retry_after(&self) -> Option<Duration> {
        self.horizons
            .iter()
            .filter(|h| h.remaining == 0)
            .map(|h| h.reset_in)
            .max()
    }
}

/// Mutable counter state for one horizon window.
#[derive(Debug, Clone)]
pub(super) struct WindowState {
    /// Admitted requests in the current window
    pub(super) count: u32,
    /// When the current window opened
    pub(super) window_start: Instant,
}

impl WindowState {
    pub(super) fn fresh(now: Instant) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }
}

/// Per-client counters, index-aligned with the limiter's horizon list.
#[derive(Debug, Clone)]
pub(super) struct ClientEntry {
    pub(super) windows: Vec<WindowState>,
}

impl ClientEntry {
    pub(super) fn fresh(horizon_count: usize, now: Instant) -> Self {
        Self {
            windows: vec![WindowState::fresh(now); horizon_count],
        }
    }
}
