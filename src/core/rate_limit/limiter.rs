//! Core sliding window limiter implementation

use super::types::{ClientEntry, Horizon, HorizonStatus, RateLimitDecision};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Sentinel `remaining` value reported when the limiter is bypassed.
const BYPASS_REMAINING: u32 = 999;

/// Interval between background sweeps of expired client entries.
const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Sliding window rate limiter tracking one counter per client per horizon.
///
/// A request is admitted only when every horizon has quota left, and
/// admission increments all horizons together. A window restarts lazily
/// the first time it is observed past its duration.
pub struct SlidingWindowLimiter {
    /// Configured horizons, in response order
    horizons: Vec<Horizon>,
    /// Counter state per client identity
    entries: DashMap<String, ClientEntry>,
    /// When set, every check is admitted with sentinel quota values
    bypass: bool,
}

impl SlidingWindowLimiter {
    /// Create a limiter enforcing the given horizons.
    pub fn new(horizons: Vec<Horizon>) -> Self {
        Self {
            horizons,
            entries: DashMap::new(),
            bypass: false,
        }
    }

    /// Create a limiter that admits everything with sentinel quota values.
    ///
    /// Development mode uses this to keep the code path exercised without
    /// enforcing limits; callers still receive a well-formed decision.
    pub fn bypassed(horizons: Vec<Horizon>) -> Self {
        Self {
            horizons,
            entries: DashMap::new(),
            bypass: true,
        }
    }

    /// Configured horizons.
    pub fn horizons(&self) -> &[Horizon] {
        &self.horizons
    }

    /// Number of client identities currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.entries.len()
    }

    /// Check and record a request for `key` in one atomic step.
    ///
    /// Admission requires quota on every horizon. The increments happen
    /// under the entry lock, so concurrent requests for the same key
    /// cannot lose updates.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        if self.bypass {
            return self.bypass_decision();
        }

        let now = Instant::now();

        // Avoid String allocation if key already exists
        let mut entry = if let Some(entry) = self.entries.get_mut(key) {
            entry
        } else {
            self.entries
                .entry(key.to_string())
                .or_insert_with(|| ClientEntry::fresh(self.horizons.len(), now))
        };

        // Restart any window observed past its duration.
        for (window, horizon) in entry.windows.iter_mut().zip(&self.horizons) {
            if now.duration_since(window.window_start) > horizon.window {
                *window = super::types::WindowState::fresh(now);
            }
        }

        let allowed = entry
            .windows
            .iter()
            .zip(&self.horizons)
            .all(|(window, horizon)| window.count < horizon.limit);

        if allowed {
            for window in entry.windows.iter_mut() {
                window.count += 1;
            }
        }

        let horizons = entry
            .windows
            .iter()
            .zip(&self.horizons)
            .map(|(window, horizon)| HorizonStatus {
                name: horizon.name,
                limit: horizon.limit,
                remaining: horizon.limit.saturating_sub(window.count),
                reset_in: (window.window_start + horizon.window).saturating_duration_since(now),
            })
            .collect();

        if !allowed {
            if let Some((window, horizon)) = entry
                .windows
                .iter()
                .zip(&self.horizons)
                .find(|(window, horizon)| window.count >= horizon.limit)
            {
                debug!(
                    "Rate limit exceeded for {}: {}/{} {} requests",
                    key, window.count, horizon.limit, horizon.name
                );
            }
        }

        RateLimitDecision { allowed, horizons }
    }

    fn bypass_decision(&self) -> RateLimitDecision {
        RateLimitDecision {
            allowed: true,
            horizons: self
                .horizons
                .iter()
                .map(|horizon| HorizonStatus {
                    name: horizon.name,
                    limit: horizon.limit,
                    remaining: BYPASS_REMAINING,
                    reset_in: Duration::ZERO,
                })
                .collect(),
        }
    }

    /// Drop clients whose windows have all expired.
    pub fn sweep(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| {
            entry
                .windows
                .iter()
                .zip(&self.horizons)
                .any(|(window, horizon)| now.duration_since(window.window_start) <= horizon.window)
        });
    }

    /// Start the hourly background sweep. Housekeeping only; it never runs
    /// on the request path.
    pub fn start_sweep_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                self.sweep();
            }
        });
    }
}
