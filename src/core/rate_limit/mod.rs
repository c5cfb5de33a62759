//! Sliding window rate limiting
//!
//! One limiter instance guards the whole /api surface and a second,
//! stricter instance meters the generation endpoints over hourly and
//! daily horizons. Both share this implementation and differ only in
//! their configured horizons.

mod limiter;
mod types;


pub use limiter::SlidingWindowLimiter;
pub use types::{Horizon, HorizonStatus, RateLimitDecision};

use std::time::Duration;

/// Format a reset interval the way clients display it: "2h 5m", "3m 10s",
/// or "45s".
pub fn format_reset_hint(reset_in: Duration) -> String {
    let seconds = reset_in.as_secs();
    let minutes = seconds / 60;
    let hours = minutes / 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}
