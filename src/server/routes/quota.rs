//! Remaining quota reported alongside generation results

use crate::core::rate_limit::RateLimitDecision;
use serde::Serialize;

/// Remaining generation quota after an admitted request.
#[derive(Debug, Clone, Serialize)]
pub struct QuotaSnapshot {
    pub hourly: HorizonQuota,
    pub daily: HorizonQuota,
}

/// Remaining count for one quota horizon.
#[derive(Debug, Clone, Serialize)]
pub struct HorizonQuota {
    pub remaining: u32,
}

impl QuotaSnapshot {
    pub fn from_decision(decision: &RateLimitDecision) -> Self {
        Self {
            hourly: HorizonQuota {
                remaining: decision.horizon("hourly").map(|h| h.remaining).unwrap_or(0),
            },
            daily: HorizonQuota {
                remaining: decision.horizon("daily").map(|h| h.remaining).unwrap_or(0),
            },
        }
    }
}
