//! Rate limit signals carried on gallery responses.
//!
//! The gallery reports its quota through three headers. Any of them may be
//! missing or garbled; such fields stay `None` so that "no signal" is never
//! confused with a signal of zero.

use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use std::time::Duration;

/// Request quota for the current window
pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
/// Requests left in the current window
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
/// Epoch second at which the window resets
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Quota information parsed from one response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    pub reset_at: Option<DateTime<Utc>>,
}

impl RateLimitStatus {
    /// Read the rate limit headers from a response
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            limit: header_u64(headers, LIMIT_HEADER),
            remaining: header_u64(headers, REMAINING_HEADER),
            reset_at: header_u64(headers, RESET_HEADER)
                .and_then(|secs| i64::try_from(secs).ok())
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        }
    }

    /// True when the server sent at least one usable field
    pub fn is_signalled(&self) -> bool {
        self.limit.is_some() || self.remaining.is_some() || self.reset_at.is_some()
    }

    /// True when the server says the current window has no requests left
    pub fn is_depleted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// Time to wait until the window resets.
    ///
    /// `None` without a reset signal. A reset in the past yields
    /// `Duration::ZERO`.
    pub fn wait_duration(&self, now: DateTime<Utc>) -> Option<Duration> {
        let reset_at = self.reset_at?;
        Some((reset_at - now).to_std().unwrap_or(Duration::ZERO))
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}
