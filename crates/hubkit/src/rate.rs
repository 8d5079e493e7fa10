//! Rate-limit tracking from GitHub response headers.
//!
//! GitHub reports quota on every response:
//! - `X-RateLimit-Remaining`: calls left in the current window
//! - `X-RateLimit-Used`: calls made in the current window
//! - `X-RateLimit-Limit`: calls allowed per window
//! - `X-RateLimit-Reset`: unix timestamp at which the window resets
//!
//! The tracker keeps the latest values as an immutable [`RateState`] snapshot
//! that is swapped out after every response.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::Serialize;
use tracing::debug;

const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const USED_HEADER: &str = "x-ratelimit-used";
const LIMIT_HEADER: &str = "x-ratelimit-limit";
const RESET_HEADER: &str = "x-ratelimit-reset";

/// Quota snapshot taken from the last response. `None` means unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RateState {
    /// Calls left in the current window.
    pub remaining: Option<u32>,
    /// Calls made in the current window.
    pub used: Option<u32>,
    /// Calls allowed per window.
    pub total: Option<u32>,
    /// When the window resets.
    pub reset_at: Option<DateTime<Utc>>,
    /// When the last response was recorded.
    pub last_request_at: Option<DateTime<Utc>>,
}

impl RateState {
    /// Whether `requests` more calls would run past the remaining quota.
    ///
    /// An unknown quota never predicts exhaustion.
    #[must_use]
    pub fn will_exceed(&self, requests: u32) -> bool {
        self.remaining.is_some_and(|remaining| remaining < requests)
    }

    /// Whether at most one call is left.
    #[must_use]
    pub fn is_near_limit(&self) -> bool {
        matches!(self.remaining, Some(0 | 1))
    }

    /// Time left until the window resets; zero if unknown or already past.
    #[must_use]
    pub fn wait_duration(&self, now: DateTime<Utc>) -> Duration {
        self.reset_at
            .and_then(|reset| (reset - now).to_std().ok())
            .unwrap_or(Duration::ZERO)
    }

    /// Build the next snapshot from response headers.
    ///
    /// Missing or unparsable headers keep the previous value.
    fn next(&self, headers: &HeaderMap, now: DateTime<Utc>) -> Self {
        Self {
            remaining: header_u32(headers, REMAINING_HEADER).or(self.remaining),
            used: header_u32(headers, USED_HEADER).or(self.used),
            total: header_u32(headers, LIMIT_HEADER).or(self.total),
            reset_at: header_timestamp(headers, RESET_HEADER).or(self.reset_at),
            last_request_at: Some(now),
        }
    }
}

/// Single source of truth for the remaining API quota of one HTTP core.
#[derive(Debug, Default)]
pub struct RateTracker {
    state: RwLock<Arc<RateState>>,
}

impl RateTracker {
    /// Create a tracker with an all-unknown state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current state with values read from `headers`.
    pub fn record(&self, headers: &HeaderMap) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let next = guard.next(headers, Utc::now());
        debug!(
            remaining = ?next.remaining,
            used = ?next.used,
            total = ?next.total,
            "recorded rate limit"
        );
        *guard = Arc::new(next);
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RateState> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// See [`RateState::will_exceed`].
    #[must_use]
    pub fn will_exceed(&self, requests: u32) -> bool {
        self.snapshot().will_exceed(requests)
    }

    /// See [`RateState::is_near_limit`].
    #[must_use]
    pub fn is_near_limit(&self) -> bool {
        self.snapshot().is_near_limit()
    }
}

fn header_u32(headers: &HeaderMap, name: &str) -> Option<u32> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

fn header_timestamp(headers: &HeaderMap, name: &str) -> Option<DateTime<Utc>> {
    let secs: i64 = headers.get(name)?.to_str().ok()?.trim().parse().ok()?;
    DateTime::from_timestamp(secs, 0)
}
