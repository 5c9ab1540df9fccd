// taskmate-net/src/rate_limit.rs
//
// Global backoff shared by every in-flight request.
//
// A 429 puts the client into the limited state until a deadline. Deadlines
// only move forward. The UI hears about it once per limited interval, plus
// once more for each strictly later known deadline.

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Window assumed when a 429 carries no usable Retry-After.
pub const DEFAULT_FALLBACK_WINDOW_MS: u64 = 60_000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitState {
    pub is_limited: bool,
    /// The hint of the 429 that set the current deadline. `None` = unknown.
    pub retry_after_ms: Option<u64>,
    pub limited_until: Option<DateTime<Utc>>,
}

/// Sent to subscribers when the UI should tell the user to slow down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitNotice {
    pub retry_after_ms: Option<u64>,
}

/// Parse a Retry-After value: delta seconds or an HTTP-date.
///
/// Absent or malformed values are "unknown", never an error. A date in the
/// past means zero.
pub fn parse_retry_after(value: Option<&str>, now: DateTime<Utc>) -> Option<u64> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(secs.saturating_mul(1000));
    }
    let date = DateTime::parse_from_rfc2822(raw).ok()?;
    let delta = date.with_timezone(&Utc) - now;
    Some(u64::try_from(delta.num_milliseconds()).unwrap_or(0))
}

pub fn retry_after_from_headers(headers: &HeaderMap, now: DateTime<Utc>) -> Option<u64> {
    let value = headers.get(RETRY_AFTER).and_then(|v| v.to_str().ok());
    parse_retry_after(value, now)
}

fn deadline(now: DateTime<Utc>, ms: u64) -> DateTime<Utc> {
    i64::try_from(ms)
        .ok()
        .and_then(TimeDelta::try_milliseconds)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[derive(Debug, Clone)]
pub struct RateLimitManager {
    state: Arc<Mutex<RateLimitState>>,
    notices: broadcast::Sender<RateLimitNotice>,
    fallback_window_ms: u64,
}

impl Default for RateLimitManager {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_WINDOW_MS)
    }
}

impl RateLimitManager {
    pub fn new(fallback_window_ms: u64) -> Self {
        let (notices, _) = broadcast::channel(16);
        Self {
            state: Arc::new(Mutex::new(RateLimitState::default())),
            notices,
            fallback_window_ms,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RateLimitNotice> {
        self.notices.subscribe()
    }

    /// Record a 429. Returns whether a notice was emitted.
    pub fn set_rate_limited(&self, retry_after_ms: Option<u64>) -> bool {
        self.set_rate_limited_at(Utc::now(), retry_after_ms)
    }

    pub fn set_rate_limited_at(&self, now: DateTime<Utc>, retry_after_ms: Option<u64>) -> bool {
        let notify = {
            let Ok(mut state) = self.state.lock() else {
                tracing::error!("rate limit state poisoned");
                return false;
            };
            expire(&mut state, now);

            let until = deadline(now, retry_after_ms.unwrap_or(self.fallback_window_ms));
            if !state.is_limited {
                *state = RateLimitState {
                    is_limited: true,
                    retry_after_ms,
                    limited_until: Some(until),
                };
                true
            } else if state.limited_until.is_none_or(|current| until > current) {
                state.limited_until = Some(until);
                state.retry_after_ms = retry_after_ms;
                // Unknown hints only refresh the window.
                retry_after_ms.is_some()
            } else {
                false
            }
        };

        if notify {
            // No subscribers is fine.
            let _ = self.notices.send(RateLimitNotice { retry_after_ms });
        }
        notify
    }

    pub fn is_limited(&self) -> bool {
        self.is_limited_at(Utc::now())
    }

    pub fn is_limited_at(&self, now: DateTime<Utc>) -> bool {
        self.state
            .lock()
            .map(|mut state| {
                expire(&mut state, now);
                state.is_limited
            })
            .unwrap_or(false)
    }

    /// Time left until the deadline, zero when not limited.
    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms_at(Utc::now())
    }

    pub fn remaining_ms_at(&self, now: DateTime<Utc>) -> u64 {
        let Ok(mut state) = self.state.lock() else {
            return 0;
        };
        expire(&mut state, now);
        state
            .limited_until
            .map(|until| u64::try_from((until - now).num_milliseconds()).unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn state(&self) -> RateLimitState {
        self.state
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut state) = self.state.lock() {
            *state = RateLimitState::default();
        }
    }
}

fn expire(state: &mut RateLimitState, now: DateTime<Utc>) {
    if state.is_limited && state.limited_until.is_some_and(|until| until <= now) {
        tracing::info!("rate limit window elapsed");
        *state = RateLimitState::default();
    }
}
