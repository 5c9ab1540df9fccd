// taskmate-net/src/session.rs
//
// Response-side policy for the API client. Every non-success response passes
// through SessionGuard::inspect, which applies the global side effects
// (session clear, redirect, backoff) and hands back the typed error.

use crate::error::{ApiError, HttpFailure};
use crate::hooks::{LOGIN_PATH, MAINTENANCE_PATH, Navigator, SessionHooks};
use crate::rate_limit::{RateLimitManager, retry_after_from_headers};
use chrono::Utc;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

const SESSION_ENDPOINT: &str = "/session";
const MAINTENANCE_ERROR_TYPE: &str = "maintenance_mode";

/// Method and path of the request a response belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMeta {
    pub method: String,
    pub path: String,
}

impl RequestMeta {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
        }
    }

    /// `POST …/session` is a credential check, not a protected call.
    pub fn is_login_attempt(&self) -> bool {
        self.method == "POST" && self.path.trim_end_matches('/').ends_with(SESSION_ENDPOINT)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error_type: Option<String>,
}

fn is_maintenance_body(body: &str) -> bool {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error_type)
        .is_some_and(|t| t == MAINTENANCE_ERROR_TYPE)
}

pub struct SessionGuard {
    hooks: Arc<dyn SessionHooks>,
    navigator: Arc<dyn Navigator>,
    rate_limit: RateLimitManager,
    /// Armed while a session is live. The first 401 disarms it.
    session_live: AtomicBool,
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("rate_limit", &self.rate_limit)
            .field("session_live", &self.session_live.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl SessionGuard {
    pub fn new(
        hooks: Arc<dyn SessionHooks>,
        navigator: Arc<dyn Navigator>,
        rate_limit: RateLimitManager,
    ) -> Self {
        Self {
            hooks,
            navigator,
            rate_limit,
            session_live: AtomicBool::new(true),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.hooks.token()
    }

    pub fn rate_limit(&self) -> &RateLimitManager {
        &self.rate_limit
    }

    /// Re-arm the 401 latch after a successful sign-in.
    pub fn session_established(&self) {
        self.session_live.store(true, Ordering::SeqCst);
    }

    /// Apply the side effects for a failed response and build its error.
    pub fn inspect(
        &self,
        meta: &RequestMeta,
        status: u16,
        headers: &HeaderMap,
        body: String,
    ) -> ApiError {
        let failure = HttpFailure {
            method: meta.method.clone(),
            path: meta.path.clone(),
            status,
            body,
        };

        match status {
            401 if meta.is_login_attempt() => {
                info!(path = %meta.path, "login rejected");
                ApiError::Unauthorized(failure)
            }
            401 => {
                error!(method = %meta.method, path = %meta.path, "authentication lost");
                self.expire_session();
                ApiError::AuthExpired(failure)
            }
            403 => {
                error!(method = %meta.method, path = %meta.path, "access forbidden");
                ApiError::Forbidden(failure)
            }
            429 => {
                let retry_after_ms = retry_after_from_headers(headers, Utc::now());
                warn!(path = %meta.path, ?retry_after_ms, "rate limited");
                self.rate_limit.set_rate_limited(retry_after_ms);
                ApiError::RateLimited {
                    failure,
                    retry_after_ms,
                }
            }
            503 if is_maintenance_body(&failure.body) => {
                warn!(path = %meta.path, "service in maintenance");
                if self.navigator.current_path() != MAINTENANCE_PATH {
                    self.navigator.navigate_to(MAINTENANCE_PATH);
                }
                ApiError::Maintenance(failure)
            }
            _ => {
                warn!(%failure, "request failed");
                ApiError::Status(failure)
            }
        }
    }

    fn expire_session(&self) {
        if self.session_live.swap(false, Ordering::SeqCst) {
            info!("clearing session");
            self.hooks.clear_session();
        }
        if !self.navigator.current_path().contains(LOGIN_PATH) {
            self.navigator.navigate_to(LOGIN_PATH);
        }
    }
}
