//! HTTP transport for the TaskMate API.
//!
//! [`ApiClient`] injects the session token and routes every failed response
//! through a [`SessionGuard`], which owns the cross-request policy: clearing
//! the session once on 401, the shared rate-limit backoff on 429 and the
//! maintenance redirect on 503.

pub mod api;
pub mod client;
pub mod error;
pub mod hooks;
pub mod rate_limit;
pub mod session;

pub use api::{LoginResponse, ScopesApi, SessionApi};
pub use client::{ApiClient, ApiConfig, DEFAULT_TIMEOUT_MS};
pub use error::{ApiError, HttpFailure};
pub use hooks::{LOGIN_PATH, MAINTENANCE_PATH, Navigator, RouteTracker, SessionHooks};
pub use rate_limit::{RateLimitManager, RateLimitNotice, RateLimitState, parse_retry_after};
pub use session::{RequestMeta, SessionGuard};
