use std::time::Duration;
use thiserror::Error;

/// The failed exchange, kept intact for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFailure {
    pub method: String,
    pub path: String,
    pub status: u16,
    pub body: String,
}

impl std::fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} returned {}", self.method, self.path, self.status)?;
        if !self.body.is_empty() {
            write!(f, ": {}", &self.body[..floor_char_boundary(&self.body, 200)])?;
        }
        Ok(())
    }
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|i| s.is_char_boundary(*i)).unwrap_or(0)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {path} timed out after {timeout:?}")]
    Timeout { path: String, timeout: Duration },

    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// 401 on the login endpoint. The caller shows "wrong credentials".
    #[error("login rejected: {0}")]
    Unauthorized(HttpFailure),

    /// 401 anywhere else. The session was cleared.
    #[error("session expired: {0}")]
    AuthExpired(HttpFailure),

    #[error("forbidden: {0}")]
    Forbidden(HttpFailure),

    #[error("rate limited (retry after {retry_after_ms:?} ms): {failure}")]
    RateLimited {
        failure: HttpFailure,
        retry_after_ms: Option<u64>,
    },

    #[error("service in maintenance: {0}")]
    Maintenance(HttpFailure),

    #[error("{0}")]
    Status(HttpFailure),

    #[error("malformed response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("invalid API configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        self.failure().map(|f| f.status)
    }

    pub fn failure(&self) -> Option<&HttpFailure> {
        match self {
            ApiError::Unauthorized(f)
            | ApiError::AuthExpired(f)
            | ApiError::Forbidden(f)
            | ApiError::Maintenance(f)
            | ApiError::Status(f) => Some(f),
            ApiError::RateLimited { failure, .. } => Some(failure),
            _ => None,
        }
    }

    /// Network-level failure: no response, nothing global was touched.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Timeout { .. } | ApiError::Transport { .. })
    }
}
