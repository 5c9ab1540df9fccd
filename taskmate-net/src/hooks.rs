use std::sync::Mutex;

pub const LOGIN_PATH: &str = "/login";
pub const MAINTENANCE_PATH: &str = "/maintenance";

/// Access to the session owned by the auth store.
///
/// Injected once when the transport is built, so the transport never imports
/// the store that depends on it.
pub trait SessionHooks: Send + Sync {
    fn token(&self) -> Option<String>;

    /// Called synchronously when a protected request comes back 401.
    fn clear_session(&self);
}

/// The UI's router, as far as the transport is concerned.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn navigate_to(&self, path: &str);
}

/// Navigator that only tracks the current path and the visits made.
#[derive(Debug)]
pub struct RouteTracker {
    current: Mutex<String>,
    visits: Mutex<Vec<String>>,
}

impl RouteTracker {
    pub fn new(initial: &str) -> Self {
        Self {
            current: Mutex::new(initial.to_string()),
            visits: Mutex::new(Vec::new()),
        }
    }

    /// Paths navigated to, oldest first.
    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Navigator for RouteTracker {
    fn current_path(&self) -> String {
        self.current
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn navigate_to(&self, path: &str) {
        tracing::info!(path, "navigating");
        if let Ok(mut current) = self.current.lock() {
            *current = path.to_string();
        }
        if let Ok(mut visits) = self.visits.lock() {
            visits.push(path.to_string());
        }
    }
}
