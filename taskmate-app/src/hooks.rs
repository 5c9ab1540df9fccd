use std::sync::Arc;
use taskmate_core::{AuthStore, WorkspaceStore};
use taskmate_net::SessionHooks;

/// Gives the transport the session token and a way to drop the session,
/// without the transport knowing about the stores.
#[derive(Debug, Clone)]
pub struct AppSessionHooks {
    auth: Arc<AuthStore>,
    workspace: Arc<WorkspaceStore>,
}

impl AppSessionHooks {
    pub fn new(auth: Arc<AuthStore>, workspace: Arc<WorkspaceStore>) -> Self {
        Self { auth, workspace }
    }
}

impl SessionHooks for AppSessionHooks {
    fn token(&self) -> Option<String> {
        self.auth.token()
    }

    fn clear_session(&self) {
        let cleared = self.auth.clear_detached();
        self.workspace.reset_detached();
        tracing::info!(cleared, "session cleared after authentication loss");
    }
}
