use crate::cell::StoreCell;
use crate::persist::{PersistBridge, PersistError, Persisted};
use crate::user::User;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

pub const AUTH_STORE: &str = "auth-storage";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub token: Option<String>,
    pub user: Option<User>,
    /// Last login failure shown to the user. Not persisted.
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSnapshot {
    pub token: Option<String>,
    pub user: Option<User>,
}

impl Persisted for AuthState {
    type Durable = AuthSnapshot;

    fn project(&self) -> AuthSnapshot {
        AuthSnapshot {
            token: self.token.clone(),
            user: self.user.clone(),
        }
    }

    fn restore(durable: AuthSnapshot) -> Self {
        Self {
            token: durable.token,
            user: durable.user,
            last_error: None,
        }
    }
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}

/// Owns the session token and the signed-in user.
#[derive(Debug)]
pub struct AuthStore {
    cell: StoreCell<AuthState>,
}

impl AuthStore {
    pub fn new(bridge: PersistBridge) -> Self {
        Self {
            cell: StoreCell::new(bridge, AUTH_STORE, AuthState::default()),
        }
    }

    pub async fn rehydrate(&self) -> Result<bool, PersistError> {
        self.cell.rehydrate().await
    }

    pub fn token(&self) -> Option<String> {
        self.cell.read(|s| s.token.clone())
    }

    pub fn user(&self) -> Option<User> {
        self.cell.read(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.cell.read(AuthState::is_authenticated)
    }

    pub fn last_error(&self) -> Option<String> {
        self.cell.read(|s| s.last_error.clone())
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.cell.subscribe()
    }

    pub async fn sign_in(&self, token: String, user: User) -> Result<(), PersistError> {
        tracing::info!(user = user.id, "signed in");
        self.cell
            .replace(AuthState {
                token: Some(token),
                user: Some(user),
                last_error: None,
            })
            .await
    }

    pub async fn sign_out(&self) -> Result<bool, PersistError> {
        self.cell.update(clear_auth).await
    }

    /// Synchronous clear, used when the transport detects a lost session.
    pub fn clear_detached(&self) -> bool {
        self.cell.update_detached(clear_auth)
    }

    pub async fn flush(&self) -> Result<(), PersistError> {
        self.cell.flush().await
    }

    /// Record a login failure without touching the stored session.
    pub fn record_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.cell.update_detached(|s| {
            if s.last_error.as_deref() == Some(message.as_str()) {
                return false;
            }
            s.last_error = Some(message);
            true
        });
    }
}

fn clear_auth(state: &mut AuthState) -> bool {
    if state.token.is_none() && state.user.is_none() {
        return false;
    }
    state.token = None;
    state.user = None;
    true
}
