// taskmate-core/src/boot.rs
//
// Startup ordering.
//
// 1. Native only: build the storage and chrome adapters (async bridge).
// 2. Rehydrate every persisted store, in any order among themselves.
// 3. Only then hand the stores to the rest of the application.

use crate::auth::{AUTH_STORE, AuthStore};
use crate::persist::{PersistBridge, PersistError};
use crate::prefs::{UI_PREFS_STORE, UiPrefsStore};
use crate::workspace::{WORKSPACE_STORE, WorkspaceStore};
use futures::FutureExt;
use futures::future::{BoxFuture, try_join_all};
use std::future::Future;
use std::sync::Arc;
use taskmate_platform::{AdapterFactory, PlatformError, PlatformKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootError {
    #[error("platform adapters failed to initialize: {0}")]
    Adapters(#[source] PlatformError),

    #[error("failed to rehydrate '{store}': {source}")]
    Rehydrate {
        store: &'static str,
        #[source]
        source: PersistError,
    },
}

/// Every persisted store of the client.
#[derive(Debug, Clone)]
pub struct Stores {
    pub bridge: PersistBridge,
    pub auth: Arc<AuthStore>,
    pub workspace: Arc<WorkspaceStore>,
    pub ui: Arc<UiPrefsStore>,
}

impl Stores {
    /// Stores with default state. Prefer `bootstrap`, which also rehydrates.
    pub fn new(factory: Arc<AdapterFactory>) -> Self {
        let bridge = PersistBridge::new(factory);
        Self {
            auth: Arc::new(AuthStore::new(bridge.clone())),
            workspace: Arc::new(WorkspaceStore::new(bridge.clone())),
            ui: Arc::new(UiPrefsStore::new(bridge.clone())),
            bridge,
        }
    }

    /// Await all rehydrations. Returns how many stores had prior state.
    pub async fn rehydrate_all(&self) -> Result<usize, BootError> {
        let rehydrations: Vec<BoxFuture<'_, Result<bool, BootError>>> = vec![
            step(AUTH_STORE, self.auth.rehydrate()),
            step(WORKSPACE_STORE, self.workspace.rehydrate()),
            step(UI_PREFS_STORE, self.ui.rehydrate()),
        ];
        let restored = try_join_all(rehydrations).await?;
        Ok(restored.into_iter().filter(|r| *r).count())
    }

    /// Durably write the session stores.
    ///
    /// A 401 clears them synchronously and leaves the write to a spawned
    /// task; callers about to exit await this so the clear reaches storage.
    pub async fn persist_session(&self) -> Result<(), PersistError> {
        futures::try_join!(self.auth.flush(), self.workspace.flush())?;
        Ok(())
    }
}

fn step<'a, F>(store: &'static str, rehydration: F) -> BoxFuture<'a, Result<bool, BootError>>
where
    F: Future<Output = Result<bool, PersistError>> + Send + 'a,
{
    rehydration
        .map(move |result| result.map_err(|source| BootError::Rehydrate { store, source }))
        .boxed()
}

/// Build the adapters the platform needs, then restore all stores.
pub async fn bootstrap(factory: Arc<AdapterFactory>) -> Result<Stores, BootError> {
    if factory.platform() == PlatformKind::Native {
        futures::try_join!(factory.create_storage(), factory.create_chrome())
            .map_err(BootError::Adapters)?;
    }

    let stores = Stores::new(factory);
    let restored = stores.rehydrate_all().await?;
    tracing::info!(restored, "stores rehydrated");
    Ok(stores)
}
