use crate::persist::{NamedStore, PersistBridge, PersistError, Persisted};
use tokio::sync::watch;

/// In-memory state of one named store, persisted on every change.
///
/// Subscribers are only woken when an update actually changes the state.
#[derive(Debug)]
pub struct StoreCell<S> {
    bridge: PersistBridge,
    store: NamedStore<S>,
    state: watch::Sender<S>,
}

impl<S> StoreCell<S>
where
    S: Persisted + Clone + Send + Sync + 'static,
{
    pub fn new(bridge: PersistBridge, name: &str, initial: S) -> Self {
        let store = bridge.define::<S>(name);
        let (state, _) = watch::channel(initial);
        Self {
            bridge,
            store,
            state,
        }
    }

    pub fn name(&self) -> &str {
        self.store.name()
    }

    /// Replace the in-memory state with the persisted one, if any.
    pub async fn rehydrate(&self) -> Result<bool, PersistError> {
        match self.bridge.rehydrate(&self.store).await? {
            Some(restored) => {
                self.state.send_replace(restored);
                tracing::debug!(store = self.name(), "rehydrated");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn snapshot(&self) -> S {
        self.state.borrow().clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.state.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.state.subscribe()
    }

    /// Apply `f`; persist and notify only when it reports a change.
    pub async fn update<F>(&self, f: F) -> Result<bool, PersistError>
    where
        F: FnOnce(&mut S) -> bool,
    {
        let changed = self.state.send_if_modified(f);
        if changed {
            self.save().await?;
        }
        Ok(changed)
    }

    /// Like `update`, for transitions that can be rejected.
    ///
    /// `f` must leave the state untouched when it returns an error.
    pub async fn try_update<E, F>(&self, f: F) -> Result<bool, E>
    where
        F: FnOnce(&mut S) -> Result<bool, E>,
        E: From<PersistError>,
    {
        let mut outcome = Ok(false);
        self.state.send_if_modified(|state| {
            outcome = f(state);
            matches!(outcome, Ok(true))
        });
        if let Ok(true) = outcome {
            self.save().await?;
        }
        outcome
    }

    pub async fn replace(&self, next: S) -> Result<(), PersistError> {
        self.state.send_replace(next);
        self.save().await
    }

    /// Synchronous mutation for callers that cannot await.
    ///
    /// The write is spawned on the current runtime; without one the change
    /// stays in memory only.
    pub fn update_detached<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut S) -> bool,
    {
        let changed = self.state.send_if_modified(f);
        if !changed {
            return false;
        }

        let bridge = self.bridge.clone();
        let store = self.store.clone();
        let snapshot = self.snapshot();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = bridge.persist(&store, &snapshot).await {
                        tracing::error!(store = store.name(), error = %e, "detached persist failed");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(store = self.name(), "no runtime; change kept in memory only");
            }
        }
        true
    }

    /// Write the current state, including changes made by `update_detached`
    /// whose spawned write may not have run yet.
    pub async fn flush(&self) -> Result<(), PersistError> {
        self.save().await
    }

    async fn save(&self) -> Result<(), PersistError> {
        let snapshot = self.snapshot();
        self.bridge.persist(&self.store, &snapshot).await
    }
}
