// taskmate-core/src/persist.rs
//
// Persistence bridge.
//
// Turns the storage adapter's key/string interface into typed named stores.
// Each store persists a projection of its state inside a small versioned
// JSON envelope. Anything that cannot be read back is treated as "no prior
// state"; only adapter failures are reported to the caller.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use taskmate_platform::{AdapterFactory, PlatformError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("failed to serialize store '{name}': {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

impl PersistError {
    pub fn is_uninitialized(&self) -> bool {
        matches!(self, PersistError::Platform(e) if e.is_uninitialized())
    }
}

/// State that can be saved through the bridge.
///
/// `Durable` is the subset of fields that survives a restart; everything else
/// is rebuilt from defaults on `restore`.
pub trait Persisted: Sized {
    type Durable: Serialize + DeserializeOwned;

    /// Bumped when `Durable` changes shape. Older snapshots are discarded.
    const VERSION: u32 = 0;

    fn project(&self) -> Self::Durable;
    fn restore(durable: Self::Durable) -> Self;
}

/// Handle to one named record in the storage adapter.
#[derive(Debug)]
pub struct NamedStore<S> {
    name: String,
    _state: PhantomData<fn() -> S>,
}

impl<S> NamedStore<S> {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<S> Clone for NamedStore<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _state: PhantomData,
        }
    }
}

#[derive(Serialize)]
struct EnvelopeOut<'a, T> {
    state: &'a T,
    version: u32,
}

#[derive(Deserialize)]
struct EnvelopeIn<T> {
    state: T,
    #[serde(default)]
    version: u32,
}

/// Encode a store's durable projection.
pub fn serialize_state<S: Persisted>(state: &S) -> Result<String, serde_json::Error> {
    let durable = state.project();
    serde_json::to_string(&EnvelopeOut {
        state: &durable,
        version: S::VERSION,
    })
}

/// Decode a snapshot. Malformed input and version mismatches yield `None`.
pub fn deserialize_state<S: Persisted>(name: &str, raw: &str) -> Option<S> {
    match serde_json::from_str::<EnvelopeIn<S::Durable>>(raw) {
        Ok(envelope) if envelope.version == S::VERSION => Some(S::restore(envelope.state)),
        Ok(envelope) => {
            tracing::warn!(
                store = name,
                found = envelope.version,
                expected = S::VERSION,
                "discarding persisted state from another version"
            );
            None
        }
        Err(e) => {
            tracing::warn!(store = name, error = %e, "persisted state unreadable, starting fresh");
            None
        }
    }
}

/// Reads and writes named stores through the factory's storage adapter.
#[derive(Debug, Clone)]
pub struct PersistBridge {
    factory: Arc<AdapterFactory>,
}

impl PersistBridge {
    pub fn new(factory: Arc<AdapterFactory>) -> Self {
        Self { factory }
    }

    pub fn factory(&self) -> &Arc<AdapterFactory> {
        &self.factory
    }

    pub fn define<S: Persisted>(&self, name: impl Into<String>) -> NamedStore<S> {
        NamedStore {
            name: name.into(),
            _state: PhantomData,
        }
    }

    /// Load the last persisted state, if there is a readable one.
    pub async fn rehydrate<S: Persisted>(
        &self,
        store: &NamedStore<S>,
    ) -> Result<Option<S>, PersistError> {
        let storage = self.factory.storage()?;
        let Some(raw) = storage.get_item(&store.name).await? else {
            tracing::debug!(store = %store.name, "no persisted state");
            return Ok(None);
        };
        Ok(deserialize_state::<S>(&store.name, &raw))
    }

    /// Write the durable projection of `state`. Last write wins.
    pub async fn persist<S: Persisted>(
        &self,
        store: &NamedStore<S>,
        state: &S,
    ) -> Result<(), PersistError> {
        let raw = serialize_state(state).map_err(|source| PersistError::Serialize {
            name: store.name.clone(),
            source,
        })?;
        let storage = self.factory.storage()?;
        storage.set_item(&store.name, &raw).await?;
        Ok(())
    }

    pub async fn clear<S: Persisted>(&self, store: &NamedStore<S>) -> Result<(), PersistError> {
        let storage = self.factory.storage()?;
        storage.remove_item(&store.name).await?;
        Ok(())
    }
}
