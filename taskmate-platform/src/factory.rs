use crate::chrome::{ChromeCommand, NativeStatusBar, NoopChrome};
use crate::detect::{self, PlatformKind};
use crate::error::{AdapterKind, PlatformError, Result};
use crate::storage::{LocalStorage, NativePreferences};
use crate::types::{ChromeAdapter, PlatformConfig, StorageAdapter};
use std::sync::{Arc, Mutex, PoisonError};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{OnceCell, broadcast};

/// Builds and owns the storage and chrome adapters for one process.
///
/// Each adapter is constructed at most once. Concurrent async callers share
/// the in-flight construction and all receive the same `Arc`.
#[derive(Debug)]
pub struct AdapterFactory {
    platform: PlatformKind,
    config: PlatformConfig,
    storage: OnceCell<Arc<dyn StorageAdapter>>,
    chrome: OnceCell<Arc<dyn ChromeAdapter>>,
    chrome_tx: broadcast::Sender<ChromeCommand>,
    constructions: AtomicUsize,
    inline_init: Mutex<()>,
}

impl AdapterFactory {
    pub fn new(platform: PlatformKind, config: PlatformConfig) -> Self {
        let (chrome_tx, _) = broadcast::channel(32);
        Self {
            platform,
            config,
            storage: OnceCell::new(),
            chrome: OnceCell::new(),
            chrome_tx,
            constructions: AtomicUsize::new(0),
            inline_init: Mutex::new(()),
        }
    }

    /// Factory for the resolved platform, unless the config forces one.
    pub fn for_current_platform(config: PlatformConfig) -> Self {
        let platform = config.kind.unwrap_or_else(detect::resolve);
        Self::new(platform, config)
    }

    pub fn platform(&self) -> PlatformKind {
        self.platform
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Number of adapters built and cached so far.
    pub fn construction_count(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }

    /// Subscribe to commands the native status bar forwards to the shell.
    pub fn chrome_commands(&self) -> broadcast::Receiver<ChromeCommand> {
        self.chrome_tx.subscribe()
    }

    /// Drop both cached adapters. Test isolation only.
    pub fn reset(&mut self) {
        self.storage.take();
        self.chrome.take();
        self.constructions.store(0, Ordering::SeqCst);
    }

    // ────────────────────────────────────────────────────────────────
    // Storage
    // ────────────────────────────────────────────────────────────────

    /// Build the storage adapter for this platform, or return the cached one.
    pub async fn create_storage(&self) -> Result<Arc<dyn StorageAdapter>> {
        if self.platform == PlatformKind::Web {
            return Ok(self.web_storage());
        }

        let adapter = self
            .storage
            .get_or_try_init(|| async {
                let adapter: Arc<dyn StorageAdapter> =
                    Arc::new(NativePreferences::open(self.config.preferences_path()).await?);
                self.constructions.fetch_add(1, Ordering::SeqCst);
                tracing::info!(platform = %self.platform, "storage adapter created");
                Ok::<_, PlatformError>(adapter)
            })
            .await?;
        Ok(adapter.clone())
    }

    /// Best-effort synchronous access.
    ///
    /// On web the local store is built inline when nothing exists yet. On
    /// native this fails until `create_storage` has completed.
    pub fn storage(&self) -> Result<Arc<dyn StorageAdapter>> {
        match (self.storage.get(), self.platform) {
            (Some(adapter), _) => Ok(adapter.clone()),
            (None, PlatformKind::Web) => Ok(self.web_storage()),
            (None, PlatformKind::Native) => Err(PlatformError::UninitializedAdapter {
                adapter: AdapterKind::Storage,
            }),
        }
    }

    fn web_storage(&self) -> Arc<dyn StorageAdapter> {
        self.init_inline(&self.storage, AdapterKind::Storage, || {
            Arc::new(LocalStorage::open(self.config.local_storage_path()))
        })
    }

    // ────────────────────────────────────────────────────────────────
    // Chrome
    // ────────────────────────────────────────────────────────────────

    pub async fn create_chrome(&self) -> Result<Arc<dyn ChromeAdapter>> {
        if self.platform == PlatformKind::Web {
            return Ok(self.web_chrome());
        }

        let adapter = self
            .chrome
            .get_or_try_init(|| async {
                let adapter: Arc<dyn ChromeAdapter> =
                    Arc::new(NativeStatusBar::connect(self.chrome_tx.clone()).await?);
                self.constructions.fetch_add(1, Ordering::SeqCst);
                tracing::info!(platform = %self.platform, "chrome adapter created");
                Ok::<_, PlatformError>(adapter)
            })
            .await?;
        Ok(adapter.clone())
    }

    pub fn chrome(&self) -> Result<Arc<dyn ChromeAdapter>> {
        match (self.chrome.get(), self.platform) {
            (Some(adapter), _) => Ok(adapter.clone()),
            (None, PlatformKind::Web) => Ok(self.web_chrome()),
            (None, PlatformKind::Native) => Err(PlatformError::UninitializedAdapter {
                adapter: AdapterKind::Chrome,
            }),
        }
    }

    fn web_chrome(&self) -> Arc<dyn ChromeAdapter> {
        self.init_inline(&self.chrome, AdapterKind::Chrome, || Arc::new(NoopChrome))
    }

    /// Web adapters are built synchronously, one at a time, so every caller
    /// sees the single cached instance.
    fn init_inline<T: ?Sized>(
        &self,
        cell: &OnceCell<Arc<T>>,
        kind: AdapterKind,
        build: impl FnOnce() -> Arc<T>,
    ) -> Arc<T> {
        let _guard = self
            .inline_init
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = cell.get() {
            return existing.clone();
        }

        let adapter = build();
        match cell.set(adapter.clone()) {
            Ok(()) => {
                self.constructions.fetch_add(1, Ordering::SeqCst);
                tracing::debug!(adapter = %kind, "web adapter cached");
                adapter
            }
            // Only reachable if a native cell was filled concurrently.
            Err(_) => cell.get().cloned().unwrap_or(adapter),
        }
    }
}
