use crate::cell::StoreCell;
use crate::persist::{PersistBridge, PersistError, Persisted};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

pub const UI_PREFS_STORE: &str = "sidebar-storage";

/// Layout preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiPrefs {
    pub sidebar_collapsed: bool,
    /// Hover state while the pointer is over the sidebar. Not persisted.
    pub sidebar_hovered: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiPrefsSnapshot {
    pub sidebar_collapsed: bool,
}

impl Persisted for UiPrefs {
    type Durable = UiPrefsSnapshot;

    fn project(&self) -> UiPrefsSnapshot {
        UiPrefsSnapshot {
            sidebar_collapsed: self.sidebar_collapsed,
        }
    }

    fn restore(durable: UiPrefsSnapshot) -> Self {
        Self {
            sidebar_collapsed: durable.sidebar_collapsed,
            sidebar_hovered: false,
        }
    }
}

#[derive(Debug)]
pub struct UiPrefsStore {
    cell: StoreCell<UiPrefs>,
}

impl UiPrefsStore {
    pub fn new(bridge: PersistBridge) -> Self {
        Self {
            cell: StoreCell::new(bridge, UI_PREFS_STORE, UiPrefs::default()),
        }
    }

    pub async fn rehydrate(&self) -> Result<bool, PersistError> {
        self.cell.rehydrate().await
    }

    pub fn prefs(&self) -> UiPrefs {
        self.cell.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<UiPrefs> {
        self.cell.subscribe()
    }

    pub async fn toggle_sidebar(&self) -> Result<bool, PersistError> {
        self.cell
            .update(|p| {
                p.sidebar_collapsed = !p.sidebar_collapsed;
                true
            })
            .await?;
        Ok(self.cell.read(|p| p.sidebar_collapsed))
    }

    /// Returns whether the hover state changed.
    pub async fn set_hovered(&self, hovered: bool) -> Result<bool, PersistError> {
        self.cell
            .update(|p| {
                let changed = p.sidebar_hovered != hovered;
                p.sidebar_hovered = hovered;
                changed
            })
            .await
    }
}
