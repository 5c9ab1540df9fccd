use crate::detect::PlatformKind;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Key/string persistence capability.
#[async_trait]
pub trait StorageAdapter: Send + Sync + std::fmt::Debug {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;
    async fn remove_item(&self, key: &str) -> Result<()>;
}

/// Styling of the host's status bar / window chrome.
#[async_trait]
pub trait ChromeAdapter: Send + Sync + std::fmt::Debug {
    async fn apply_style(&self, style: &StatusBarStyle) -> Result<()>;
    async fn set_overlays_webview(&self, overlay: bool) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBarStyle {
    pub is_dark: bool,
    pub background_color: String,
}

impl StatusBarStyle {
    pub const DARK_BACKGROUND: &'static str = "#171717";
    pub const LIGHT_BACKGROUND: &'static str = "#f5f5f5";

    /// The style matching the app theme.
    pub fn for_theme(is_dark: bool) -> Self {
        let background = if is_dark {
            Self::DARK_BACKGROUND
        } else {
            Self::LIGHT_BACKGROUND
        };
        Self {
            is_dark,
            background_color: background.to_string(),
        }
    }
}

/// Platform section of the client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Forces a platform instead of reading the environment.
    #[serde(default)]
    pub kind: Option<PlatformKind>,
    /// Directory for `preferences.db` (native) and `local-storage.json` (web).
    /// Without it the web store is memory-only.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl PlatformConfig {
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            kind: None,
            data_dir: Some(data_dir.into()),
        }
    }

    pub fn preferences_path(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.join("preferences.db"),
            None => PathBuf::from("preferences.db"),
        }
    }

    pub fn local_storage_path(&self) -> Option<PathBuf> {
        self.data_dir
            .as_ref()
            .map(|dir| dir.join("local-storage.json"))
    }
}
