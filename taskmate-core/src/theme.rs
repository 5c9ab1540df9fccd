use std::str::FromStr;
use taskmate_platform::{ChromeAdapter, PlatformError, StatusBarStyle, StorageAdapter};

/// Raw storage key; the value is the bare preference name, not an envelope.
pub const THEME_KEY: &str = "theme_preference";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemePreference {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
            ThemePreference::System => "system",
        }
    }

    pub fn resolve_dark(self, system_prefers_dark: bool) -> bool {
        match self {
            ThemePreference::Light => false,
            ThemePreference::Dark => true,
            ThemePreference::System => system_prefers_dark,
        }
    }

    /// Saved preference, or the default when missing or unrecognized.
    pub async fn load(storage: &dyn StorageAdapter) -> Result<Self, PlatformError> {
        let saved = storage.get_item(THEME_KEY).await?;
        Ok(saved
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default())
    }

    pub async fn save(self, storage: &dyn StorageAdapter) -> Result<(), PlatformError> {
        storage.set_item(THEME_KEY, self.as_str()).await
    }
}

impl FromStr for ThemePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(ThemePreference::Light),
            "dark" => Ok(ThemePreference::Dark),
            "system" => Ok(ThemePreference::System),
            other => Err(format!("unknown theme '{other}'")),
        }
    }
}

/// Keep the host status bar in step with the applied theme.
pub async fn sync_chrome(chrome: &dyn ChromeAdapter, is_dark: bool) -> Result<(), PlatformError> {
    chrome.set_overlays_webview(false).await?;
    chrome.apply_style(&StatusBarStyle::for_theme(is_dark)).await
}
