use crate::error::Result;
use crate::types::{ChromeAdapter, StatusBarStyle};
use async_trait::async_trait;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Commands sent to the native shell host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChromeCommand {
    SetBackgroundColor(String),
    SetDarkContent(bool),
    SetOverlaysWebView(bool),
}

/// Status bar adapter that forwards styling to the native shell.
///
/// The shell host listens on the factory's chrome channel. Having no listener
/// is not an error; the last applied style is still tracked.
#[derive(Debug)]
pub struct NativeStatusBar {
    shell_tx: broadcast::Sender<ChromeCommand>,
    last_style: Mutex<Option<StatusBarStyle>>,
}

impl NativeStatusBar {
    pub async fn connect(shell_tx: broadcast::Sender<ChromeCommand>) -> Result<Self> {
        tracing::debug!(listeners = shell_tx.receiver_count(), "native status bar attached");
        Ok(Self {
            shell_tx,
            last_style: Mutex::new(None),
        })
    }

    pub fn last_style(&self) -> Option<StatusBarStyle> {
        self.last_style.lock().ok().and_then(|s| s.clone())
    }

    fn send(&self, command: ChromeCommand) {
        if self.shell_tx.send(command).is_err() {
            tracing::debug!("no native shell listening for chrome commands");
        }
    }
}

#[async_trait]
impl ChromeAdapter for NativeStatusBar {
    async fn apply_style(&self, style: &StatusBarStyle) -> Result<()> {
        self.send(ChromeCommand::SetBackgroundColor(
            style.background_color.clone(),
        ));
        self.send(ChromeCommand::SetDarkContent(style.is_dark));
        if let Ok(mut last) = self.last_style.lock() {
            *last = Some(style.clone());
        }
        Ok(())
    }

    async fn set_overlays_webview(&self, overlay: bool) -> Result<()> {
        self.send(ChromeCommand::SetOverlaysWebView(overlay));
        Ok(())
    }
}
