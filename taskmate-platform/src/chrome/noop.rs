use crate::error::Result;
use crate::types::{ChromeAdapter, StatusBarStyle};
use async_trait::async_trait;

/// Web hosts have no status bar to style.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopChrome;

#[async_trait]
impl ChromeAdapter for NoopChrome {
    async fn apply_style(&self, _style: &StatusBarStyle) -> Result<()> {
        Ok(())
    }

    async fn set_overlays_webview(&self, _overlay: bool) -> Result<()> {
        Ok(())
    }
}
