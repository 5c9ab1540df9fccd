use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Environment variable the native shell host sets before launching the client.
pub const PLATFORM_ENV: &str = "TASKMATE_PLATFORM";

/// Where the client process is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    /// Inside the native shell. Adapters need an async bootstrap.
    Native,
    /// Browser-like host with a synchronous local store.
    Web,
}

impl PlatformKind {
    /// Classify a raw environment signal. Anything but `native` is web.
    pub fn from_signal(signal: Option<&str>) -> Self {
        match signal.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("native") => PlatformKind::Native,
            _ => PlatformKind::Web,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlatformKind::Native => "native",
            PlatformKind::Web => "web",
        }
    }
}

impl std::fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

static PLATFORM: OnceLock<PlatformKind> = OnceLock::new();

/// Resolve the platform once; every later call returns the cached value.
pub fn resolve() -> PlatformKind {
    *PLATFORM.get_or_init(|| {
        let signal = std::env::var(PLATFORM_ENV).ok();
        let kind = PlatformKind::from_signal(signal.as_deref());
        tracing::info!(platform = %kind, "platform resolved");
        kind
    })
}

pub fn is_native() -> bool {
    resolve() == PlatformKind::Native
}

pub fn is_web() -> bool {
    resolve() == PlatformKind::Web
}
