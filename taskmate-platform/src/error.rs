use thiserror::Error;

/// Which adapter a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    Storage,
    Chrome,
}

impl std::fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdapterKind::Storage => f.write_str("storage"),
            AdapterKind::Chrome => f.write_str("chrome"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PlatformError {
    /// Synchronous access on native before the async bootstrap ran.
    #[error("{adapter} adapter not initialized; call the async constructor first")]
    UninitializedAdapter { adapter: AdapterKind },

    #[error("storage backend failed: {0}")]
    Storage(String),

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("preferences database failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl PlatformError {
    pub fn is_uninitialized(&self) -> bool {
        matches!(self, PlatformError::UninitializedAdapter { .. })
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;
