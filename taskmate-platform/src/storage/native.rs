// taskmate-platform/src/storage/native.rs

use crate::error::{PlatformError, Result};
use crate::types::StorageAdapter;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

const MIGRATION_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS preferences (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);
"#;

/// Native preferences store backed by SQLite.
///
/// Opening the database is a blocking round-trip, which is why the native
/// storage adapter only exists after the async bootstrap.
#[derive(Debug, Clone)]
pub struct NativePreferences {
    conn: Arc<Mutex<Connection>>,
}

impl NativePreferences {
    /// Open (or create) the preferences database off the async runtime.
    pub async fn open(path: PathBuf) -> Result<Self> {
        tokio::task::spawn_blocking(move || Self::open_blocking(&path))
            .await
            .map_err(|e| PlatformError::Storage(format!("preferences open task failed: {e}")))?
    }

    fn open_blocking(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        // WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(MIGRATION_INIT)?;

        tracing::info!(path = %path.display(), "native preferences opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PlatformError::Storage("preferences connection poisoned".to_string()))
    }
}

#[async_trait]
impl StorageAdapter for NativePreferences {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let result = conn.query_row(
            "SELECT value FROM preferences WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO preferences (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, Utc::now().timestamp()],
        )?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM preferences WHERE key = ?1", params![key])?;
        Ok(())
    }
}
