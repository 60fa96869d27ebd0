//! File-backed TTL store.
//!
//! Each key lives in its own JSON file under the store directory:
//!
//! ```text
//! <dir>/<sanitized-key>.json   {"expires_at": "2024-06-03T10:00:00Z", "value": "..."}
//! ```
//!
//! # Atomic Writes
//!
//! Entries are written with write-to-temp-then-rename:
//! 1. Write to `<file>.json.tmp`
//! 2. fsync the file
//! 3. Rename over `<file>.json`
//! 4. fsync the directory
//!
//! A reader sees either the old entry or the new one, never a partial write.
//! Expired entries read as missing and are removed on read.
//!
//! All file IO runs on tokio's blocking pool, so a caller's timeout can cut
//! off a stalled read or write.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::store::{Result, StateStore, StoreError};

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    /// `None` for entries written with a zero TTL.
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    value: String,
}

impl StoredEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// A [`StateStore`] persisting each key to a file in one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(FileStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    ///
    /// Anything outside `[A-Za-z0-9_-]` is replaced so keys such as
    /// `queue-monitor-state:latest` map to a portable file name.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", name))
    }

    fn read_entry(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: StoredEntry = serde_json::from_slice(&bytes)?;
        if entry.is_expired(Utc::now()) {
            debug!(key, "Stored entry expired");
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            return Ok(None);
        }

        Ok(Some(entry.value))
    }

    fn write_entry(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let expires_at = if ttl.is_zero() {
            None
        } else {
            let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
            Some(Utc::now().checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC))
        };
        let entry = StoredEntry { expires_at, value };
        let bytes = serde_json::to_vec(&entry)?;

        let path = self.entry_path(key);
        let tmp_path = path.with_extension("json.tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }

        std::fs::rename(&tmp_path, &path)?;
        sync_dir(&self.dir)?;
        Ok(())
    }
}

/// Makes directory entry changes (creates, renames) durable.
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

/// Runs blocking file IO off the async worker threads.
///
/// Dropping the returned future (for example on a timeout) detaches the IO
/// rather than waiting for it.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Io(io::Error::other(e)))?
}

impl StateStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let store = self.clone();
        let key = key.to_string();
        blocking(move || store.read_entry(&key)).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let store = self.clone();
        let key = key.to_string();
        blocking(move || store.write_entry(&key, value, ttl)).await
    }
}
