//! Local filesystem storage implementation.
//!
//! Stores the watch set as a pretty-printed JSON object, replacing the file
//! atomically on every save.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── watchlist.json          # {"<user id>": ["<course code>", ...]}
//! ├── watchlist.tmp           # Transient, only present mid-write
//! └── watchlist.json.corrupt  # A file that failed to load, kept aside
//! ```
//!
//! A watch list that exists but cannot be read or parsed is renamed to
//! `<file>.corrupt` before the error is returned, so the next save never
//! overwrites it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::WatchSet;
use crate::storage::WatchPersistence;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Create a storage backend writing to `file_name` under `root_dir`.
    pub fn new(root_dir: impl AsRef<Path>, file_name: &str) -> Self {
        Self {
            path: root_dir.as_ref().join(file_name),
        }
    }

    /// Full path of the watch set file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where a watch list that failed to load is moved.
    pub fn corrupt_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".corrupt");
        PathBuf::from(name)
    }

    async fn set_aside(&self) {
        let target = self.corrupt_path();
        match tokio::fs::rename(&self.path, &target).await {
            Ok(()) => log::warn!(
                "Moved unreadable watch list {} to {}",
                self.path.display(),
                target.display()
            ),
            Err(e) => log::error!(
                "Could not move unreadable watch list {} aside: {}",
                self.path.display(),
                e
            ),
        }
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, sync, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl WatchPersistence for JsonFileStorage {
    async fn load(&self) -> Result<WatchSet> {
        let bytes = match self.read_bytes().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::info!(
                    "No watch list at {}, starting empty",
                    self.path.display()
                );
                return Ok(WatchSet::default());
            }
            Err(e) => {
                self.set_aside().await;
                return Err(e);
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(watches) => Ok(watches),
            Err(e) => {
                self.set_aside().await;
                Err(e.into())
            }
        }
    }

    async fn save(&self, watches: &WatchSet) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(watches)?;
        self.write_bytes(&bytes).await?;
        log::debug!(
            "Saved {} watch(es) for {} user(s) to {}",
            watches.len(),
            watches.user_count(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CourseCode, UserId};
    use tempfile::TempDir;

    fn sample() -> WatchSet {
        let mut set = WatchSet::new();
        set.insert(UserId::from("u1"), CourseCode::from("34250"));
        set.insert(UserId::from("u1"), CourseCode::from("34260"));
        set.insert(UserId::from("u2"), CourseCode::from("cs101"));
        set
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(tmp.path(), "watchlist.json");

        let loaded = storage.load().await.unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_is_exact() {
        let tmp = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(tmp.path(), "watchlist.json");

        let set = sample();
        storage.save(&set).await.unwrap();

        assert_eq!(storage.load().await.unwrap(), set);
        assert!(!tmp.path().join("watchlist.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_creates_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(tmp.path().join("nested/dir"), "watchlist.json");

        storage.save(&sample()).await.unwrap();
        assert!(storage.path().exists());
    }

    #[tokio::test]
    async fn test_load_reads_legacy_numeric_ids() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("watchlist.json"),
            r#"{"123456789012345678": ["34250", "34250", "34110"]}"#,
        )
        .unwrap();
        let storage = JsonFileStorage::new(tmp.path(), "watchlist.json");

        let loaded = storage.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(
            loaded.courses(&UserId::from(123456789012345678u64)),
            vec![CourseCode::from("34110"), CourseCode::from("34250")]
        );
    }

    #[tokio::test]
    async fn test_load_malformed_file_errors() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("watchlist.json"), "{not json").unwrap();
        let storage = JsonFileStorage::new(tmp.path(), "watchlist.json");

        assert!(matches!(storage.load().await, Err(AppError::Json(_))));
        assert!(!storage.path().exists());
        assert_eq!(
            std::fs::read_to_string(storage.corrupt_path()).unwrap(),
            "{not json"
        );
    }

    #[tokio::test]
    async fn test_load_unreadable_file_is_set_aside() {
        let tmp = TempDir::new().unwrap();
        // Reading a directory fails with an I/O error other than NotFound.
        std::fs::create_dir(tmp.path().join("watchlist.json")).unwrap();
        std::fs::write(tmp.path().join("watchlist.json/keep"), "data").unwrap();
        let storage = JsonFileStorage::new(tmp.path(), "watchlist.json");

        assert!(matches!(storage.load().await, Err(AppError::Io(_))));
        assert!(storage.corrupt_path().join("keep").exists());

        storage.save(&sample()).await.unwrap();
        assert_eq!(storage.load().await.unwrap(), sample());
        assert!(storage.corrupt_path().join("keep").exists());
    }
}
