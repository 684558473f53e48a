//! Local filesystem storage implementation.
//!
//! Snapshots are written to a temporary sibling and renamed into place, so a
//! reader never observes a partially written file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Book, PathsConfig};
use crate::storage::{SnapshotStorage, WriteMetadata};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    snapshot_path: PathBuf,
    backup_path: PathBuf,
}

impl LocalStorage {
    /// Create storage rooted at `root_dir` using the configured file names.
    pub fn new(root_dir: impl AsRef<Path>, paths: &PathsConfig) -> Self {
        let root = root_dir.as_ref();
        Self {
            snapshot_path: paths.snapshot_path(root),
            backup_path: paths.backup_path(root),
        }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
        Self::ensure_dir(path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Load the backup generation, if any.
    pub async fn load_backup(&self) -> Result<Option<Vec<Book>>> {
        Self::read_books(&self.backup_path).await
    }

    async fn read_books(path: &Path) -> Result<Option<Vec<Book>>> {
        let display = path.display().to_string();
        let bytes = match Self::read_bytes(path).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(None),
            Err(e) => return Err(AppError::state_load(display, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| AppError::state_load(display, e))
    }
}

#[async_trait]
impl SnapshotStorage for LocalStorage {
    async fn load_snapshot(&self) -> Result<Option<Vec<Book>>> {
        Self::read_books(&self.snapshot_path).await
    }

    async fn backup_snapshot(&self) -> Result<bool> {
        if !tokio::fs::try_exists(&self.snapshot_path).await? {
            return Ok(false);
        }
        Self::ensure_dir(&self.backup_path).await?;
        tokio::fs::copy(&self.snapshot_path, &self.backup_path).await?;
        log::info!(
            "Backed up {} -> {}",
            self.snapshot_path.display(),
            self.backup_path.display()
        );
        Ok(true)
    }

    async fn write_snapshot(&self, books: &[Book]) -> Result<WriteMetadata> {
        let bytes = serde_json::to_vec_pretty(books)?;
        Self::write_bytes(&self.snapshot_path, &bytes).await?;
        log::info!(
            "Snapshot: {} books written to {}",
            books.len(),
            self.snapshot_path.display()
        );

        Ok(WriteMetadata {
            book_count: books.len(),
            location: self.snapshot_path.display().to_string(),
            backed_up: false,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookSummary;
    use tempfile::TempDir;

    fn storage(tmp: &TempDir) -> LocalStorage {
        LocalStorage::new(tmp.path(), &PathsConfig::default())
    }

    fn books(urls: &[&str]) -> Vec<Book> {
        urls.iter()
            .map(|url| {
                Book::from(BookSummary {
                    title: format!("書 {url}"),
                    url: url.to_string(),
                    ..BookSummary::default()
                })
            })
            .collect()
    }

    #[tokio::test]
    async fn test_load_missing_snapshot_is_none() {
        let tmp = TempDir::new().unwrap();
        assert!(storage(&tmp).load_snapshot().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_then_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);
        let written = books(&["https://example.com/products/1"]);

        let meta = storage.write_snapshot(&written).await.unwrap();
        assert_eq!(meta.book_count, 1);
        assert!(!storage.snapshot_path().with_extension("tmp").exists());

        let loaded = storage.load_snapshot().await.unwrap().unwrap();
        assert_eq!(loaded, written);

        // Non-ASCII text is stored verbatim.
        let raw = std::fs::read_to_string(storage.snapshot_path()).unwrap();
        assert!(raw.contains("書 https://example.com/products/1"));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_state_load_error() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);
        std::fs::write(storage.snapshot_path(), "{ not json").unwrap();

        let result = storage.load_snapshot().await;
        assert!(matches!(result, Err(AppError::StateLoad { .. })));
    }

    #[tokio::test]
    async fn test_backup_copies_without_moving() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);

        assert!(!storage.backup_snapshot().await.unwrap());

        let first = books(&["https://example.com/products/1"]);
        storage.write_snapshot(&first).await.unwrap();
        assert!(storage.backup_snapshot().await.unwrap());

        assert!(storage.snapshot_path().exists());
        assert_eq!(storage.load_backup().await.unwrap().unwrap(), first);

        let second = books(&["https://example.com/products/2"]);
        storage.write_snapshot(&second).await.unwrap();
        assert_eq!(storage.load_snapshot().await.unwrap().unwrap(), second);
        assert_eq!(storage.load_backup().await.unwrap().unwrap(), first);
    }
}
