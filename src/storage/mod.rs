//! Snapshot persistence.
//!
//! The snapshot is the only durable state: the full book sequence of the
//! last completed run, plus a single backup generation.
//!
//! ```text
//! storage/
//! ├── config.toml           # Crawler configuration
//! ├── books.json            # Current snapshot
//! └── books_previous.json   # Copy of the snapshot before the last write
//! ```

pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::Book;

pub use local::LocalStorage;

/// Metadata about a snapshot write.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    /// Number of books written
    pub book_count: usize,
    /// Where the snapshot landed
    pub location: String,
    /// Whether the prior snapshot was backed up first
    pub backed_up: bool,
    /// Timestamp of the write
    pub timestamp: DateTime<Utc>,
}

/// Trait for snapshot storage backends.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Load the current snapshot.
    ///
    /// `Ok(None)` when no snapshot exists yet; [`AppError::StateLoad`] when
    /// one exists but cannot be read or decoded.
    ///
    /// [`AppError::StateLoad`]: crate::error::AppError::StateLoad
    async fn load_snapshot(&self) -> Result<Option<Vec<Book>>>;

    /// Copy the current snapshot to the backup slot.
    ///
    /// Returns `false` if there was nothing to back up.
    async fn backup_snapshot(&self) -> Result<bool>;

    /// Replace the current snapshot with `books` atomically.
    async fn write_snapshot(&self, books: &[Book]) -> Result<WriteMetadata>;
}
