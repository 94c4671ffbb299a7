//! Storage abstractions for thread and comment persistence.
//!
//! The store doubles as the dedup index and the holder of per-thread
//! pagination cursors:
//!
//! ```text
//! threads   link (unique) ── last_page_fetched (never decreases)
//! comments  comment_id (unique) ── thread_link
//! ```
//!
//! Inserting a record whose key already exists is a no-op, not an error.

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Comment, StorageBackend, StorageConfig, Thread};

// Re-export for convenience
pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// Trait for thread/comment store backends.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Look up a thread by its link.
    async fn find_thread(&self, link: &str) -> Result<Option<Thread>>;

    /// Insert a thread if its link is new. Returns `true` when a row was written.
    async fn insert_thread(&self, thread: &Thread) -> Result<bool>;

    /// Raise the stored cursor to `page`; lower values are ignored.
    async fn update_last_page(&self, link: &str, page: u32) -> Result<()>;

    /// Look up a comment by its id.
    async fn find_comment(&self, comment_id: &str) -> Result<Option<Comment>>;

    /// Insert a comment if its id is new. Returns `true` when a row was written.
    async fn insert_comment(&self, comment: &Comment) -> Result<bool>;

    async fn comment_exists(&self, comment_id: &str) -> Result<bool> {
        Ok(self.find_comment(comment_id).await?.is_some())
    }
}

/// Open the store selected by configuration.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn ThreadStore>> {
    match config.backend {
        StorageBackend::Memory => {
            log::info!("Using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        #[cfg(feature = "sqlite")]
        StorageBackend::Sqlite => {
            log::info!("Using SQLite store at {}", config.path.display());
            Ok(Arc::new(SqliteStore::open(&config.path)?))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageBackend::Sqlite => Err(crate::error::AppError::config(
            "storage.backend = \"sqlite\" requires the `sqlite` feature",
        )),
    }
}
