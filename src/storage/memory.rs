//! In-memory store.
//!
//! Keeps threads and comments in process-local maps. Used for dry runs and
//! tests; nothing survives a restart.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{Comment, Thread};
use crate::storage::ThreadStore;

#[derive(Default)]
struct Tables {
    threads: HashMap<String, Thread>,
    comments: HashMap<String, Comment>,
}

/// Mutex-guarded map store.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored threads.
    pub fn thread_count(&self) -> usize {
        self.tables.lock().map(|t| t.threads.len()).unwrap_or(0)
    }

    /// Number of stored comments.
    pub fn comment_count(&self) -> usize {
        self.tables.lock().map(|t| t.comments.len()).unwrap_or(0)
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> Result<T> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| AppError::storage("memory store lock poisoned"))?;
        Ok(f(&mut tables))
    }
}

#[async_trait]
impl ThreadStore for MemoryStore {
    async fn find_thread(&self, link: &str) -> Result<Option<Thread>> {
        self.with_tables(|t| t.threads.get(link).cloned())
    }

    async fn insert_thread(&self, thread: &Thread) -> Result<bool> {
        self.with_tables(|t| {
            if t.threads.contains_key(&thread.link) {
                return false;
            }
            t.threads.insert(thread.link.clone(), thread.clone());
            true
        })
    }

    async fn update_last_page(&self, link: &str, page: u32) -> Result<()> {
        self.with_tables(|t| {
            if let Some(thread) = t.threads.get_mut(link) {
                thread.last_page_fetched = thread.last_page_fetched.max(page);
            }
        })
    }

    async fn find_comment(&self, comment_id: &str) -> Result<Option<Comment>> {
        self.with_tables(|t| t.comments.get(comment_id).cloned())
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<bool> {
        self.with_tables(|t| {
            if t.comments.contains_key(&comment.comment_id) {
                return false;
            }
            t.comments
                .insert(comment.comment_id.clone(), comment.clone());
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn thread(link: &str, last_page: u32) -> Thread {
        let now = Utc::now();
        Thread {
            link: link.to_string(),
            domain: "lowendtalk".to_string(),
            category: "offers".to_string(),
            title: "t".to_string(),
            description: String::new(),
            creator: "alice".to_string(),
            publish_time: now,
            first_seen_time: now,
            last_page_fetched: last_page,
        }
    }

    fn comment(id: &str) -> Comment {
        let now = Utc::now();
        Comment {
            comment_id: id.to_string(),
            thread_link: "https://lowendtalk.com/discussion/1".to_string(),
            author: "bob".to_string(),
            role: None,
            message: "hello".to_string(),
            created_time: now,
            recorded_time: now,
            permalink: "https://lowendtalk.com/discussion/1/comment/1/#Comment_1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_thread_is_idempotent() {
        let store = MemoryStore::new();
        let link = "https://lowendtalk.com/discussion/1";

        assert!(store.insert_thread(&thread(link, 0)).await.unwrap());
        store.update_last_page(link, 3).await.unwrap();
        assert!(!store.insert_thread(&thread(link, 0)).await.unwrap());

        assert_eq!(store.thread_count(), 1);
        let stored = store.find_thread(link).await.unwrap().unwrap();
        assert_eq!(stored.last_page_fetched, 3);
    }

    #[tokio::test]
    async fn test_insert_comment_is_idempotent() {
        let store = MemoryStore::new();

        assert!(store.insert_comment(&comment("lowendtalk.com_1")).await.unwrap());
        assert!(!store.insert_comment(&comment("lowendtalk.com_1")).await.unwrap());

        assert_eq!(store.comment_count(), 1);
        assert!(store.comment_exists("lowendtalk.com_1").await.unwrap());
        assert!(!store.comment_exists("lowendtalk.com_2").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_last_page_never_decreases() {
        let store = MemoryStore::new();
        let link = "https://lowendtalk.com/discussion/2";
        store.insert_thread(&thread(link, 4)).await.unwrap();

        store.update_last_page(link, 2).await.unwrap();
        assert_eq!(store.find_thread(link).await.unwrap().unwrap().last_page_fetched, 4);

        store.update_last_page(link, 6).await.unwrap();
        assert_eq!(store.find_thread(link).await.unwrap().unwrap().last_page_fetched, 6);
    }
}
