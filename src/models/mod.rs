// src/models/mod.rs

//! Domain models for the monitor.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

use std::fmt;

mod config;
mod selectors;
mod thread;

// Re-export all public types
pub use config::{
    AiConfig, AiProvider, CommentFilter, Config, CrawlerConfig, FilterConfig, LoggingConfig,
    MIN_FREQUENCY_SECS, MonitorConfig, NoticeKind, NotifierConfig, StorageBackend, StorageConfig,
};
pub use selectors::ForumSelectors;
pub use thread::{Comment, RECENCY_WINDOW_HOURS, Thread, within_recency_window};

/// Summary of one crawl cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Threads returned by feeds or direct URLs
    pub threads_seen: usize,
    /// Threads stored for the first time
    pub threads_inserted: usize,
    /// Comment pages that returned at least one comment
    pub pages_walked: usize,
    /// Comments stored for the first time
    pub comments_inserted: usize,
    /// Messages handed to the notifier successfully
    pub notifications_sent: usize,
    /// Items skipped because of a fetch, parse, store or delivery error
    pub failures: usize,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "threads {} seen / {} new, pages {}, comments {} new, notifications {}, failures {}",
            self.threads_seen,
            self.threads_inserted,
            self.pages_walked,
            self.comments_inserted,
            self.notifications_sent,
            self.failures
        )
    }
}
