//! Source adapters.
//!
//! This module contains the fetchers that turn forum sources into
//! [`Thread`] and [`Comment`] records:
//! - Feed reading (`FeedReader`)
//! - Thread and comment page scraping (`PageScraper`)

mod feed;
mod pages;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Comment, Thread};

pub use feed::{FeedReader, parse_feed};
pub use pages::{PageScraper, PageSelectors, comments_page_url, parse_comments, parse_thread_page};

/// Turns a feed URL into a bounded list of candidate threads.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_feed(&self, url: &str) -> Result<Vec<Thread>>;
}

/// Turns a thread URL into its metadata or one page of its comments.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_thread(&self, url: &str) -> Result<Thread>;

    /// An error or an empty list both mean there are no more pages.
    async fn fetch_comments(&self, url: &str, page: u32) -> Result<Vec<Comment>>;
}
