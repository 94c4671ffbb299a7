//! In-process sources and channels for orchestrator tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::{AppError, Result};
use crate::models::{Comment, Thread};
use crate::notify::Notifier;
use crate::services::{FeedSource, PageSource};
use crate::storage::{MemoryStore, ThreadStore};

pub fn thread(link: &str, creator: &str, published: DateTime<Utc>) -> Thread {
    Thread {
        link: link.to_string(),
        domain: "lowendtalk".to_string(),
        category: "offers".to_string(),
        title: format!("Offer at {link}"),
        description: "1GB RAM".to_string(),
        creator: creator.to_string(),
        publish_time: published,
        first_seen_time: Utc::now(),
        last_page_fetched: 0,
    }
}

pub fn comment(thread_link: &str, n: u32, author: &str, created: DateTime<Utc>) -> Comment {
    Comment {
        comment_id: Comment::compose_id("lowendtalk.com", &n.to_string()),
        thread_link: thread_link.to_string(),
        author: author.to_string(),
        role: None,
        message: format!("comment {n}"),
        created_time: created,
        recorded_time: Utc::now(),
        permalink: format!("{thread_link}/comment/{n}/#Comment_{n}"),
    }
}

pub fn hours_ago(hours: i64) -> DateTime<Utc> {
    Utc::now() - Duration::hours(hours)
}

/// Feed source serving fixed thread lists.
#[derive(Default)]
pub struct FakeFeeds {
    feeds: HashMap<String, Vec<Thread>>,
    calls: AtomicUsize,
}

impl FakeFeeds {
    pub fn with_feed(mut self, url: &str, threads: Vec<Thread>) -> Self {
        self.feeds.insert(url.to_string(), threads);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for FakeFeeds {
    async fn fetch_feed(&self, url: &str) -> Result<Vec<Thread>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.feeds
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::crawl(url, "status 404 Not Found"))
    }
}

/// Page source serving fixed thread pages and comment pages.
///
/// Unknown comment pages come back empty; pages marked as failing error out.
#[derive(Default)]
pub struct FakePages {
    threads: HashMap<String, Thread>,
    pages: HashMap<(String, u32), Vec<Comment>>,
    failing: Vec<(String, u32)>,
    latency: Option<StdDuration>,
    requests: Mutex<Vec<(String, u32)>>,
}

impl FakePages {
    pub fn with_thread(mut self, thread: Thread) -> Self {
        self.threads.insert(thread.link.clone(), thread);
        self
    }

    pub fn with_page(mut self, link: &str, page: u32, comments: Vec<Comment>) -> Self {
        self.pages.insert((link.to_string(), page), comments);
        self
    }

    pub fn with_failing_page(mut self, link: &str, page: u32) -> Self {
        self.failing.push((link.to_string(), page));
        self
    }

    /// Delay every comment page by `latency`.
    pub fn with_latency(mut self, latency: StdDuration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Comment pages requested so far, in order.
    pub fn requests(&self) -> Vec<(String, u32)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for FakePages {
    async fn fetch_thread(&self, url: &str) -> Result<Thread> {
        self.threads
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::crawl(url, "status 404 Not Found"))
    }

    async fn fetch_comments(&self, url: &str, page: u32) -> Result<Vec<Comment>> {
        let key = (url.to_string(), page);
        self.requests.lock().unwrap().push(key.clone());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.contains(&key) {
            return Err(AppError::crawl(url, "status 503 Service Unavailable"));
        }
        Ok(self.pages.get(&key).cloned().unwrap_or_default())
    }
}

/// Notifier that keeps every message it is asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, message: &str) -> Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

/// Memory store with scripted one-off faults.
#[derive(Default)]
pub struct ScriptedStore {
    inner: MemoryStore,
    failing_comments: Mutex<HashSet<String>>,
    hidden_threads: Mutex<HashSet<String>>,
}

impl ScriptedStore {
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Fail the next insert of `comment_id`.
    pub fn fail_comment_once(&self, comment_id: &str) {
        self.failing_comments.lock().unwrap().insert(comment_id.to_string());
    }

    /// Report `link` as unknown on its next lookup, as if another writer
    /// stored it in between.
    pub fn hide_thread_once(&self, link: &str) {
        self.hidden_threads.lock().unwrap().insert(link.to_string());
    }
}

#[async_trait]
impl ThreadStore for ScriptedStore {
    async fn find_thread(&self, link: &str) -> Result<Option<Thread>> {
        if self.hidden_threads.lock().unwrap().remove(link) {
            return Ok(None);
        }
        self.inner.find_thread(link).await
    }

    async fn insert_thread(&self, thread: &Thread) -> Result<bool> {
        self.inner.insert_thread(thread).await
    }

    async fn update_last_page(&self, link: &str, page: u32) -> Result<()> {
        self.inner.update_last_page(link, page).await
    }

    async fn find_comment(&self, comment_id: &str) -> Result<Option<Comment>> {
        self.inner.find_comment(comment_id).await
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<bool> {
        if self.failing_comments.lock().unwrap().remove(&comment.comment_id) {
            return Err(AppError::storage("disk I/O error"));
        }
        self.inner.insert_comment(comment).await
    }
}
