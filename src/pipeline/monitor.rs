// src/pipeline/monitor.rs

//! Incremental crawl orchestrator.
//!
//! One cycle walks the direct thread URLs, then the feeds:
//!
//! ```text
//! candidate thread ─► known? ──yes──────────────────────────┐
//!                       │no                                  │
//!                       ▼                                    ▼
//!                 insert ─► recent? ─► filters ─► notify   walk comment pages
//!                                                            │ cursor, cursor+1, ...
//!                                                            ▼
//!       comment ─► known? ─► insert ─► eligible? ─► recent? ─► filters ─► notify
//! ```
//!
//! Every failure is confined to the item it happened on; a cycle never fails
//! as a whole.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::filter::{FilterPipeline, Verdict};
use crate::models::{Comment, Config, CycleReport, Thread};
use crate::notify::{Notifier, build_notifier};
use crate::services::{FeedReader, FeedSource, PageScraper, PageSource};
use crate::storage::ThreadStore;

/// Settings, filters and channel used by one cycle.
///
/// Cycles hold an `Arc` to the snapshot they started with, so a swap never
/// affects a cycle in flight.
pub struct ActiveState {
    pub config: Config,
    pub filters: FilterPipeline,
    pub notifier: Arc<dyn Notifier>,
}

impl ActiveState {
    /// Validate `config` and build its filters and channel.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
            filters: FilterPipeline::from_config(&config.filter)?,
            notifier: build_notifier(&config.notifier)?,
        })
    }

    /// Assemble a state from prebuilt parts, skipping validation.
    pub fn new(config: Config, filters: FilterPipeline, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config,
            filters,
            notifier,
        }
    }
}

/// The crawl orchestrator.
pub struct Monitor {
    store: Arc<dyn ThreadStore>,
    feeds: Arc<dyn FeedSource>,
    pages: Arc<dyn PageSource>,
    active: RwLock<Arc<ActiveState>>,
}

impl Monitor {
    pub fn new(
        store: Arc<dyn ThreadStore>,
        feeds: Arc<dyn FeedSource>,
        pages: Arc<dyn PageSource>,
        state: ActiveState,
    ) -> Self {
        Self {
            store,
            feeds,
            pages,
            active: RwLock::new(Arc::new(state)),
        }
    }

    /// Build a monitor with HTTP sources from `config`.
    pub fn from_config(config: &Config, store: Arc<dyn ThreadStore>) -> Result<Self> {
        let state = ActiveState::from_config(config)?;
        let feeds = Arc::new(FeedReader::new(&config.crawler)?);
        let pages = Arc::new(PageScraper::new(&config.crawler, &config.selectors)?);
        Ok(Self::new(store, feeds, pages, state))
    }

    /// The state the next cycle will use.
    pub async fn snapshot(&self) -> Arc<ActiveState> {
        Arc::clone(&*self.active.read().await)
    }

    /// Interval between cycles under the active configuration.
    pub async fn frequency(&self) -> Duration {
        self.snapshot().await.config.monitor.frequency()
    }

    /// Apply `config` from the next cycle on.
    ///
    /// The new state is fully built before the lock is taken; if validation or
    /// construction fails the active state is left untouched. Crawler,
    /// selector and storage settings are bound to the sources and store and
    /// only change on restart.
    pub async fn reconfigure(&self, config: &Config) -> Result<()> {
        let state = ActiveState::from_config(config)?;
        self.swap(state).await;
        log::info!("Configuration reloaded; applies from the next cycle");
        Ok(())
    }

    /// Replace the active state.
    pub async fn swap(&self, state: ActiveState) {
        *self.active.write().await = Arc::new(state);
    }

    /// Run one full pass over direct thread URLs and feeds.
    pub async fn run_cycle(&self) -> CycleReport {
        let state = self.snapshot().await;
        let monitor = &state.config.monitor;
        let started = Instant::now();
        let mut report = CycleReport::default();

        log::info!(
            "Cycle started: {} direct threads, {} feeds{}",
            monitor.extra_urls.len(),
            monitor.urls.len(),
            if monitor.only_extra { " (skipped)" } else { "" }
        );

        for (i, url) in monitor.extra_urls.iter().enumerate() {
            if i > 0 {
                pace(state.config.crawler.direct_thread_delay_ms).await;
            }
            self.process_direct(&state, url, &mut report).await;
        }

        if !monitor.only_extra {
            for (i, url) in monitor.urls.iter().enumerate() {
                if i > 0 {
                    pace(state.config.crawler.feed_delay_ms).await;
                }
                self.process_feed(&state, url, &mut report).await;
            }
        }

        log::info!(
            "Cycle finished in {:.1}s: {}",
            started.elapsed().as_secs_f64(),
            report
        );
        report
    }

    async fn process_direct(&self, state: &ActiveState, url: &str, report: &mut CycleReport) {
        report.threads_seen += 1;

        let thread = match self.store.find_thread(url).await {
            Ok(Some(stored)) => stored,
            Ok(None) => match self.pages.fetch_thread(url).await {
                Ok(fetched) => match self.admit_thread(state, fetched, report).await {
                    Some(thread) => thread,
                    None => return,
                },
                Err(e) => {
                    report.failures += 1;
                    log::warn!("Failed to fetch thread page {}: {}", url, e);
                    return;
                }
            },
            Err(e) => {
                report.failures += 1;
                log::warn!("Failed to look up thread {}: {}", url, e);
                return;
            }
        };

        self.walk_comments(state, &thread, report).await;
    }

    async fn process_feed(&self, state: &ActiveState, url: &str, report: &mut CycleReport) {
        let threads = match self.feeds.fetch_feed(url).await {
            Ok(threads) => threads,
            Err(e) => {
                report.failures += 1;
                log::warn!("Failed to read feed {}: {}", url, e);
                return;
            }
        };

        let limit = state.config.crawler.feed_item_limit;
        for (i, candidate) in threads.into_iter().take(limit).enumerate() {
            if i > 0 {
                pace(state.config.crawler.feed_thread_delay_ms).await;
            }
            report.threads_seen += 1;

            let thread = match self.store.find_thread(&candidate.link).await {
                Ok(Some(stored)) => stored,
                Ok(None) => match self.admit_thread(state, candidate, report).await {
                    Some(thread) => thread,
                    None => continue,
                },
                Err(e) => {
                    report.failures += 1;
                    log::warn!("Failed to look up thread {}: {}", candidate.link, e);
                    continue;
                }
            };

            self.walk_comments(state, &thread, report).await;
        }
    }

    /// Store a newly discovered thread and notify about it when due.
    ///
    /// Returns the thread to walk, or `None` when it could not be stored.
    async fn admit_thread(
        &self,
        state: &ActiveState,
        thread: Thread,
        report: &mut CycleReport,
    ) -> Option<Thread> {
        match self.store.insert_thread(&thread).await {
            Ok(true) => {
                report.threads_inserted += 1;
                log::info!("New thread: {} ({})", thread.title, thread.link);
            }
            Ok(false) => {
                log::debug!("Thread {} was stored concurrently", thread.link);
                return match self.store.find_thread(&thread.link).await {
                    Ok(Some(stored)) => Some(stored),
                    Ok(None) => Some(thread),
                    Err(e) => {
                        report.failures += 1;
                        log::warn!("Failed to look up thread {}: {}", thread.link, e);
                        None
                    }
                };
            }
            Err(e) => {
                report.failures += 1;
                log::warn!("Failed to store thread {}: {}", thread.link, e);
                return None;
            }
        }

        if !thread.is_recent(Utc::now()) {
            log::debug!("Thread {} is outside the recency window", thread.link);
            return Some(thread);
        }

        if let Verdict::Publish(annotation) = state.filters.check_thread(&thread).await {
            match state.notifier.send_thread(&thread, &annotation).await {
                Ok(()) => report.notifications_sent += 1,
                Err(e) => {
                    report.failures += 1;
                    log::warn!("Failed to notify about thread {}: {}", thread.link, e);
                }
            }
        }

        Some(thread)
    }

    /// Walk comment pages from the stored cursor until the source runs dry.
    async fn walk_comments(&self, state: &ActiveState, thread: &Thread, report: &mut CycleReport) {
        let crawler = &state.config.crawler;
        let stored = thread.last_page_fetched;
        let first = stored.max(1);
        let mut last_done = stored;
        let mut page = first;

        loop {
            if crawler.max_pages_per_cycle > 0 && page - first >= crawler.max_pages_per_cycle {
                log::warn!(
                    "Page ceiling of {} reached for {}; resuming next cycle",
                    crawler.max_pages_per_cycle,
                    thread.link
                );
                break;
            }

            let comments = match self.pages.fetch_comments(&thread.link, page).await {
                Ok(comments) if comments.is_empty() => {
                    log::debug!("No comments on page {} of {}", page, thread.link);
                    break;
                }
                Ok(comments) => comments,
                Err(e) => {
                    log::debug!("Comment walk of {} ended at page {}: {}", thread.link, page, e);
                    break;
                }
            };

            report.pages_walked += 1;
            let mut recorded = true;
            for comment in &comments {
                if !self.process_comment(state, thread, comment, report).await {
                    recorded = false;
                    break;
                }
            }
            if !recorded {
                log::warn!(
                    "Page {} of {} not fully recorded; it will be read again next cycle",
                    page,
                    thread.link
                );
                break;
            }

            last_done = page;
            page += 1;
            pace(crawler.page_delay_ms).await;
        }

        if last_done > stored {
            if let Err(e) = self.store.update_last_page(&thread.link, last_done).await {
                report.failures += 1;
                log::warn!("Failed to save cursor for {}: {}", thread.link, e);
            }
        }
    }

    /// Record one comment and notify about it when due.
    ///
    /// Returns `false` when the store could not confirm the comment is
    /// recorded; the page holding it must not count as processed.
    async fn process_comment(
        &self,
        state: &ActiveState,
        thread: &Thread,
        comment: &Comment,
        report: &mut CycleReport,
    ) -> bool {
        match self.store.comment_exists(&comment.comment_id).await {
            Ok(true) => return true,
            Ok(false) => {}
            Err(e) => {
                report.failures += 1;
                log::warn!("Failed to look up comment {}: {}", comment.comment_id, e);
                return false;
            }
        }

        match self.store.insert_comment(comment).await {
            Ok(true) => report.comments_inserted += 1,
            Ok(false) => return true,
            Err(e) => {
                report.failures += 1;
                log::warn!("Failed to store comment {}: {}", comment.comment_id, e);
                return false;
            }
        }

        if !state.config.monitor.comment_filter.admits(thread, comment) {
            return true;
        }
        if !comment.is_recent(Utc::now()) {
            log::debug!("Comment {} is outside the recency window", comment.comment_id);
            return true;
        }

        if let Verdict::Publish(annotation) = state.filters.check_comment(comment).await {
            match state.notifier.send_comment(thread, comment, &annotation).await {
                Ok(()) => report.notifications_sent += 1,
                Err(e) => {
                    report.failures += 1;
                    log::warn!("Failed to notify about comment {}: {}", comment.comment_id, e);
                }
            }
        }
        true
    }
}

async fn pace(delay_ms: u64) {
    if delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}
