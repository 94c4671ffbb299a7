// src/services/pages.rs

//! Thread page scraper service.
//!
//! Fetches discussion pages and comment listings using configured CSS selectors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Comment, CrawlerConfig, ForumSelectors, Thread};
use crate::services::PageSource;
use crate::utils::http::{create_async_client, fetch_text};
use crate::utils::{get_host, normalize_whitespace, site_name, url_category};

/// Compiled form of [`ForumSelectors`].
#[derive(Debug, Clone)]
pub struct PageSelectors {
    title: Selector,
    creator: Selector,
    published: Selector,
    category: Selector,
    body: Selector,
    comment: Selector,
    comment_author: Selector,
    comment_role: Selector,
    comment_body: Selector,
    comment_time: Selector,
    comment_id: Regex,
}

impl PageSelectors {
    /// Compile every selector, failing on the first invalid one.
    pub fn compile(selectors: &ForumSelectors) -> Result<Self> {
        Ok(Self {
            title: parse_selector(&selectors.title_selector)?,
            creator: parse_selector(&selectors.creator_selector)?,
            published: parse_selector(&selectors.published_selector)?,
            category: parse_selector(&selectors.category_selector)?,
            body: parse_selector(&selectors.body_selector)?,
            comment: parse_selector(&selectors.comment_selector)?,
            comment_author: parse_selector(&selectors.comment_author_selector)?,
            comment_role: parse_selector(&selectors.comment_role_selector)?,
            comment_body: parse_selector(&selectors.comment_body_selector)?,
            comment_time: parse_selector(&selectors.comment_time_selector)?,
            comment_id: Regex::new(&selectors.comment_id_pattern)
                .map_err(|e| AppError::selector(&selectors.comment_id_pattern, e))?,
        })
    }
}

/// Service for scraping thread pages and their comment listings.
pub struct PageScraper {
    client: Client,
    selectors: PageSelectors,
}

impl PageScraper {
    /// Create a new page scraper with the given configuration.
    pub fn new(config: &CrawlerConfig, selectors: &ForumSelectors) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
            selectors: PageSelectors::compile(selectors)?,
        })
    }
}

#[async_trait]
impl PageSource for PageScraper {
    async fn fetch_thread(&self, url: &str) -> Result<Thread> {
        let html = fetch_text(&self.client, url).await?;
        parse_thread_page(&html, url, &self.selectors, Utc::now())
    }

    async fn fetch_comments(&self, url: &str, page: u32) -> Result<Vec<Comment>> {
        let page_url = comments_page_url(url, page);
        let html = fetch_text(&self.client, &page_url).await?;
        parse_comments(&html, url, &self.selectors, Utc::now())
    }
}

/// URL of the `page`-th comment listing of a thread.
pub fn comments_page_url(thread_url: &str, page: u32) -> String {
    format!("{}/p{}", thread_url.trim_end_matches('/'), page)
}

/// Parse a discussion page into a thread record.
pub fn parse_thread_page(
    html: &str,
    url: &str,
    selectors: &PageSelectors,
    now: DateTime<Utc>,
) -> Result<Thread> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let title = select_text(root, &selectors.title);
    if title.is_empty() {
        return Err(AppError::parse(url, "thread title not found"));
    }

    let domain = site_name(url).ok_or_else(|| AppError::parse(url, "thread URL has no host"))?;
    let category = Some(select_text(root, &selectors.category))
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| url_category(url));

    Ok(Thread {
        link: url.to_string(),
        domain,
        category,
        title,
        description: select_text(root, &selectors.body),
        creator: select_text(root, &selectors.creator),
        publish_time: select_datetime(root, &selectors.published).unwrap_or(now),
        first_seen_time: now,
        last_page_fetched: 0,
    })
}

/// Parse one comment listing page.
///
/// Items whose element id does not match the comment id pattern are skipped.
pub fn parse_comments(
    html: &str,
    thread_url: &str,
    selectors: &PageSelectors,
    now: DateTime<Utc>,
) -> Result<Vec<Comment>> {
    let host =
        get_host(thread_url).ok_or_else(|| AppError::parse(thread_url, "thread URL has no host"))?;
    let base = thread_url.trim_end_matches('/');
    let document = Html::parse_document(html);

    let comments = document
        .select(&selectors.comment)
        .filter_map(|item| {
            let local_id = item
                .value()
                .id()
                .and_then(|id| selectors.comment_id.captures(id))
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
                .filter(|n| !n.is_empty())?;

            let role = Some(select_text(item, &selectors.comment_role)).filter(|r| !r.is_empty());

            Some(Comment {
                comment_id: Comment::compose_id(&host, local_id),
                thread_link: thread_url.to_string(),
                author: select_text(item, &selectors.comment_author),
                role,
                message: select_text(item, &selectors.comment_body),
                created_time: select_datetime(item, &selectors.comment_time).unwrap_or(now),
                recorded_time: now,
                permalink: format!("{base}/comment/{local_id}/#Comment_{local_id}"),
            })
        })
        .collect();

    Ok(comments)
}

/// Text of the first match; adjacent text nodes are kept apart by a space.
fn select_text(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .next()
        .map(|el| normalize_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
        .unwrap_or_default()
}

fn select_datetime(scope: ElementRef<'_>, selector: &Selector) -> Option<DateTime<Utc>> {
    let raw = scope.select(selector).next()?.value().attr("datetime")?;
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
