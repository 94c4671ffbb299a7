//! Thread and comment records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Items older than this are stored but never notified about.
pub const RECENCY_WINDOW_HOURS: i64 = 24;

/// Whether `timestamp` falls inside the notification window ending at `now`.
pub fn within_recency_window(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(timestamp) <= Duration::hours(RECENCY_WINDOW_HOURS)
}

/// A discussion thread discovered from a feed or a direct URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Thread {
    /// Canonical thread URL, unique across the store
    pub link: String,

    /// Source site name (e.g. "lowendtalk")
    pub domain: String,

    /// Forum category
    pub category: String,

    /// Thread title
    pub title: String,

    /// Opening post text with markup stripped
    pub description: String,

    /// Author handle of the opening post
    pub creator: String,

    /// Publish time reported by the source
    pub publish_time: DateTime<Utc>,

    /// When the monitor first saw the thread
    pub first_seen_time: DateTime<Utc>,

    /// Highest comment page fully processed; 0 until the first walk
    #[serde(default)]
    pub last_page_fetched: u32,
}

impl Thread {
    /// Text handed to the classifier for this thread.
    pub fn classifier_text(&self) -> String {
        if self.description.is_empty() {
            return self.title.clone();
        }
        format!("{}\n\n{}", self.title, self.description)
    }

    pub fn is_recent(&self, now: DateTime<Utc>) -> bool {
        within_recency_window(self.publish_time, now)
    }
}

/// A single reply within a thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    /// `{host}_{site-local id}`, unique across the store
    pub comment_id: String,

    /// Link of the owning thread
    pub thread_link: String,

    /// Author handle
    pub author: String,

    /// Role badge shown next to the author, when the page has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Full comment text
    pub message: String,

    /// Creation time reported by the source
    pub created_time: DateTime<Utc>,

    /// When the monitor recorded the comment
    pub recorded_time: DateTime<Utc>,

    /// Direct link to the comment
    pub permalink: String,
}

impl Comment {
    /// Build the store key for a comment.
    pub fn compose_id(host: &str, local_id: &str) -> String {
        format!("{host}_{local_id}")
    }

    pub fn is_recent(&self, now: DateTime<Utc>) -> bool {
        within_recency_window(self.created_time, now)
    }
}
