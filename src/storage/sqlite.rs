//! SQLite store.
//!
//! Persists threads and comments in a single database file so dedup state and
//! pagination cursors survive restarts. rusqlite is synchronous, so every
//! operation runs on the blocking pool behind a shared connection.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::{AppError, Result};
use crate::models::{Comment, Thread};
use crate::storage::ThreadStore;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS threads (
    link              TEXT PRIMARY KEY NOT NULL,
    domain            TEXT NOT NULL,
    category          TEXT NOT NULL,
    title             TEXT NOT NULL,
    description       TEXT NOT NULL,
    creator           TEXT NOT NULL,
    publish_time      TEXT NOT NULL,
    first_seen_time   TEXT NOT NULL,
    last_page         INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id        TEXT PRIMARY KEY NOT NULL,
    thread_link       TEXT NOT NULL,
    author            TEXT NOT NULL,
    role              TEXT,
    message           TEXT NOT NULL,
    created_time      TEXT NOT NULL,
    recorded_time     TEXT NOT NULL,
    permalink         TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_comments_thread ON comments(thread_link);
CREATE INDEX IF NOT EXISTS idx_threads_publish ON threads(publish_time);
"#;

const THREAD_COLUMNS: &str = "link, domain, category, title, description, creator, \
                              publish_time, first_seen_time, last_page";

const COMMENT_COLUMNS: &str = "comment_id, thread_link, author, role, message, \
                               created_time, recorded_time, permalink";

/// SQLite-backed thread store.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let journal_mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        if !journal_mode.eq_ignore_ascii_case("wal") {
            log::warn!(
                "SQLite kept journal_mode '{}' for {}",
                journal_mode,
                path.display()
            );
        }
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;

        Self::with_schema(conn)
    }

    /// Private database, mostly for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_schema(Connection::open_in_memory()?)
    }

    fn with_schema(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| AppError::storage("sqlite connection lock poisoned"))?;
            op(&conn)
        })
        .await
        .map_err(|e| AppError::storage(format!("blocking task failed: {e}")))?
    }
}

#[async_trait]
impl ThreadStore for SqliteStore {
    async fn find_thread(&self, link: &str) -> Result<Option<Thread>> {
        let link = link.to_string();
        self.run(move |conn| {
            let raw = conn
                .query_row(
                    &format!("SELECT {THREAD_COLUMNS} FROM threads WHERE link = ?1"),
                    params![link],
                    RawThread::from_row,
                )
                .optional()?;
            raw.map(RawThread::into_thread).transpose()
        })
        .await
    }

    async fn insert_thread(&self, thread: &Thread) -> Result<bool> {
        let thread = thread.clone();
        self.run(move |conn| {
            let changed = conn.execute(
                &format!(
                    "INSERT OR IGNORE INTO threads ({THREAD_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                ),
                params![
                    thread.link,
                    thread.domain,
                    thread.category,
                    thread.title,
                    thread.description,
                    thread.creator,
                    thread.publish_time.to_rfc3339(),
                    thread.first_seen_time.to_rfc3339(),
                    thread.last_page_fetched,
                ],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn update_last_page(&self, link: &str, page: u32) -> Result<()> {
        let link = link.to_string();
        self.run(move |conn| {
            conn.execute(
                "UPDATE threads SET last_page = ?1 WHERE link = ?2 AND last_page < ?1",
                params![page, link],
            )?;
            Ok(())
        })
        .await
    }

    async fn find_comment(&self, comment_id: &str) -> Result<Option<Comment>> {
        let comment_id = comment_id.to_string();
        self.run(move |conn| {
            let raw = conn
                .query_row(
                    &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE comment_id = ?1"),
                    params![comment_id],
                    RawComment::from_row,
                )
                .optional()?;
            raw.map(RawComment::into_comment).transpose()
        })
        .await
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<bool> {
        let comment = comment.clone();
        self.run(move |conn| {
            let changed = conn.execute(
                &format!(
                    "INSERT OR IGNORE INTO comments ({COMMENT_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
                ),
                params![
                    comment.comment_id,
                    comment.thread_link,
                    comment.author,
                    comment.role,
                    comment.message,
                    comment.created_time.to_rfc3339(),
                    comment.recorded_time.to_rfc3339(),
                    comment.permalink,
                ],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn comment_exists(&self, comment_id: &str) -> Result<bool> {
        let comment_id = comment_id.to_string();
        self.run(move |conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM comments WHERE comment_id = ?1",
                    params![comment_id],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }
}

/// Thread row with timestamps still in text form.
struct RawThread {
    link: String,
    domain: String,
    category: String,
    title: String,
    description: String,
    creator: String,
    publish_time: String,
    first_seen_time: String,
    last_page: u32,
}

impl RawThread {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            link: row.get(0)?,
            domain: row.get(1)?,
            category: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            creator: row.get(5)?,
            publish_time: row.get(6)?,
            first_seen_time: row.get(7)?,
            last_page: row.get(8)?,
        })
    }

    fn into_thread(self) -> Result<Thread> {
        Ok(Thread {
            publish_time: parse_timestamp(&self.publish_time)?,
            first_seen_time: parse_timestamp(&self.first_seen_time)?,
            link: self.link,
            domain: self.domain,
            category: self.category,
            title: self.title,
            description: self.description,
            creator: self.creator,
            last_page_fetched: self.last_page,
        })
    }
}

struct RawComment {
    comment_id: String,
    thread_link: String,
    author: String,
    role: Option<String>,
    message: String,
    created_time: String,
    recorded_time: String,
    permalink: String,
}

impl RawComment {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            comment_id: row.get(0)?,
            thread_link: row.get(1)?,
            author: row.get(2)?,
            role: row.get(3)?,
            message: row.get(4)?,
            created_time: row.get(5)?,
            recorded_time: row.get(6)?,
            permalink: row.get(7)?,
        })
    }

    fn into_comment(self) -> Result<Comment> {
        Ok(Comment {
            created_time: parse_timestamp(&self.created_time)?,
            recorded_time: parse_timestamp(&self.recorded_time)?,
            comment_id: self.comment_id,
            thread_link: self.thread_link,
            author: self.author,
            role: self.role,
            message: self.message,
            permalink: self.permalink,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::storage(format!("bad stored timestamp '{raw}': {e}")))
}
