//! Notification message templates.

use chrono::{DateTime, Utc};

use crate::models::{Comment, Thread};
use crate::utils::truncate_display;

/// Longest body or annotation shown in a message, in grapheme clusters.
pub const DISPLAY_LIMIT: usize = 200;

const TIME_FORMAT: &str = "%Y/%m/%d %H:%M";

/// Render the message announcing a new thread.
pub fn format_thread_message(thread: &Thread, annotation: &str) -> String {
    let mut out = format!(
        "{} new thread\nTitle: {}\nAuthor: {}\nTime: {}\n\n",
        thread.domain.to_uppercase(),
        thread.title,
        thread.creator,
        format_time(thread.publish_time),
    );
    push_block(&mut out, &thread.description);
    push_block(&mut out, annotation);
    out.push_str(&thread.link);
    out
}

/// Render the message announcing a new comment on `thread`.
pub fn format_comment_message(thread: &Thread, comment: &Comment, annotation: &str) -> String {
    let mut out = format!(
        "{} new comment\nThread: {}\nAuthor: {}\nTime: {}\n\n",
        thread.domain.to_uppercase(),
        thread.title,
        comment.author,
        format_time(comment.created_time),
    );
    push_block(&mut out, &comment.message);
    push_block(&mut out, annotation);
    out.push_str(&comment.permalink);
    out
}

fn push_block(out: &mut String, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    out.push_str(&truncate_display(text, DISPLAY_LIMIT));
    out.push_str("\n\n");
}

fn format_time(time: DateTime<Utc>) -> String {
    time.format(TIME_FORMAT).to_string()
}
