// src/pipeline/eligibility.rs

//! Comment eligibility policy.
//!
//! Runs after a comment is stored and before the filter pipeline, so every
//! comment is persisted but only eligible ones can produce a notification.

use crate::models::{Comment, CommentFilter, Thread};

impl CommentFilter {
    /// Whether `comment` on `thread` may be considered for notification.
    pub fn admits(&self, thread: &Thread, comment: &Comment) -> bool {
        match self {
            CommentFilter::ByAuthor => comment.author == thread.creator,
            // `comment.role` is captured for this policy but not yet consulted
            CommentFilter::ByRole => true,
            CommentFilter::All => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn thread() -> Thread {
        let now = Utc::now();
        Thread {
            link: "https://lowendtalk.com/discussion/1/x".into(),
            domain: "lowendtalk".into(),
            category: "offers".into(),
            title: "t".into(),
            description: String::new(),
            creator: "alice".into(),
            publish_time: now,
            first_seen_time: now,
            last_page_fetched: 0,
        }
    }

    fn comment(author: &str, role: Option<&str>) -> Comment {
        let now = Utc::now();
        Comment {
            comment_id: "lowendtalk.com_1".into(),
            thread_link: "https://lowendtalk.com/discussion/1/x".into(),
            author: author.into(),
            role: role.map(str::to_string),
            message: "m".into(),
            created_time: now,
            recorded_time: now,
            permalink: String::new(),
        }
    }

    #[test]
    fn test_by_author_admits_creator_only() {
        assert!(CommentFilter::ByAuthor.admits(&thread(), &comment("alice", None)));
        assert!(!CommentFilter::ByAuthor.admits(&thread(), &comment("bob", None)));
    }

    #[test]
    fn test_by_role_and_all_admit_everyone() {
        for policy in [CommentFilter::ByRole, CommentFilter::All] {
            assert!(policy.admits(&thread(), &comment("bob", None)));
            assert!(policy.admits(&thread(), &comment("carol", Some("Member"))));
        }
    }
}
