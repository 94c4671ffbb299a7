// src/models/selectors.rs

//! CSS selectors for scraping forum thread pages.

use serde::{Deserialize, Serialize};

/// CSS selectors for a thread page and its comment listing.
///
/// Defaults match Vanilla-powered forums (LowEndTalk, LowEndSpirit).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForumSelectors {
    /// Thread title on the discussion page
    #[serde(default = "defaults::title")]
    pub title_selector: String,

    /// Username of the thread author
    #[serde(default = "defaults::creator")]
    pub creator_selector: String,

    /// Element carrying the thread publish time in its `datetime` attribute
    #[serde(default = "defaults::published")]
    pub published_selector: String,

    /// Category link of the thread
    #[serde(default = "defaults::category")]
    pub category_selector: String,

    /// Opening post body
    #[serde(default = "defaults::body")]
    pub body_selector: String,

    /// Each comment item on a listing page
    #[serde(default = "defaults::comment")]
    pub comment_selector: String,

    /// Author username within a comment
    #[serde(default = "defaults::comment_author")]
    pub comment_author_selector: String,

    /// Role badge within a comment
    #[serde(default = "defaults::comment_role")]
    pub comment_role_selector: String,

    /// Message body within a comment
    #[serde(default = "defaults::comment_body")]
    pub comment_body_selector: String,

    /// Element carrying the comment time in its `datetime` attribute
    #[serde(default = "defaults::comment_time")]
    pub comment_time_selector: String,

    /// Regex over a comment element's `id`; group 1 is the site-local comment id
    #[serde(default = "defaults::comment_id_pattern")]
    pub comment_id_pattern: String,
}

impl Default for ForumSelectors {
    fn default() -> Self {
        Self {
            title_selector: defaults::title(),
            creator_selector: defaults::creator(),
            published_selector: defaults::published(),
            category_selector: defaults::category(),
            body_selector: defaults::body(),
            comment_selector: defaults::comment(),
            comment_author_selector: defaults::comment_author(),
            comment_role_selector: defaults::comment_role(),
            comment_body_selector: defaults::comment_body(),
            comment_time_selector: defaults::comment_time(),
            comment_id_pattern: defaults::comment_id_pattern(),
        }
    }
}

mod defaults {
    pub fn title() -> String {
        "#Item_0.PageTitle h1".into()
    }
    pub fn creator() -> String {
        "div.Item-Header.DiscussionHeader .Author .Username".into()
    }
    pub fn published() -> String {
        "div.Item-Header.DiscussionHeader time".into()
    }
    pub fn category() -> String {
        "div.Item-Header.DiscussionHeader .Category a".into()
    }
    pub fn body() -> String {
        ".Message.userContent".into()
    }
    pub fn comment() -> String {
        "li.ItemComment".into()
    }
    pub fn comment_author() -> String {
        "a.Username".into()
    }
    pub fn comment_role() -> String {
        "span.RoleTitle".into()
    }
    pub fn comment_body() -> String {
        "div.Message".into()
    }
    pub fn comment_time() -> String {
        "time".into()
    }
    pub fn comment_id_pattern() -> String {
        r"^Comment_(\d+)$".into()
    }
}
