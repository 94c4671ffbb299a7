//! Utility functions and helpers.

pub mod http;

use scraper::Html;
use unicode_segmentation::UnicodeSegmentation;
use url::Url;

/// Category used when a feed URL names none.
pub const DEFAULT_CATEGORY: &str = "offers";

/// Extract the host from a URL string.
pub fn get_host(url_str: &str) -> Option<String> {
    Url::parse(url_str)
        .ok()
        .and_then(|u| u.host_str().map(|s| s.to_lowercase()))
}

/// Short site name: the first label of the host (`lowendtalk` for `lowendtalk.com`).
pub fn site_name(url_str: &str) -> Option<String> {
    let host = get_host(url_str)?;
    let host = host.strip_prefix("www.").unwrap_or(&host);
    host.split('.').next().map(str::to_string)
}

/// Category segment following `/categories/` in a forum URL.
pub fn url_category(url_str: &str) -> String {
    let Ok(url) = Url::parse(url_str) else {
        return DEFAULT_CATEGORY.to_string();
    };
    let mut segments = url.path_segments().into_iter().flatten();
    while let Some(segment) = segments.next() {
        if segment == "categories" {
            if let Some(category) = segments.next().filter(|s| !s.is_empty()) {
                return category.to_string();
            }
        }
    }
    DEFAULT_CATEGORY.to_string()
}

/// Remove markup from an HTML fragment and collapse whitespace.
pub fn strip_html(fragment: &str) -> String {
    let document = Html::parse_fragment(fragment);
    let text = document.root_element().text().collect::<Vec<_>>().join(" ");
    normalize_whitespace(&text)
}

/// Collapse runs of whitespace into single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max` grapheme clusters, appending `...` when cut.
pub fn truncate_display(text: &str, max: usize) -> String {
    let mut graphemes = text.grapheme_indices(true);
    match graphemes.nth(max) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}
