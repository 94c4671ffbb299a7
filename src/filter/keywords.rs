//! Keyword rule matcher.
//!
//! A rule is a comma separated list of OR-groups; each group is a `+` joined
//! list of substrings that must all appear. `"nvme+ssd,restock"` reads as
//! `(nvme AND ssd) OR restock`. Matching is case-insensitive.

/// Compiled keyword rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordFilter {
    groups: Vec<Vec<String>>,
}

impl KeywordFilter {
    pub fn new(rule: &str) -> Self {
        let groups = rule
            .split(',')
            .map(|group| {
                group
                    .split('+')
                    .map(|kw| kw.trim().to_lowercase())
                    .filter(|kw| !kw.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|group| !group.is_empty())
            .collect();
        Self { groups }
    }

    /// An empty rule never matches.
    pub fn matches(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let text = text.to_lowercase();
        self.groups
            .iter()
            .any(|group| group.iter().all(|kw| text.contains(kw.as_str())))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
