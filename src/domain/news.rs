//! News headlines and the merge step across sources.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsItem {
    /// Publication time as reported upstream, e.g. `2024-03-01 09:30`.
    pub date: String,
    pub title: String,
    /// Name of the source that produced the item.
    pub source: String,
}

impl NewsItem {
    pub fn new(date: impl Into<String>, title: impl Into<String>, source: &str) -> Self {
        Self {
            date: date.into(),
            title: title.into(),
            source: source.to_string(),
        }
    }
}

/// Drop items whose title has already been seen. First occurrence wins and
/// insertion order is kept.
pub fn dedupe_by_title(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.title.clone()))
        .collect()
}

/// Items whose title contains any of the given keywords.
pub fn risk_alerts<'a>(items: &'a [NewsItem], keywords: &[String]) -> Vec<&'a NewsItem> {
    items
        .iter()
        .filter(|item| keywords.iter().any(|k| !k.is_empty() && item.title.contains(k.as_str())))
        .collect()
}

pub const DEFAULT_RISK_KEYWORDS: &[&str] = &["减持", "问询函", "诉讼", "亏损", "下修", "退市"];
