//! Web search engines reachable by voice

use serde::{Deserialize, Serialize};

/// Placeholder replaced by the spoken query in `url_template`
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// A search engine triggered when an utterance starts with one of its trigger words
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEngine {
    /// Display name used in output messages
    pub name: String,

    /// Trigger words, checked in order (case-insensitive prefix match)
    pub triggers: Vec<String>,

    /// URL with a `{query}` placeholder
    pub url_template: String,
}

impl SearchEngine {
    pub fn new<I, S>(name: impl Into<String>, triggers: I, url_template: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            triggers: triggers.into_iter().map(Into::into).collect(),
            url_template: url_template.into(),
        }
    }
}

pub fn default_search_engines() -> Vec<SearchEngine> {
    vec![
        SearchEngine::new(
            "AI",
            ["搜索", "search"],
            "https://www.perplexity.ai/search?q={query}",
        ),
        SearchEngine::new(
            "Google",
            ["谷歌搜索", "查找", "google"],
            "https://www.google.com/search?q={query}",
        ),
    ]
}
