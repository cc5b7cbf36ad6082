//! Built-in intents, checked before the user's keyword table.
//!
//! Priority is fixed: web search (prefix trigger), then browser actions
//! (phrase sets, in [`BROWSER_PHRASES`] order), then closing the foreground
//! program.

use std::fmt;

use super::EngineError;
use crate::KeyChord;
use crate::config::SearchEngine;

/// Browser shortcuts reachable by voice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserAction {
    CloseTab,
    NewTab,
    Refresh,
    Back,
    Forward,
}

impl BrowserAction {
    /// Key chord sent to the focused browser
    pub fn chord(self) -> KeyChord {
        match self {
            BrowserAction::CloseTab => KeyChord::new(["ctrl", "w"]),
            BrowserAction::NewTab => KeyChord::new(["ctrl", "t"]),
            BrowserAction::Refresh => KeyChord::new(["f5"]),
            BrowserAction::Back => KeyChord::new(["alt", "left"]),
            BrowserAction::Forward => KeyChord::new(["alt", "right"]),
        }
    }
}

impl fmt::Display for BrowserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowserAction::CloseTab => write!(f, "close tab"),
            BrowserAction::NewTab => write!(f, "new tab"),
            BrowserAction::Refresh => write!(f, "refresh"),
            BrowserAction::Back => write!(f, "back"),
            BrowserAction::Forward => write!(f, "forward"),
        }
    }
}

/// Phrase sets for browser actions. Checked top to bottom; the first set
/// with a phrase contained in the utterance wins.
pub const BROWSER_PHRASES: &[(BrowserAction, &[&str])] = &[
    (BrowserAction::CloseTab, &["关闭标签页", "关闭网页", "close tab"]),
    (BrowserAction::NewTab, &["新建标签页", "打开新标签页", "new tab"]),
    (BrowserAction::Refresh, &["刷新网页", "刷新页面", "refresh page"]),
    (BrowserAction::Back, &["后退", "返回上一页", "go back"]),
    (BrowserAction::Forward, &["前进", "下一页", "go forward"]),
];

/// Phrases that close the foreground program
pub const CLOSE_FOREGROUND_PHRASES: &[&str] =
    &["关闭当前程序", "关闭程序", "close current program", "close program"];

/// A built-in, non-configurable command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    SearchWeb {
        /// Engine display name
        engine: String,
        template: String,
        query: String,
    },
    Browser(BrowserAction),
    CloseForeground,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::SearchWeb { engine, query, .. } => write!(f, "{engine} search: {query}"),
            Intent::Browser(action) => write!(f, "browser {action}"),
            Intent::CloseForeground => write!(f, "close foreground program"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IntentRouter {
    engines: Vec<SearchEngine>,
}

impl IntentRouter {
    pub fn new(engines: Vec<SearchEngine>) -> Self {
        Self { engines }
    }

    /// Check `text` against the built-in intents.
    ///
    /// Returns `Ok(None)` when nothing matches and the keyword table should
    /// be consulted. A search trigger without a query is an error, not a
    /// fall-through.
    pub fn route(&self, text: &str) -> Result<Option<Intent>, EngineError> {
        let trimmed = text.trim();
        let lower = trimmed.to_lowercase();

        for engine in &self.engines {
            for trigger in &engine.triggers {
                if trigger.trim().is_empty() {
                    continue;
                }
                if let Some(rest) = strip_trigger(trimmed, trigger.trim()) {
                    let query = rest.trim();
                    if query.is_empty() {
                        return Err(EngineError::EmptyQuery {
                            trigger: trigger.clone(),
                        });
                    }
                    return Ok(Some(Intent::SearchWeb {
                        engine: engine.name.clone(),
                        template: engine.url_template.clone(),
                        query: query.to_string(),
                    }));
                }
            }
        }

        for (action, phrases) in BROWSER_PHRASES {
            if phrases.iter().any(|phrase| lower.contains(phrase)) {
                return Ok(Some(Intent::Browser(*action)));
            }
        }

        if CLOSE_FOREGROUND_PHRASES
            .iter()
            .any(|phrase| lower.contains(phrase))
        {
            return Ok(Some(Intent::CloseForeground));
        }

        Ok(None)
    }
}

/// Strip a search trigger from the start of `text`.
///
/// A trigger ending in an ASCII letter or digit only counts as a whole word:
/// "search cats" matches "search", "searchlight" does not.
fn strip_trigger<'a>(text: &'a str, trigger: &str) -> Option<&'a str> {
    let rest = strip_prefix_ignore_case(text, trigger)?;
    let word_trigger = trigger
        .chars()
        .last()
        .is_some_and(|c| c.is_ascii_alphanumeric());
    let glued = rest.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
    if word_trigger && glued { None } else { Some(rest) }
}

/// Strip `prefix` from the start of `text`, comparing lower-cased.
///
/// Works on whole characters of `text`, so the returned rest always starts
/// on a char boundary of the original even when lower-casing changes lengths.
fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let prefix = prefix.to_lowercase();
    let mut consumed = String::new();

    for (idx, ch) in text.char_indices() {
        if consumed == prefix {
            return Some(&text[idx..]);
        }
        consumed.extend(ch.to_lowercase());
        if !prefix.starts_with(&consumed) {
            return None;
        }
    }

    (consumed == prefix).then_some("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_search_engines;

    fn router() -> IntentRouter {
        IntentRouter::new(default_search_engines())
    }

    #[test]
    fn test_search_extracts_query() {
        let intent = router().route("搜索 猫咪图片").unwrap();
        assert_eq!(
            intent,
            Some(Intent::SearchWeb {
                engine: "AI".to_string(),
                template: "https://www.perplexity.ai/search?q={query}".to_string(),
                query: "猫咪图片".to_string(),
            })
        );
    }

    #[test]
    fn test_second_engine_triggers() {
        let router = router();
        for text in ["谷歌搜索 rust", "查找rust", "Google rust"] {
            match router.route(text).unwrap() {
                Some(Intent::SearchWeb { engine, query, .. }) => {
                    assert_eq!(engine, "Google");
                    assert_eq!(query, "rust");
                }
                other => panic!("unexpected route for {text}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_search_query_keeps_original_case() {
        match router().route("  SEARCH Rust Lang  ").unwrap() {
            Some(Intent::SearchWeb { query, .. }) => assert_eq!(query, "Rust Lang"),
            other => panic!("unexpected route: {other:?}"),
        }
    }

    #[test]
    fn test_empty_query_is_an_error() {
        assert_eq!(
            router().route("搜索   "),
            Err(EngineError::EmptyQuery {
                trigger: "搜索".to_string()
            })
        );
    }

    #[test]
    fn test_browser_close_tab() {
        let intent = router().route("关闭网页").unwrap();
        assert_eq!(intent, Some(Intent::Browser(BrowserAction::CloseTab)));
        assert_eq!(BrowserAction::CloseTab.chord(), KeyChord::new(["ctrl", "w"]));
    }

    #[test]
    fn test_browser_sets_checked_in_order() {
        // contains both a new-tab phrase and a back phrase: new tab comes first
        let intent = router().route("打开新标签页然后后退").unwrap();
        assert_eq!(intent, Some(Intent::Browser(BrowserAction::NewTab)));
    }

    #[test]
    fn test_close_foreground() {
        assert_eq!(
            router().route("帮我关闭当前程序").unwrap(),
            Some(Intent::CloseForeground)
        );
        assert_eq!(router().route("关闭程序").unwrap(), Some(Intent::CloseForeground));
    }

    #[test]
    fn test_search_beats_browser_phrases() {
        match router().route("搜索 关闭网页").unwrap() {
            Some(Intent::SearchWeb { query, .. }) => assert_eq!(query, "关闭网页"),
            other => panic!("unexpected route: {other:?}"),
        }
    }

    #[test]
    fn test_no_intent() {
        assert_eq!(router().route("打开浏览器").unwrap(), None);
        assert_eq!(router().route("").unwrap(), None);
    }

    #[test]
    fn test_ascii_trigger_needs_word_boundary() {
        assert_eq!(router().route("searchlight").unwrap(), None);
        assert_eq!(router().route("googledocs").unwrap(), None);
        match router().route("search: rust").unwrap() {
            Some(Intent::SearchWeb { query, .. }) => assert_eq!(query, ": rust"),
            other => panic!("unexpected route: {other:?}"),
        }
        // CJK triggers glue directly onto the query
        match router().route("搜索猫咪").unwrap() {
            Some(Intent::SearchWeb { query, .. }) => assert_eq!(query, "猫咪"),
            other => panic!("unexpected route: {other:?}"),
        }
    }

    #[test]
    fn test_keyword_starting_with_trigger_reaches_table() {
        let mut table = crate::table::CommandTable::in_memory();
        table
            .put(
                "googledocs",
                crate::ActionDescriptor::url("https://docs.google.com").unwrap(),
            )
            .unwrap();
        assert_eq!(router().route("googledocs").unwrap(), None);
        assert_eq!(
            crate::engine::Matcher::default().resolve("googledocs", &table),
            crate::engine::MatchResult::Keyword("googledocs".to_string())
        );
    }

    #[test]
    fn test_strip_prefix_ignore_case() {
        assert_eq!(strip_prefix_ignore_case("Hello world", "hello"), Some(" world"));
        assert_eq!(strip_prefix_ignore_case("搜索猫", "搜索"), Some("猫"));
        assert_eq!(strip_prefix_ignore_case("搜索", "搜索"), Some(""));
        assert_eq!(strip_prefix_ignore_case("搜", "搜索"), None);
        assert_eq!(strip_prefix_ignore_case("find x", "search"), None);
    }
}
