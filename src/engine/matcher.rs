//! Keyword matching against the user's command table

use super::similarity::ratio;
use crate::table::CommandTable;

/// Minimum similarity for a keyword to be offered as a fuzzy candidate
pub const FUZZY_CUTOFF: f64 = 0.4;

/// Maximum number of fuzzy candidates offered to the chooser
pub const MAX_CANDIDATES: usize = 3;

/// A keyword that loosely resembles the utterance
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub keyword: String,
    pub score: f64,
}

/// Result of matching an utterance against the table
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    /// A keyword occurs literally in the utterance
    Keyword(String),
    /// No literal match, but these keywords are similar; the user must pick
    Ambiguous(Vec<Candidate>),
    NoMatch,
}

#[derive(Debug, Clone)]
pub struct Matcher {
    cutoff: f64,
    max_candidates: usize,
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            cutoff: FUZZY_CUTOFF,
            max_candidates: MAX_CANDIDATES,
        }
    }
}

impl Matcher {
    pub fn new(cutoff: f64, max_candidates: usize) -> Self {
        Self {
            cutoff,
            max_candidates,
        }
    }

    /// Resolve `text` against `table`.
    ///
    /// 1. Substring pass: the first keyword (table order) contained in the
    ///    utterance wins outright.
    /// 2. Fuzzy pass: keywords with similarity >= cutoff, best first, capped.
    ///    Even a single candidate is returned as `Ambiguous`.
    pub fn resolve(&self, text: &str, table: &CommandTable) -> MatchResult {
        let text = text.trim().to_lowercase();

        if let Some(keyword) = table
            .keys()
            .find(|keyword| text.contains(&keyword.to_lowercase()))
        {
            return MatchResult::Keyword(keyword.to_string());
        }

        let mut candidates: Vec<Candidate> = table
            .keys()
            .map(|keyword| Candidate {
                keyword: keyword.to_string(),
                score: ratio(&keyword.to_lowercase(), &text),
            })
            .filter(|candidate| candidate.score >= self.cutoff)
            .collect();

        if candidates.is_empty() {
            return MatchResult::NoMatch;
        }

        // Stable sort: equal scores keep table order
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates.truncate(self.max_candidates);
        MatchResult::Ambiguous(candidates)
    }
}
