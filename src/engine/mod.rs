//! Interpretation and dispatch of utterances
//!
//! Pipeline for one utterance:
//! 1. [`IntentRouter`]: built-in intents (search, browser keys, close program)
//! 2. [`Matcher`]: user keyword table, substring first, then fuzzy candidates
//! 3. [`Chooser`]: the user picks among fuzzy candidates (or cancels)
//! 4. [`Dispatcher`]: one [`crate::ActionRequest`] to the executor

mod dispatcher;
mod matcher;
mod router;
pub mod similarity;

pub use dispatcher::{Dispatcher, Outcome, Resolved, request_for_action, request_for_intent};
pub use matcher::{Candidate, FUZZY_CUTOFF, MAX_CANDIDATES, MatchResult, Matcher};
pub use router::{BROWSER_PHRASES, BrowserAction, CLOSE_FOREGROUND_PHRASES, Intent, IntentRouter};

use std::sync::Arc;

use crate::config::SearchEngine;
use crate::executor::{ActionExecutor, ExecutionError};
use crate::table::CommandTable;

/// Errors that stop an utterance before (or during) dispatch
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Please say what to search for after \"{trigger}\"")]
    EmptyQuery { trigger: String },

    #[error("❌ No command matches \"{text}\"")]
    NoMatch { text: String },

    #[error("⚠️ Execution failed: {0}")]
    Execution(#[from] ExecutionError),
}

/// Picks one keyword among fuzzy candidates. `None` means cancelled.
pub trait Chooser {
    fn choose(&self, candidates: &[Candidate]) -> Option<String>;
}

/// Chooser that always cancels, for non-interactive callers
#[derive(Debug, Clone, Copy, Default)]
pub struct NoChooser;

impl Chooser for NoChooser {
    fn choose(&self, _candidates: &[Candidate]) -> Option<String> {
        None
    }
}

/// The full interpretation-and-dispatch pipeline
#[derive(Clone)]
pub struct Engine {
    router: IntentRouter,
    matcher: Matcher,
    dispatcher: Dispatcher,
}

impl Engine {
    pub fn new(engines: Vec<SearchEngine>, executor: Arc<dyn ActionExecutor>) -> Self {
        Self {
            router: IntentRouter::new(engines),
            matcher: Matcher::default(),
            dispatcher: Dispatcher::new(executor),
        }
    }

    pub fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Replace the search engines, e.g. after the config was edited
    pub fn set_search_engines(&mut self, engines: Vec<SearchEngine>) {
        self.router = IntentRouter::new(engines);
    }

    /// Decide what `text` means without executing anything
    pub fn interpret(
        &self,
        text: &str,
        table: &CommandTable,
        chooser: &dyn Chooser,
    ) -> Result<Resolved, EngineError> {
        if let Some(intent) = self.router.route(text)? {
            tracing::debug!("Built-in intent: {}", intent);
            return Ok(Resolved::Intent(intent));
        }

        let no_match = || EngineError::NoMatch {
            text: text.trim().to_string(),
        };

        match self.matcher.resolve(text, table) {
            MatchResult::Keyword(keyword) => Ok(Resolved::Keyword(keyword)),
            MatchResult::Ambiguous(candidates) => {
                tracing::debug!("{} fuzzy candidates for \"{}\"", candidates.len(), text);
                chooser
                    .choose(&candidates)
                    .map(Resolved::Keyword)
                    .ok_or_else(no_match)
            }
            MatchResult::NoMatch => Err(no_match()),
        }
    }

    /// Interpret `text` and dispatch the result
    pub fn handle(&self, text: &str, table: &CommandTable, chooser: &dyn Chooser) -> Outcome {
        match self.interpret(text, table, chooser) {
            Ok(resolved) => self.dispatcher.dispatch(&resolved, table),
            Err(e) => e.into(),
        }
    }
}
