//! Turns a resolved utterance into exactly one [`ActionRequest`] and runs it.

use std::sync::Arc;

use super::{EngineError, Intent};
use crate::executor::{ActionExecutor, ExecutionError};
use crate::table::CommandTable;
use crate::{ActionDescriptor, ActionRequest};

/// What the interpreter settled on for one utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Intent(Intent),
    Keyword(String),
}

/// Result of dispatching one utterance, for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
}

impl Outcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl From<EngineError> for Outcome {
    fn from(err: EngineError) -> Self {
        Outcome::failure(err.to_string())
    }
}

/// Map a built-in intent to its request
pub fn request_for_intent(intent: &Intent) -> ActionRequest {
    match intent {
        Intent::SearchWeb {
            template, query, ..
        } => ActionRequest::SearchWeb {
            template: template.clone(),
            query: query.clone(),
        },
        Intent::Browser(action) => ActionRequest::SendKeys(action.chord()),
        Intent::CloseForeground => ActionRequest::CloseForeground,
    }
}

/// Map a table entry to its request
pub fn request_for_action(action: &ActionDescriptor) -> ActionRequest {
    ActionRequest::from(action)
}

fn describe_entry(keyword: &str, action: &ActionDescriptor) -> String {
    match action {
        ActionDescriptor::Program { .. } => format!("🚀 Running {keyword}"),
        ActionDescriptor::Url { .. } => format!("🌐 Opening {keyword}"),
        ActionDescriptor::Folder { .. } => format!("📂 Opening folder {keyword}"),
        ActionDescriptor::File { .. } => format!("📄 Opening file {keyword}"),
    }
}

fn describe_intent(intent: &Intent) -> String {
    match intent {
        Intent::SearchWeb { engine, query, .. } => format!("🔍 {engine} search: {query}"),
        Intent::Browser(action) => format!("Browser action: {action}"),
        Intent::CloseForeground => "Closing foreground program".to_string(),
    }
}

/// Sends requests to the executor. Never retries and never hides a failure.
#[derive(Clone)]
pub struct Dispatcher {
    executor: Arc<dyn ActionExecutor>,
}

impl Dispatcher {
    pub fn new(executor: Arc<dyn ActionExecutor>) -> Self {
        Self { executor }
    }

    /// Dispatch a resolved utterance. Keywords are looked up in `table`.
    pub fn dispatch(&self, resolved: &Resolved, table: &CommandTable) -> Outcome {
        let (request, description) = match resolved {
            Resolved::Intent(intent) => (request_for_intent(intent), describe_intent(intent)),
            Resolved::Keyword(keyword) => match table.lookup(keyword) {
                Some(action) => (request_for_action(action), describe_entry(keyword, action)),
                None => {
                    return EngineError::NoMatch {
                        text: keyword.clone(),
                    }
                    .into();
                }
            },
        };

        tracing::info!(kind = %request.kind(), "Dispatching: {}", description);
        match self.execute(&request) {
            Ok(detail) if detail.is_empty() => Outcome::success(description),
            Ok(detail) => Outcome::success(format!("{description} ({detail})")),
            Err(e) => {
                tracing::warn!(kind = %request.kind(), "Execution failed: {}", e);
                EngineError::Execution(e).into()
            }
        }
    }

    /// Hand one request to the executor
    pub fn execute(&self, request: &ActionRequest) -> Result<String, ExecutionError> {
        match request {
            ActionRequest::Launch(path) => self.executor.launch(path),
            ActionRequest::OpenUrl(address) => self.executor.open_url(address),
            ActionRequest::OpenFolder(path) => self.executor.open_folder(path),
            ActionRequest::OpenFile(path) => self.executor.open_file(path),
            ActionRequest::SendKeys(chord) => self.executor.send_keys(chord),
            ActionRequest::CloseForeground => self.executor.close_foreground(),
            ActionRequest::SearchWeb { template, query } => {
                self.executor.search_web(template, query)
            }
        }
    }
}
