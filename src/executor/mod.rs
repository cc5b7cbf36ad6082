//! Side effects requested by the dispatcher.
//!
//! [`SystemExecutor`] talks to the host platform; [`DryRunExecutor`] only
//! logs and remembers what it was asked to do (dry runs and tests).

mod system;

pub use system::{SystemExecutor, xdotool_chord};

use std::path::Path;
use std::sync::Mutex;

use crate::config::QUERY_PLACEHOLDER;
use crate::{ActionRequest, KeyChord};

/// An executor call that did not go through. Carries the platform's message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ExecutionError(pub String);

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Performs the side effect of one [`ActionRequest`].
///
/// Each call returns a short detail string on success (may be empty).
pub trait ActionExecutor: Send + Sync {
    fn launch(&self, path: &Path) -> Result<String, ExecutionError>;
    fn open_url(&self, address: &str) -> Result<String, ExecutionError>;
    fn open_folder(&self, path: &Path) -> Result<String, ExecutionError>;
    fn open_file(&self, path: &Path) -> Result<String, ExecutionError>;
    fn send_keys(&self, chord: &KeyChord) -> Result<String, ExecutionError>;
    fn close_foreground(&self) -> Result<String, ExecutionError>;

    /// Open the search results page for `query`
    fn search_web(&self, template: &str, query: &str) -> Result<String, ExecutionError> {
        self.open_url(&render_search_url(template, query))
    }
}

/// Substitute the percent-encoded `query` into `template`.
///
/// Templates without a `{query}` placeholder get the query appended.
pub fn render_search_url(template: &str, query: &str) -> String {
    let encoded = percent_encode(query.trim());
    if template.contains(QUERY_PLACEHOLDER) {
        template.replace(QUERY_PLACEHOLDER, &encoded)
    } else {
        format!("{template}{encoded}")
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set (UTF-8 bytes)
fn percent_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 3);
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Executor that performs nothing. Every request is logged and kept.
#[derive(Debug, Default)]
pub struct DryRunExecutor {
    requests: Mutex<Vec<ActionRequest>>,
    failure: Mutex<Option<String>>,
}

impl DryRunExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following call fail with `message`
    pub fn fail_with(&self, message: &str) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(message.to_string());
        }
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<ActionRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn record(&self, request: ActionRequest) -> Result<String, ExecutionError> {
        tracing::info!(kind = %request.kind(), "[dry-run] {:?}", request);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        match self.failure.lock().ok().and_then(|f| f.clone()) {
            Some(message) => Err(ExecutionError(message)),
            None => Ok("dry run".to_string()),
        }
    }
}

impl ActionExecutor for DryRunExecutor {
    fn launch(&self, path: &Path) -> Result<String, ExecutionError> {
        self.record(ActionRequest::Launch(path.to_path_buf()))
    }

    fn open_url(&self, address: &str) -> Result<String, ExecutionError> {
        self.record(ActionRequest::OpenUrl(address.to_string()))
    }

    fn open_folder(&self, path: &Path) -> Result<String, ExecutionError> {
        self.record(ActionRequest::OpenFolder(path.to_path_buf()))
    }

    fn open_file(&self, path: &Path) -> Result<String, ExecutionError> {
        self.record(ActionRequest::OpenFile(path.to_path_buf()))
    }

    fn send_keys(&self, chord: &KeyChord) -> Result<String, ExecutionError> {
        self.record(ActionRequest::SendKeys(chord.clone()))
    }

    fn close_foreground(&self) -> Result<String, ExecutionError> {
        self.record(ActionRequest::CloseForeground)
    }

    fn search_web(&self, template: &str, query: &str) -> Result<String, ExecutionError> {
        self.record(ActionRequest::SearchWeb {
            template: template.to_string(),
            query: query.to_string(),
        })
    }
}
