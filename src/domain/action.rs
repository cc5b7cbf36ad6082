//! Action descriptors stored in the command table and the requests handed
//! to the executor at dispatch time.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Kind of side effect an [`ActionRequest`] asks the executor to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Launch,
    OpenUrl,
    OpenFolder,
    OpenFile,
    SendKeys,
    CloseForeground,
    SearchWeb,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Launch => write!(f, "launch"),
            ActionKind::OpenUrl => write!(f, "open_url"),
            ActionKind::OpenFolder => write!(f, "open_folder"),
            ActionKind::OpenFile => write!(f, "open_file"),
            ActionKind::SendKeys => write!(f, "send_keys"),
            ActionKind::CloseForeground => write!(f, "close_foreground"),
            ActionKind::SearchWeb => write!(f, "search_web"),
        }
    }
}

/// Error raised when an action descriptor fails validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("URL must start with http: {0}")]
    InvalidUrl(String),

    #[error("{0} path must not be empty")]
    EmptyPath(&'static str),
}

/// What a user keyword triggers.
///
/// Stored on disk as either a plain string (a program path) or a single-field
/// object tagged `url`, `folder` or `file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredAction", into = "StoredAction")]
pub enum ActionDescriptor {
    Program { path: PathBuf },
    Url { address: String },
    Folder { path: PathBuf },
    File { path: PathBuf },
}

impl ActionDescriptor {
    pub fn program(path: impl Into<PathBuf>) -> Result<Self, ActionError> {
        let path = non_empty_path(path.into(), "program")?;
        Ok(ActionDescriptor::Program { path })
    }

    pub fn url(address: impl Into<String>) -> Result<Self, ActionError> {
        let address = address.into().trim().to_string();
        if !address.starts_with("http") {
            return Err(ActionError::InvalidUrl(address));
        }
        Ok(ActionDescriptor::Url { address })
    }

    pub fn folder(path: impl Into<PathBuf>) -> Result<Self, ActionError> {
        let path = non_empty_path(path.into(), "folder")?;
        Ok(ActionDescriptor::Folder { path })
    }

    pub fn file(path: impl Into<PathBuf>) -> Result<Self, ActionError> {
        let path = non_empty_path(path.into(), "file")?;
        Ok(ActionDescriptor::File { path })
    }

    /// Short label used when listing the table
    pub fn label(&self) -> &'static str {
        match self {
            ActionDescriptor::Program { .. } => "program",
            ActionDescriptor::Url { .. } => "url",
            ActionDescriptor::Folder { .. } => "folder",
            ActionDescriptor::File { .. } => "file",
        }
    }

    /// The path or address this descriptor points at
    pub fn target(&self) -> String {
        match self {
            ActionDescriptor::Program { path }
            | ActionDescriptor::Folder { path }
            | ActionDescriptor::File { path } => path.display().to_string(),
            ActionDescriptor::Url { address } => address.clone(),
        }
    }
}

fn non_empty_path(path: PathBuf, kind: &'static str) -> Result<PathBuf, ActionError> {
    if path.as_os_str().is_empty() || path.to_string_lossy().trim().is_empty() {
        return Err(ActionError::EmptyPath(kind));
    }
    Ok(path)
}

/// On-disk shape of an action descriptor
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum StoredAction {
    Program(String),
    Tagged(TaggedAction),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TaggedAction {
    Url(String),
    Folder(String),
    File(String),
}

impl TryFrom<StoredAction> for ActionDescriptor {
    type Error = ActionError;

    fn try_from(stored: StoredAction) -> Result<Self, Self::Error> {
        match stored {
            StoredAction::Program(path) => ActionDescriptor::program(path),
            StoredAction::Tagged(TaggedAction::Url(address)) => ActionDescriptor::url(address),
            StoredAction::Tagged(TaggedAction::Folder(path)) => ActionDescriptor::folder(path),
            StoredAction::Tagged(TaggedAction::File(path)) => ActionDescriptor::file(path),
        }
    }
}

impl From<ActionDescriptor> for StoredAction {
    fn from(action: ActionDescriptor) -> Self {
        match action {
            ActionDescriptor::Program { path } => {
                StoredAction::Program(path.to_string_lossy().into_owned())
            }
            ActionDescriptor::Url { address } => StoredAction::Tagged(TaggedAction::Url(address)),
            ActionDescriptor::Folder { path } => {
                StoredAction::Tagged(TaggedAction::Folder(path.to_string_lossy().into_owned()))
            }
            ActionDescriptor::File { path } => {
                StoredAction::Tagged(TaggedAction::File(path.to_string_lossy().into_owned()))
            }
        }
    }
}

/// A key combination such as `ctrl+w` or `f5`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyChord(Vec<String>);

impl KeyChord {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    /// Modifier keys (everything but the last key)
    pub fn modifiers(&self) -> &[String] {
        match self.0.split_last() {
            Some((_, modifiers)) => modifiers,
            None => &[],
        }
    }

    /// The final, non-modifier key
    pub fn key(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("+"))
    }
}

/// The single instruction the dispatcher sends to the executor per utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    Launch(PathBuf),
    OpenUrl(String),
    OpenFolder(PathBuf),
    OpenFile(PathBuf),
    SendKeys(KeyChord),
    CloseForeground,
    SearchWeb { template: String, query: String },
}

impl ActionRequest {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionRequest::Launch(_) => ActionKind::Launch,
            ActionRequest::OpenUrl(_) => ActionKind::OpenUrl,
            ActionRequest::OpenFolder(_) => ActionKind::OpenFolder,
            ActionRequest::OpenFile(_) => ActionKind::OpenFile,
            ActionRequest::SendKeys(_) => ActionKind::SendKeys,
            ActionRequest::CloseForeground => ActionKind::CloseForeground,
            ActionRequest::SearchWeb { .. } => ActionKind::SearchWeb,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ActionRequest::Launch(path)
            | ActionRequest::OpenFolder(path)
            | ActionRequest::OpenFile(path) => Some(path),
            _ => None,
        }
    }
}

impl From<&ActionDescriptor> for ActionRequest {
    fn from(action: &ActionDescriptor) -> Self {
        match action {
            ActionDescriptor::Program { path } => ActionRequest::Launch(path.clone()),
            ActionDescriptor::Url { address } => ActionRequest::OpenUrl(address.clone()),
            ActionDescriptor::Folder { path } => ActionRequest::OpenFolder(path.clone()),
            ActionDescriptor::File { path } => ActionRequest::OpenFile(path.clone()),
        }
    }
}
