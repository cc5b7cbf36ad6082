use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of line written to the output log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// Text that was recognized or typed
    Recognized,
    /// An action was dispatched successfully
    Action,
    /// Something failed and the user should know
    Error,
    /// Informational message (startup, hotkey changes, ...)
    System,
}

impl std::fmt::Display for OutputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputKind::Recognized => write!(f, "heard"),
            OutputKind::Action => write!(f, "action"),
            OutputKind::Error => write!(f, "error"),
            OutputKind::System => write!(f, "system"),
        }
    }
}

/// A line for the output log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputLine {
    /// When this line was produced
    pub timestamp: DateTime<Utc>,

    pub kind: OutputKind,

    pub text: String,
}

impl OutputLine {
    pub fn new(kind: OutputKind, text: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            text: text.into(),
        }
    }

    pub fn recognized(text: impl Into<String>) -> Self {
        Self::new(OutputKind::Recognized, text)
    }

    pub fn action(text: impl Into<String>) -> Self {
        Self::new(OutputKind::Action, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(OutputKind::Error, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(OutputKind::System, text)
    }

    pub fn is_error(&self) -> bool {
        self.kind == OutputKind::Error
    }
}

impl std::fmt::Display for OutputLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.timestamp.with_timezone(&chrono::Local).format("%H:%M:%S"),
            self.text
        )
    }
}
