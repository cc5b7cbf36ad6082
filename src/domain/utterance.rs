//! Utterances flowing through the interpretation pipeline.

use std::fmt;

/// Which input path produced an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceSource {
    /// Background listening session
    Continuous,
    /// Manual one-shot recognition
    OneShot,
    /// Text typed or injected directly, no transcription involved
    TypedInjection,
}

impl fmt::Display for UtteranceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UtteranceSource::Continuous => write!(f, "continuous"),
            UtteranceSource::OneShot => write!(f, "one-shot"),
            UtteranceSource::TypedInjection => write!(f, "typed"),
        }
    }
}

/// A single transcribed or typed input. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    text: String,
    source: UtteranceSource,
}

impl Utterance {
    pub fn new(text: impl Into<String>, source: UtteranceSource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }

    /// Text typed by the user
    pub fn typed(text: impl Into<String>) -> Self {
        Self::new(text, UtteranceSource::TypedInjection)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> UtteranceSource {
        self.source
    }
}
