//! Speech capture settings

use serde::{Deserialize, Serialize};

/// Settings for continuous listening and one-shot recognition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenSettings {
    /// How long a single capture waits for speech to begin (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f32,

    /// Maximum length of one phrase (in seconds)
    #[serde(default = "default_phrase_limit_secs")]
    pub phrase_limit_secs: f32,

    /// Language passed to the transcriber (zh, en, auto, ...)
    #[serde(default = "default_language")]
    pub language: String,

    /// Whisper model for transcription (tiny, base, small, medium, large)
    #[serde(default = "default_whisper_model")]
    pub whisper_model: String,

    /// Directory holding `ggml-<model>.bin` files.
    /// Defaults to ~/.voxcmd/whisper-models
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<std::path::PathBuf>,

    /// Sox silence threshold used to detect start and end of speech
    #[serde(default = "default_silence_threshold")]
    pub silence_threshold: String,

    /// Trailing silence that ends a phrase (in seconds)
    #[serde(default = "default_silence_duration")]
    pub silence_duration: f32,
}

fn default_timeout_secs() -> f32 {
    5.0
}

fn default_phrase_limit_secs() -> f32 {
    5.0
}

fn default_language() -> String {
    "zh".to_string()
}

fn default_whisper_model() -> String {
    "base".to_string()
}

fn default_silence_threshold() -> String {
    "1%".to_string()
}

fn default_silence_duration() -> f32 {
    1.0
}

impl Default for ListenSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            phrase_limit_secs: default_phrase_limit_secs(),
            language: default_language(),
            whisper_model: default_whisper_model(),
            model_dir: None,
            silence_threshold: default_silence_threshold(),
            silence_duration: default_silence_duration(),
        }
    }
}
