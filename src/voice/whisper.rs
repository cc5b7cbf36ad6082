use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use super::recording::{RecorderSettings, record_phrase};
use super::source::SpeechSource;
use super::transcription::{check_availability, run_whisper};
use super::types::{ListenLimits, TranscriptionError};
use crate::config::Config;

/// Speech source backed by sox for capture and whisper-cpp for transcription
pub struct WhisperSpeechSource {
    recorder: RecorderSettings,
    model_path: PathBuf,
    language: String,
}

impl WhisperSpeechSource {
    pub fn new(recorder: RecorderSettings, model_path: PathBuf, language: String) -> Self {
        Self {
            recorder,
            model_path,
            language,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let listen = &config.listen;
        let model_name = format!("ggml-{}.bin", listen.whisper_model);
        let recorder = RecorderSettings {
            output: std::env::temp_dir().join(format!("voxcmd-{}.wav", std::process::id())),
            silence_threshold: listen.silence_threshold.clone(),
            silence_duration: listen.silence_duration,
        };
        Self::new(recorder, config.model_dir().join(model_name), listen.language.clone())
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Ok when sox, whisper-cli and the model are all present
    pub fn check(&self) -> Result<(), String> {
        check_availability(&self.model_path)
    }
}

impl SpeechSource for WhisperSpeechSource {
    fn listen_once(
        &mut self,
        limits: ListenLimits,
        cancel: &AtomicBool,
    ) -> Result<String, TranscriptionError> {
        let audio = record_phrase(&self.recorder, limits, cancel)?;
        let result = run_whisper(&audio, &self.model_path, &self.language);
        let _ = std::fs::remove_file(&audio);
        result
    }
}
