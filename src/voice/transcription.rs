//! Whisper transcription and dependency checks.

use std::path::Path;
use std::process::Command;

use super::types::TranscriptionError;

/// Markers whisper prints instead of text for non-speech audio
const NON_SPEECH_MARKERS: &[&str] = &["[BLANK_AUDIO]", "[MUSIC]", "(silence)", "[silence]"];

/// Run whisper-cli on `audio_path` and return the recognized text
pub fn run_whisper(
    audio_path: &Path,
    model_path: &Path,
    language: &str,
) -> Result<String, TranscriptionError> {
    // whisper defaults to English without -l; "auto" detects
    let output = Command::new("whisper-cli")
        .arg("-m")
        .arg(model_path)
        .arg("-f")
        .arg(audio_path)
        .args(["--no-timestamps", "-l", language])
        .output()
        .map_err(|e| TranscriptionError::Service(format!("Failed to run whisper: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TranscriptionError::Service(format!(
            "Whisper failed: {}",
            stderr.trim()
        )));
    }

    clean_transcript(&String::from_utf8_lossy(&output.stdout))
}

/// Join whisper's output lines and drop non-speech markers
pub fn clean_transcript(stdout: &str) -> Result<String, TranscriptionError> {
    let text = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !NON_SPEECH_MARKERS.contains(line))
        .collect::<Vec<_>>()
        .join(" ");

    if text.is_empty() {
        return Err(TranscriptionError::Unrecognized);
    }
    Ok(text)
}

fn on_path(binary: &str) -> bool {
    Command::new("which")
        .arg(binary)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Check that recorder, transcriber and model are present.
///
/// Returns a message naming the first missing piece.
pub fn check_availability(model_path: &Path) -> Result<(), String> {
    if !on_path("rec") {
        return Err("sox not found. Install with: brew install sox / apt install sox".to_string());
    }
    if !on_path("whisper-cli") {
        return Err("whisper-cli not found. Install with: brew install whisper-cpp".to_string());
    }
    if !model_path.exists() {
        return Err(format!("Whisper model not found at {}", model_path.display()));
    }
    Ok(())
}
