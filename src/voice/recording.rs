//! Microphone capture through sox's `rec`.
//!
//! `rec` waits for sound above the silence threshold before it writes any
//! samples, and stops on its own after trailing silence. The capture loop
//! watches the output file to tell "still waiting for speech" from
//! "speech in progress".

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use super::types::{ListenLimits, TranscriptionError};

/// WAV header written before any samples
const WAV_HEADER_LEN: u64 = 44;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Sox parameters for one capture
#[derive(Debug, Clone)]
pub struct RecorderSettings {
    pub output: PathBuf,
    pub silence_threshold: String,
    pub silence_duration: f32,
}

/// Build the `rec` arguments for one capture
pub fn rec_args(settings: &RecorderSettings, limits: ListenLimits) -> Vec<String> {
    let max_secs = limits.timeout.as_secs_f32() + limits.phrase_limit.as_secs_f32();
    vec![
        "-q".to_string(),
        "-r".to_string(),
        "16000".to_string(), // whisper wants 16kHz mono 16-bit
        "-c".to_string(),
        "1".to_string(),
        "-b".to_string(),
        "16".to_string(),
        settings.output.to_string_lossy().into_owned(),
        "silence".to_string(),
        "1".to_string(),
        "0.1".to_string(),
        settings.silence_threshold.clone(),
        "1".to_string(),
        format!("{:.1}", settings.silence_duration),
        settings.silence_threshold.clone(),
        "trim".to_string(),
        "0".to_string(),
        format!("{:.1}", max_secs),
    ]
}

fn start_rec(settings: &RecorderSettings, limits: ListenLimits) -> Result<Child, TranscriptionError> {
    if let Some(parent) = settings.output.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            TranscriptionError::Service(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }
    let _ = std::fs::remove_file(&settings.output);

    Command::new("rec")
        .args(rec_args(settings, limits))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| TranscriptionError::Service(format!("Failed to start recording: {}", e)))
}

/// Ask `rec` to finish the WAV file (SIGTERM), then make sure it's gone
fn finish_rec(mut process: Child) {
    #[cfg(unix)]
    {
        let _ = Command::new("kill")
            .args(["-TERM", &process.id().to_string()])
            .output();
        thread::sleep(Duration::from_millis(100));
    }
    let _ = process.kill();
    let _ = process.wait();
}

fn abort_rec(mut process: Child) {
    let _ = process.kill();
    let _ = process.wait();
}

fn speech_started(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.len() > WAV_HEADER_LEN)
        .unwrap_or(false)
}

/// Record one phrase into `settings.output`.
///
/// Fails with `Timeout` when no speech starts within `limits.timeout` and
/// with `Cancelled` as soon as `cancel` is set. A phrase running past
/// `limits.phrase_limit` is cut off and kept.
pub fn record_phrase(
    settings: &RecorderSettings,
    limits: ListenLimits,
    cancel: &AtomicBool,
) -> Result<PathBuf, TranscriptionError> {
    let mut process = start_rec(settings, limits)?;
    let started = Instant::now();
    let mut speech_at: Option<Instant> = None;

    loop {
        if cancel.load(Ordering::SeqCst) {
            abort_rec(process);
            return Err(TranscriptionError::Cancelled);
        }

        match process.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) => {}
            Err(e) => {
                abort_rec(process);
                return Err(TranscriptionError::Service(format!("Recording error: {}", e)));
            }
        }

        match speech_at {
            None if speech_started(&settings.output) => speech_at = Some(Instant::now()),
            None if started.elapsed() >= limits.timeout => {
                abort_rec(process);
                return Err(TranscriptionError::Timeout);
            }
            Some(at) if at.elapsed() >= limits.phrase_limit => {
                finish_rec(process);
                break;
            }
            _ => {}
        }

        thread::sleep(POLL_INTERVAL);
    }

    if speech_started(&settings.output) {
        Ok(settings.output.clone())
    } else {
        Err(TranscriptionError::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rec_args_use_silence_detection() {
        let settings = RecorderSettings {
            output: PathBuf::from("/tmp/phrase.wav"),
            silence_threshold: "1%".to_string(),
            silence_duration: 1.0,
        };
        let args = rec_args(&settings, ListenLimits::default());
        let joined = args.join(" ");
        assert!(joined.contains("/tmp/phrase.wav silence 1 0.1 1% 1 1.0 1%"));
        assert!(joined.ends_with("trim 0 10.0"));
    }

    #[test]
    fn test_speech_started_needs_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        assert!(!speech_started(&path));
        std::fs::write(&path, vec![0u8; 44]).unwrap();
        assert!(!speech_started(&path));
        std::fs::write(&path, vec![0u8; 1024]).unwrap();
        assert!(speech_started(&path));
    }
}
