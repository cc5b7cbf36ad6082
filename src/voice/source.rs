use std::sync::atomic::AtomicBool;

use super::types::{ListenLimits, TranscriptionError};

/// Captures one phrase from the microphone and returns its transcription.
///
/// Implementations block for at most `limits.timeout + limits.phrase_limit`
/// plus transcription time, and should give up promptly once `cancel` is set.
pub trait SpeechSource: Send {
    fn listen_once(
        &mut self,
        limits: ListenLimits,
        cancel: &AtomicBool,
    ) -> Result<String, TranscriptionError>;
}
