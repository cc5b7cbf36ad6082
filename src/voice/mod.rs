//! Speech input: the microphone capture, whisper transcription and the
//! coordinator that owns the listening session.

mod coordinator;
mod recording;
mod source;
mod transcription;
mod types;
mod whisper;

#[cfg(test)]
mod tests;

pub use coordinator::ListenCoordinator;
pub use recording::{RecorderSettings, rec_args, record_phrase};
pub use source::SpeechSource;
pub use transcription::{check_availability, clean_transcript, run_whisper};
pub use types::{ListenError, ListenLimits, ListenState, TranscriptionError};
pub use whisper::WhisperSpeechSource;
