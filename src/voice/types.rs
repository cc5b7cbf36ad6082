//! Listening state and error types.

use std::fmt;
use std::time::Duration;

use crate::config::ListenSettings;

/// State of the continuous listening session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListenState {
    #[default]
    Idle,
    /// A background worker is capturing and transcribing
    Listening,
}

impl ListenState {
    pub fn is_listening(&self) -> bool {
        matches!(self, ListenState::Listening)
    }
}

impl fmt::Display for ListenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenState::Idle => write!(f, "Idle"),
            ListenState::Listening => write!(f, "Listening"),
        }
    }
}

/// Bounds for a single capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenLimits {
    /// How long to wait for speech to begin
    pub timeout: Duration,
    /// Maximum length of the phrase once speech began
    pub phrase_limit: Duration,
}

impl Default for ListenLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            phrase_limit: Duration::from_secs(5),
        }
    }
}

/// Shortest and longest wait accepted from the config (in seconds)
const MIN_LIMIT_SECS: f32 = 0.1;
const MAX_LIMIT_SECS: f32 = 600.0;

/// Seconds from the config as a duration. NaN and non-positive values fall
/// to the minimum, huge and infinite values to the maximum.
fn limit_from_secs(secs: f32) -> Duration {
    Duration::from_secs_f32(secs.max(MIN_LIMIT_SECS).min(MAX_LIMIT_SECS))
}

impl From<&ListenSettings> for ListenLimits {
    fn from(settings: &ListenSettings) -> Self {
        Self {
            timeout: limit_from_secs(settings.timeout_secs),
            phrase_limit: limit_from_secs(settings.phrase_limit_secs),
        }
    }
}

/// Why one capture produced no text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscriptionError {
    /// Nobody spoke before the timeout
    #[error("No speech detected")]
    Timeout,

    /// Speech was heard but could not be decoded
    #[error("Could not understand the audio")]
    Unrecognized,

    /// The recorder or transcriber failed
    #[error("Speech service error: {0}")]
    Service(String),

    /// The capture was aborted by `stop()` or shutdown
    #[error("Capture cancelled")]
    Cancelled,
}

/// Errors from the listen coordinator itself
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListenError {
    /// The audio capture is already in use by another path
    #[error("Microphone is busy: {0}")]
    CaptureBusy(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_from_settings() {
        let limits = ListenLimits::from(&ListenSettings::default());
        assert_eq!(limits, ListenLimits::default());
    }

    #[test]
    fn test_limits_out_of_range_are_clamped() {
        let settings = ListenSettings {
            timeout_secs: f32::INFINITY,
            phrase_limit_secs: -3.0,
            ..Default::default()
        };
        let limits = ListenLimits::from(&settings);
        assert_eq!(limits.timeout, Duration::from_secs(600));
        assert_eq!(limits.phrase_limit, Duration::from_secs_f32(0.1));

        let settings = ListenSettings {
            timeout_secs: f32::NAN,
            phrase_limit_secs: 1e30,
            ..Default::default()
        };
        let limits = ListenLimits::from(&settings);
        assert_eq!(limits.timeout, Duration::from_secs_f32(0.1));
        assert_eq!(limits.phrase_limit, Duration::from_secs(600));
    }
}
