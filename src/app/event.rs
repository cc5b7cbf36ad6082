use super::edit::TableEdit;
use crate::Utterance;

/// Everything the event loop reacts to.
///
/// Background threads (listening worker, hotkey forwarder, stdin reader)
/// only ever send these; all state changes happen on the loop's thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Text is ready for interpretation
    Utterance(Utterance),
    /// Status line update
    Status(String),
    /// A recoverable failure the user should see
    Failure(String),
    /// Start listening if idle, stop if listening
    Toggle,
    Start,
    Stop,
    /// Run a single recognition
    SpeechOnce,
    /// Bind the global hotkey to a new combination
    Rebind(String),
    /// Change the keyword table
    Edit(TableEdit),
    /// Bring the interface forward and print the current state
    Show,
    Exit,
}
