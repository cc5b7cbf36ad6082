//! Core domain types for voxcmd

mod action;
mod output_line;
mod utterance;

pub use action::{ActionDescriptor, ActionError, ActionKind, ActionRequest, KeyChord};
pub use output_line::{OutputKind, OutputLine};
pub use utterance::{Utterance, UtteranceSource};
