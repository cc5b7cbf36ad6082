//! voxcmd - voice-triggered command dispatcher
//!
//! Spoken or typed utterances are matched against built-in intents (web
//! search, browser navigation, closing the foreground program) and a
//! user-defined keyword table, then turned into exactly one action.
//!
//! ## Layout
//!
//! - [`table`]: the keyword table and its JSON store
//! - [`engine`]: intent routing, keyword matching and dispatch
//! - [`executor`]: the side effects (launch, open, key chords)
//! - [`voice`]: microphone capture, transcription and the listening session
//! - [`app`]: the event loop that ties it together

pub mod app;
pub mod config;
pub mod domain;
pub mod engine;
pub mod executor;
pub mod hotkey;
pub mod table;
pub mod voice;

pub use domain::*;
