//! Where user-facing output goes.

use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use super::{AppEvent, AppState, edit};
use crate::engine::{Candidate, Chooser};
use crate::voice::ListenState;
use crate::{OutputLine, Utterance};

/// The interface the event loop reports to
pub trait UiSink: Send + Sync {
    /// Replace the status line
    fn status(&self, text: &str);

    /// Append a line to the output log
    fn output(&self, line: &OutputLine);

    /// Ask the user to pick one candidate. Blocks; `None` means cancelled.
    fn choose(&self, candidates: &[Candidate]) -> Option<String>;

    /// Bring the interface forward
    fn show(&self, _state: &AppState, _listen: ListenState) {}
}

/// Lets any sink act as the engine's chooser
pub struct SinkChooser<'a>(pub &'a dyn UiSink);

impl Chooser for SinkChooser<'_> {
    fn choose(&self, candidates: &[Candidate]) -> Option<String> {
        self.0.choose(candidates)
    }
}

/// Terminal front end: prints to stdout, reads commands from stdin.
///
/// While a choice is pending, the next stdin line answers it instead of
/// being treated as an utterance.
pub struct TerminalSink {
    awaiting_choice: Arc<AtomicBool>,
    choices: Mutex<Receiver<String>>,
}

impl TerminalSink {
    /// Create the sink and start the stdin reader thread feeding `events`
    pub fn spawn(events: Sender<AppEvent>) -> (Self, JoinHandle<()>) {
        let awaiting_choice = Arc::new(AtomicBool::new(false));
        let (choice_tx, choice_rx) = mpsc::channel();

        let handle = {
            let awaiting_choice = Arc::clone(&awaiting_choice);
            thread::spawn(move || read_stdin(events, choice_tx, awaiting_choice))
        };

        let sink = Self {
            awaiting_choice,
            choices: Mutex::new(choice_rx),
        };
        (sink, handle)
    }
}

/// Turn one stdin line into an event
pub fn parse_input_line(line: &str) -> Option<AppEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let event = match trimmed {
        ":start" => AppEvent::Start,
        ":stop" => AppEvent::Stop,
        ":toggle" => AppEvent::Toggle,
        ":once" => AppEvent::SpeechOnce,
        ":show" => AppEvent::Show,
        ":quit" | ":exit" | ":q" => AppEvent::Exit,
        _ if trimmed.starts_with(":hotkey ") => {
            AppEvent::Rebind(trimmed[":hotkey ".len()..].trim().to_string())
        }
        _ if trimmed.starts_with(':') => parse_edit_command(trimmed),
        _ => AppEvent::Utterance(Utterance::typed(trimmed)),
    };
    Some(event)
}

/// `:add`, `:remove`, `:rename`, `:import`. Any other `:word` is typed text.
fn parse_edit_command(line: &str) -> AppEvent {
    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let parsed = match command {
        ":add" => edit::parse_add(rest),
        ":remove" => edit::parse_remove(rest),
        ":rename" => edit::parse_rename(rest),
        ":import" => edit::parse_import(rest),
        _ => return AppEvent::Utterance(Utterance::typed(line)),
    };
    match parsed {
        Ok(edit) => AppEvent::Edit(edit),
        Err(usage) => AppEvent::Failure(usage),
    }
}

fn read_stdin(events: Sender<AppEvent>, choices: Sender<String>, awaiting_choice: Arc<AtomicBool>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            break;
        };

        if awaiting_choice.load(Ordering::SeqCst) {
            let _ = choices.send(line);
            continue;
        }

        if let Some(event) = parse_input_line(&line) {
            if events.send(event).is_err() {
                return;
            }
        }
    }
    // stdin closed: leave like the user asked to
    let _ = events.send(AppEvent::Exit);
}

/// Map the user's answer to a candidate keyword
pub fn pick_candidate(candidates: &[Candidate], answer: &str) -> Option<String> {
    let answer = answer.trim();
    if let Ok(n) = answer.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|idx| candidates.get(idx))
            .map(|c| c.keyword.clone());
    }
    candidates
        .iter()
        .find(|c| c.keyword.eq_ignore_ascii_case(answer))
        .map(|c| c.keyword.clone())
}

impl UiSink for TerminalSink {
    fn status(&self, text: &str) {
        println!("» {}", text);
    }

    fn output(&self, line: &OutputLine) {
        if line.is_error() {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    fn choose(&self, candidates: &[Candidate]) -> Option<String> {
        println!("Did you mean:");
        for (idx, candidate) in candidates.iter().enumerate() {
            println!("  {}. {} ({:.0}%)", idx + 1, candidate.keyword, candidate.score * 100.0);
        }
        print!("Pick a number (empty to cancel): ");
        let _ = std::io::stdout().flush();

        let choices = self.choices.lock().ok()?;
        self.awaiting_choice.store(true, Ordering::SeqCst);
        let answer = choices.recv();
        self.awaiting_choice.store(false, Ordering::SeqCst);

        pick_candidate(candidates, &answer.ok()?)
    }

    fn show(&self, state: &AppState, listen: ListenState) {
        println!("State:     {}", listen);
        println!("Hotkey:    {}", state.config.hotkey);
        println!("Commands:  {} ({})", state.table_len(), state.table_location());
        match &state.last_utterance {
            Some(utterance) => println!("Last heard: {} [{}]", utterance.text(), utterance.source()),
            None => println!("Last heard: -"),
        }
    }
}
