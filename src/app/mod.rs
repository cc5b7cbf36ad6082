//! The event loop: the one thread that owns application state and runs
//! every dispatch.

mod edit;
mod event;
mod sink;

pub use edit::{EditError, TableEdit};
pub use event::AppEvent;
pub use sink::{SinkChooser, TerminalSink, UiSink, parse_input_line, pick_candidate};

use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::{PoisonError, RwLockReadGuard, RwLockWriteGuard};

use crate::config::Config;
use crate::engine::Engine;
use crate::hotkey::{HotkeyBinding, HotkeyRegistrar};
use crate::table::{CommandTable, SharedTable};
use crate::voice::{ListenCoordinator, ListenState};
use crate::{OutputLine, Utterance};

/// Boxed registrar so the loop can run with the real or a fake backend
pub type DynHotkeyBinding = HotkeyBinding<Box<dyn HotkeyRegistrar>>;

/// State owned by the event loop
pub struct AppState {
    pub config: Config,
    /// Where hotkey changes are saved. `None` keeps them in memory.
    pub config_path: Option<PathBuf>,
    pub table: SharedTable,
    /// Most recent recognized or typed text
    pub last_utterance: Option<Utterance>,
}

impl AppState {
    pub fn new(config: Config, config_path: Option<PathBuf>, table: CommandTable) -> Self {
        Self {
            config,
            config_path,
            table: table.into_shared(),
            last_utterance: None,
        }
    }

    fn read_table(&self) -> RwLockReadGuard<'_, CommandTable> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_table(&self) -> RwLockWriteGuard<'_, CommandTable> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the table to resolve against
    pub fn table_snapshot(&self) -> CommandTable {
        self.read_table().clone()
    }

    pub fn table_len(&self) -> usize {
        self.read_table().len()
    }

    pub fn table_location(&self) -> String {
        self.read_table().location()
    }
}

pub struct App<S: UiSink> {
    state: AppState,
    engine: Engine,
    coordinator: ListenCoordinator,
    hotkey: Option<DynHotkeyBinding>,
    sink: S,
    events: Receiver<AppEvent>,
}

impl<S: UiSink> App<S> {
    pub fn new(
        state: AppState,
        engine: Engine,
        coordinator: ListenCoordinator,
        sink: S,
        events: Receiver<AppEvent>,
    ) -> Self {
        Self {
            state,
            engine,
            coordinator,
            hotkey: None,
            sink,
            events,
        }
    }

    pub fn with_hotkey(mut self, binding: DynHotkeyBinding) -> Self {
        self.hotkey = Some(binding);
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn listen_state(&self) -> ListenState {
        self.coordinator.state()
    }

    /// Process events until `Exit` or until every sender is gone.
    /// Always leaves the coordinator idle with its threads joined.
    pub fn run(&mut self) {
        self.sink.output(&OutputLine::system(format!(
            "Ready. {} commands loaded, hotkey {}",
            self.state.table_len(),
            self.hotkey
                .as_ref()
                .and_then(|h| h.combo())
                .unwrap_or("disabled")
        )));

        while let Ok(event) = self.events.recv() {
            if !self.handle_event(event) {
                break;
            }
        }

        self.shutdown();
    }

    pub fn shutdown(&mut self) {
        self.coordinator.shutdown();
        if let Some(binding) = self.hotkey.as_mut() {
            binding.clear();
        }
        self.sink.status("Stopped");
    }

    /// Apply one event. Returns false when the loop should end.
    pub fn handle_event(&mut self, event: AppEvent) -> bool {
        tracing::debug!("Event: {:?}", event);
        match event {
            AppEvent::Utterance(utterance) => self.handle_utterance(utterance),
            AppEvent::Status(text) => self.sink.status(&text),
            AppEvent::Failure(message) => self.sink.output(&OutputLine::error(message)),
            AppEvent::Toggle => {
                self.coordinator.toggle();
                self.report_listen_state();
            }
            AppEvent::Start => {
                if !self.coordinator.start() {
                    self.sink.status("Already listening");
                }
            }
            AppEvent::Stop => {
                if self.coordinator.stop() {
                    self.report_listen_state();
                } else {
                    self.sink.status("Not listening");
                }
            }
            AppEvent::SpeechOnce => {
                if let Err(e) = self.coordinator.speech_once() {
                    self.sink.output(&OutputLine::error(e.to_string()));
                }
            }
            AppEvent::Rebind(combo) => self.rebind_hotkey(&combo),
            AppEvent::Edit(edit) => self.edit_table(edit),
            AppEvent::Show => self.sink.show(&self.state, self.coordinator.state()),
            AppEvent::Exit => return false,
        }
        true
    }

    fn report_listen_state(&self) {
        match self.coordinator.state() {
            ListenState::Listening => self.sink.status("🎤 Listening..."),
            ListenState::Idle => self.sink.status("Listening stopped"),
        }
    }

    fn handle_utterance(&mut self, utterance: Utterance) {
        let text = utterance.text().trim().to_string();
        if text.is_empty() {
            return;
        }

        self.sink.output(&OutputLine::recognized(format!(
            "🗣 {} [{}]",
            text,
            utterance.source()
        )));
        self.state.last_utterance = Some(utterance);

        self.refresh_table();
        let table = self.state.table_snapshot();
        let outcome = self.engine.handle(&text, &table, &SinkChooser(&self.sink));

        if outcome.success {
            self.sink.output(&OutputLine::action(outcome.message));
        } else {
            self.sink.output(&OutputLine::error(outcome.message));
        }
    }

    /// Pick up edits another process saved to the table's file
    fn refresh_table(&self) {
        match self.state.write_table().reload_if_changed() {
            Ok(true) => self.sink.status("Command table reloaded"),
            Ok(false) => {}
            Err(e) => self
                .sink
                .output(&OutputLine::error(format!("Command table not reloaded: {}", e))),
        }
    }

    fn edit_table(&mut self, edit: TableEdit) {
        self.refresh_table();
        let result = edit.apply(&mut self.state.write_table());
        match result {
            Ok(message) => self.sink.output(&OutputLine::system(message)),
            Err(e) => self.sink.output(&OutputLine::error(e.to_string())),
        }
    }

    fn rebind_hotkey(&mut self, combo: &str) {
        let Some(binding) = self.hotkey.as_mut() else {
            self.sink
                .output(&OutputLine::error("Global hotkey is disabled".to_string()));
            return;
        };

        if let Err(e) = binding.rebind(combo) {
            self.sink.output(&OutputLine::error(e.to_string()));
            return;
        }

        self.state.config.hotkey = combo.trim().to_string();
        if let Some(path) = &self.state.config_path {
            if let Err(e) = self.state.config.save_to_file(path) {
                tracing::warn!("Failed to save config: {:#}", e);
                self.sink
                    .output(&OutputLine::error(format!("Hotkey not saved: {:#}", e)));
            }
        }
        self.sink.output(&OutputLine::system(format!(
            "Hotkey changed to {}",
            self.state.config.hotkey
        )));
    }
}
