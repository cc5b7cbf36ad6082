//! Lifecycle of the background listening session and one-shot recognition.
//!
//! Invariants:
//! - at most one listening worker exists at a time
//! - `stop()` returns only after the worker thread has been joined
//! - the speech source is shared behind one mutex, so the worker and a
//!   one-shot capture never use the microphone at the same time

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::source::SpeechSource;
use super::types::{ListenError, ListenLimits, ListenState, TranscriptionError};
use crate::app::AppEvent;
use crate::{Utterance, UtteranceSource};

const SERVICE_RETRY_STEP: Duration = Duration::from_millis(50);
const SERVICE_RETRY_STEPS: u32 = 20;

type SharedSource = Arc<Mutex<Box<dyn SpeechSource>>>;

struct ListenSession {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

struct OneShot {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

pub struct ListenCoordinator {
    source: SharedSource,
    limits: ListenLimits,
    events: Sender<AppEvent>,
    session: Mutex<Option<ListenSession>>,
    one_shot: Mutex<Option<OneShot>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ListenCoordinator {
    pub fn new(
        source: Box<dyn SpeechSource>,
        limits: ListenLimits,
        events: Sender<AppEvent>,
    ) -> Self {
        Self {
            source: Arc::new(Mutex::new(source)),
            limits,
            events,
            session: Mutex::new(None),
            one_shot: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ListenState {
        if lock(&self.session).is_some() {
            ListenState::Listening
        } else {
            ListenState::Idle
        }
    }

    pub fn is_listening(&self) -> bool {
        self.state().is_listening()
    }

    /// Start a listening session. Returns false if one is already running.
    pub fn start(&self) -> bool {
        let mut session = lock(&self.session);
        self.start_locked(&mut session)
    }

    /// Stop the session and join its worker. Returns false if idle.
    /// A one-shot capture in progress is cancelled as well.
    pub fn stop(&self) -> bool {
        let mut session = lock(&self.session);
        self.stop_locked(&mut session)
    }

    /// Start if idle, stop if listening. Returns the new state.
    pub fn toggle(&self) -> ListenState {
        let mut session = lock(&self.session);
        if session.is_some() {
            self.stop_locked(&mut session);
            ListenState::Idle
        } else {
            self.start_locked(&mut session);
            ListenState::Listening
        }
    }

    fn start_locked(&self, session: &mut Option<ListenSession>) -> bool {
        if session.is_some() {
            tracing::debug!("Listening already active, start ignored");
            return false;
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let handle = {
            let cancel = Arc::clone(&cancel);
            let source = Arc::clone(&self.source);
            let events = self.events.clone();
            let limits = self.limits;
            thread::spawn(move || listen_loop(source, limits, events, cancel))
        };

        *session = Some(ListenSession { cancel, handle });
        tracing::info!("Listening started");
        let _ = self
            .events
            .send(AppEvent::Status("🎤 Listening...".to_string()));
        true
    }

    // The session lock stays held across the join so that a concurrent
    // start() cannot spawn a second worker while the old one winds down.
    // A one-shot capture holding the source is cancelled too, otherwise the
    // worker would sit waiting for the source until that capture ends.
    fn stop_locked(&self, session: &mut Option<ListenSession>) -> bool {
        let Some(active) = session.take() else {
            return false;
        };
        active.cancel.store(true, Ordering::SeqCst);
        self.cancel_one_shot();
        if active.handle.join().is_err() {
            tracing::error!("Listening worker panicked");
        }
        tracing::info!("Listening stopped");
        true
    }

    /// Capture and transcribe a single phrase in the background.
    ///
    /// Refused while a listening session or another one-shot owns the
    /// microphone. The result arrives as an [`AppEvent`].
    pub fn speech_once(&self) -> Result<(), ListenError> {
        let session = lock(&self.session);
        if session.is_some() {
            return Err(ListenError::CaptureBusy("listening session is active"));
        }

        let mut one_shot = lock(&self.one_shot);
        if one_shot.as_ref().is_some_and(|o| !o.handle.is_finished()) {
            return Err(ListenError::CaptureBusy("recognition already in progress"));
        }
        if let Some(done) = one_shot.take() {
            let _ = done.handle.join();
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let handle = {
            let cancel = Arc::clone(&cancel);
            let source = Arc::clone(&self.source);
            let events = self.events.clone();
            let limits = self.limits;
            thread::spawn(move || {
                let _ = events.send(AppEvent::Status("🎤 Say a command...".to_string()));
                let result = lock(&source).listen_once(limits, &cancel);
                match result {
                    Ok(text) => {
                        let _ = events.send(AppEvent::Utterance(Utterance::new(
                            text,
                            UtteranceSource::OneShot,
                        )));
                    }
                    Err(TranscriptionError::Cancelled) => {}
                    Err(e) => {
                        let _ = events.send(AppEvent::Failure(e.to_string()));
                    }
                }
            })
        };
        *one_shot = Some(OneShot { cancel, handle });
        Ok(())
    }

    fn cancel_one_shot(&self) {
        if let Some(one_shot) = lock(&self.one_shot).as_ref() {
            one_shot.cancel.store(true, Ordering::SeqCst);
        }
    }

    /// Stop everything and join all threads. Leaves the coordinator idle.
    pub fn shutdown(&self) {
        self.cancel_one_shot();
        self.stop();
        if let Some(one_shot) = lock(&self.one_shot).take() {
            let _ = one_shot.handle.join();
        }
    }
}

impl Drop for ListenCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Worker body: capture, hand off, repeat until cancelled.
///
/// Recoverable failures are reported and the loop goes on.
fn listen_loop(
    source: SharedSource,
    limits: ListenLimits,
    events: Sender<AppEvent>,
    cancel: Arc<AtomicBool>,
) {
    while !cancel.load(Ordering::SeqCst) {
        let result = {
            let mut source = lock(&source);
            if cancel.load(Ordering::SeqCst) {
                break;
            }
            source.listen_once(limits, &cancel)
        };

        let failed = matches!(result, Err(TranscriptionError::Service(_)));
        let event = match result {
            Ok(text) => AppEvent::Utterance(Utterance::new(text, UtteranceSource::Continuous)),
            Err(TranscriptionError::Cancelled) => break,
            Err(e @ TranscriptionError::Timeout) => {
                tracing::debug!("No speech before timeout, still listening");
                AppEvent::Status(format!("{}, still listening", e))
            }
            Err(e @ TranscriptionError::Unrecognized) => AppEvent::Status(e.to_string()),
            Err(e @ TranscriptionError::Service(_)) => {
                tracing::warn!("{}", e);
                AppEvent::Failure(e.to_string())
            }
        };

        if cancel.load(Ordering::SeqCst) {
            break;
        }
        if events.send(event).is_err() {
            // nobody is consuming events anymore
            break;
        }
        if failed {
            backoff(&cancel);
        }
    }
}

/// Wait a moment after a service failure so a missing recorder doesn't spin
fn backoff(cancel: &AtomicBool) {
    for _ in 0..SERVICE_RETRY_STEPS {
        if cancel.load(Ordering::SeqCst) {
            return;
        }
        thread::sleep(SERVICE_RETRY_STEP);
    }
}
