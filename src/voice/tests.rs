use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};
use std::time::Duration;

use super::*;
use crate::UtteranceSource;
use crate::app::AppEvent;

/// Observations shared between a test and its fake source
#[derive(Default)]
struct Tally {
    active: AtomicUsize,
    max_active: AtomicUsize,
    calls: AtomicUsize,
    threads: Mutex<HashSet<ThreadId>>,
}

/// Returns scripted results, then times out forever
struct FakeSource {
    script: VecDeque<Result<String, TranscriptionError>>,
    tally: Arc<Tally>,
}

impl SpeechSource for FakeSource {
    fn listen_once(
        &mut self,
        _limits: ListenLimits,
        cancel: &AtomicBool,
    ) -> Result<String, TranscriptionError> {
        let active = self.tally.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.tally.max_active.fetch_max(active, Ordering::SeqCst);
        self.tally.calls.fetch_add(1, Ordering::SeqCst);
        self.tally
            .threads
            .lock()
            .unwrap()
            .insert(thread::current().id());

        let result = match self.script.pop_front() {
            Some(result) => result,
            None => {
                // a short bounded wait, cut short by cancel
                for _ in 0..5 {
                    if cancel.load(Ordering::SeqCst) {
                        break;
                    }
                    thread::sleep(Duration::from_millis(2));
                }
                if cancel.load(Ordering::SeqCst) {
                    Err(TranscriptionError::Cancelled)
                } else {
                    Err(TranscriptionError::Timeout)
                }
            }
        };

        self.tally.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn coordinator(
    script: Vec<Result<String, TranscriptionError>>,
) -> (ListenCoordinator, Receiver<AppEvent>, Arc<Tally>) {
    let tally = Arc::new(Tally::default());
    let source = FakeSource {
        script: script.into(),
        tally: Arc::clone(&tally),
    };
    let (tx, rx) = mpsc::channel();
    let coordinator = ListenCoordinator::new(Box::new(source), ListenLimits::default(), tx);
    (coordinator, rx, tally)
}

fn next_utterance(rx: &Receiver<AppEvent>) -> crate::Utterance {
    loop {
        match rx.recv_timeout(Duration::from_secs(5)) {
            Ok(AppEvent::Utterance(utterance)) => return utterance,
            Ok(_) => continue,
            Err(e) => panic!("no utterance received: {e}"),
        }
    }
}

#[test]
fn test_start_is_idempotent() {
    let (coordinator, _rx, tally) = coordinator(vec![]);

    assert!(coordinator.start());
    assert!(!coordinator.start());
    assert!(!coordinator.start());
    thread::sleep(Duration::from_millis(50));
    assert!(coordinator.stop());

    assert_eq!(tally.threads.lock().unwrap().len(), 1);
    assert_eq!(coordinator.state(), ListenState::Idle);
}

#[test]
fn test_stop_when_idle_is_noop() {
    let (coordinator, _rx, _tally) = coordinator(vec![]);
    assert!(!coordinator.stop());
    assert_eq!(coordinator.state(), ListenState::Idle);
}

#[test]
fn test_stop_joins_worker() {
    let (coordinator, _rx, tally) = coordinator(vec![]);
    coordinator.start();
    thread::sleep(Duration::from_millis(20));
    coordinator.stop();

    let calls = tally.calls.load(Ordering::SeqCst);
    assert_eq!(tally.active.load(Ordering::SeqCst), 0);
    thread::sleep(Duration::from_millis(50));
    assert_eq!(tally.calls.load(Ordering::SeqCst), calls);
}

#[test]
fn test_toggle_flips_state() {
    let (coordinator, _rx, _tally) = coordinator(vec![]);
    assert_eq!(coordinator.toggle(), ListenState::Listening);
    assert!(coordinator.is_listening());
    assert_eq!(coordinator.toggle(), ListenState::Idle);
    assert!(!coordinator.is_listening());
}

#[test]
fn test_single_worker_under_concurrent_calls() {
    let (coordinator, _rx, tally) = coordinator(vec![]);
    let coordinator = Arc::new(coordinator);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let coordinator = Arc::clone(&coordinator);
            thread::spawn(move || {
                for j in 0..20 {
                    match (i + j) % 3 {
                        0 => {
                            coordinator.start();
                        }
                        1 => {
                            coordinator.stop();
                        }
                        _ => {
                            coordinator.toggle();
                        }
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    coordinator.shutdown();

    assert!(tally.max_active.load(Ordering::SeqCst) <= 1);
    assert_eq!(tally.active.load(Ordering::SeqCst), 0);
    assert_eq!(coordinator.state(), ListenState::Idle);
}

#[test]
fn test_errors_do_not_end_session() {
    let (coordinator, rx, _tally) = coordinator(vec![
        Err(TranscriptionError::Service("network down".to_string())),
        Err(TranscriptionError::Unrecognized),
        Ok("打开浏览器".to_string()),
    ]);
    coordinator.start();

    let mut saw_failure = false;
    let utterance = loop {
        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            AppEvent::Failure(message) => {
                assert!(message.contains("network down"));
                saw_failure = true;
            }
            AppEvent::Utterance(utterance) => break utterance,
            _ => {}
        }
    };
    coordinator.stop();

    assert!(saw_failure);
    assert_eq!(utterance.text(), "打开浏览器");
    assert_eq!(utterance.source(), UtteranceSource::Continuous);
}

#[test]
fn test_speech_once_while_idle() {
    let (coordinator, rx, _tally) = coordinator(vec![Ok("关闭网页".to_string())]);
    coordinator.speech_once().unwrap();

    let utterance = next_utterance(&rx);
    assert_eq!(utterance.text(), "关闭网页");
    assert_eq!(utterance.source(), UtteranceSource::OneShot);
    assert_eq!(coordinator.state(), ListenState::Idle);
}

#[test]
fn test_speech_once_refused_while_listening() {
    let (coordinator, _rx, _tally) = coordinator(vec![]);
    coordinator.start();
    assert!(matches!(
        coordinator.speech_once(),
        Err(ListenError::CaptureBusy(_))
    ));
    coordinator.stop();
}

#[test]
fn test_one_shot_and_session_never_overlap() {
    let (coordinator, _rx, tally) = coordinator(vec![]);
    for _ in 0..10 {
        let _ = coordinator.speech_once();
        coordinator.start();
        coordinator.stop();
    }
    coordinator.shutdown();
    assert_eq!(tally.max_active.load(Ordering::SeqCst), 1);
}

#[test]
fn test_shutdown_leaves_idle() {
    let (coordinator, _rx, tally) = coordinator(vec![]);
    coordinator.start();
    coordinator.shutdown();
    assert_eq!(coordinator.state(), ListenState::Idle);
    assert_eq!(tally.active.load(Ordering::SeqCst), 0);
}

/// Holds the microphone for a long time unless its own capture is cancelled
struct LongCaptureSource {
    capturing: Arc<AtomicBool>,
}

impl SpeechSource for LongCaptureSource {
    fn listen_once(
        &mut self,
        _limits: ListenLimits,
        cancel: &AtomicBool,
    ) -> Result<String, TranscriptionError> {
        self.capturing.store(true, Ordering::SeqCst);
        let mut result = Ok("很长的一句话".to_string());
        for _ in 0..150 {
            if cancel.load(Ordering::SeqCst) {
                result = Err(TranscriptionError::Cancelled);
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        self.capturing.store(false, Ordering::SeqCst);
        result
    }
}

fn long_capture_coordinator() -> (ListenCoordinator, Receiver<AppEvent>, Arc<AtomicBool>) {
    let capturing = Arc::new(AtomicBool::new(false));
    let source = LongCaptureSource {
        capturing: Arc::clone(&capturing),
    };
    let (tx, rx) = mpsc::channel();
    let coordinator = ListenCoordinator::new(Box::new(source), ListenLimits::default(), tx);
    (coordinator, rx, capturing)
}

fn wait_for_capture(capturing: &AtomicBool) {
    for _ in 0..200 {
        if capturing.load(Ordering::SeqCst) {
            return;
        }
        thread::sleep(Duration::from_millis(5));
    }
    panic!("capture never started");
}

#[test]
fn test_stop_cancels_one_shot_holding_the_source() {
    let (coordinator, rx, capturing) = long_capture_coordinator();
    coordinator.speech_once().unwrap();
    wait_for_capture(&capturing);
    assert!(coordinator.start());

    let started = std::time::Instant::now();
    assert!(coordinator.stop());
    assert!(
        started.elapsed() < Duration::from_millis(300),
        "stop took {:?}",
        started.elapsed()
    );
    assert_eq!(coordinator.state(), ListenState::Idle);

    coordinator.shutdown();
    assert!(!capturing.load(Ordering::SeqCst));
    assert!(
        rx.try_iter()
            .all(|event| !matches!(event, AppEvent::Utterance(_)))
    );
}

#[test]
fn test_shutdown_cancels_one_shot_promptly() {
    let (coordinator, _rx, capturing) = long_capture_coordinator();
    coordinator.speech_once().unwrap();
    wait_for_capture(&capturing);
    coordinator.start();

    let started = std::time::Instant::now();
    coordinator.shutdown();
    assert!(started.elapsed() < Duration::from_millis(300));
    assert!(!capturing.load(Ordering::SeqCst));
}
