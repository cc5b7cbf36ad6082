//! Global hotkey parsing, registration and forwarding.
//!
//! The hotkey only ever emits [`AppEvent::Toggle`]; the event loop decides
//! what that means.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};

use crate::app::AppEvent;

/// No hotkey is active
const NO_HOTKEY: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HotkeyError {
    #[error("Hotkey is empty")]
    Empty,

    #[error("Unknown modifier \"{0}\" (use ctrl, alt, shift or cmd)")]
    UnknownModifier(String),

    #[error("Unknown key \"{0}\"")]
    UnknownKey(String),

    #[error("Failed to register hotkey {combo}: {message}")]
    Register { combo: String, message: String },
}

const LETTERS: [Code; 26] = [
    Code::KeyA,
    Code::KeyB,
    Code::KeyC,
    Code::KeyD,
    Code::KeyE,
    Code::KeyF,
    Code::KeyG,
    Code::KeyH,
    Code::KeyI,
    Code::KeyJ,
    Code::KeyK,
    Code::KeyL,
    Code::KeyM,
    Code::KeyN,
    Code::KeyO,
    Code::KeyP,
    Code::KeyQ,
    Code::KeyR,
    Code::KeyS,
    Code::KeyT,
    Code::KeyU,
    Code::KeyV,
    Code::KeyW,
    Code::KeyX,
    Code::KeyY,
    Code::KeyZ,
];

const DIGITS: [Code; 10] = [
    Code::Digit0,
    Code::Digit1,
    Code::Digit2,
    Code::Digit3,
    Code::Digit4,
    Code::Digit5,
    Code::Digit6,
    Code::Digit7,
    Code::Digit8,
    Code::Digit9,
];

const FUNCTION_KEYS: [Code; 12] = [
    Code::F1,
    Code::F2,
    Code::F3,
    Code::F4,
    Code::F5,
    Code::F6,
    Code::F7,
    Code::F8,
    Code::F9,
    Code::F10,
    Code::F11,
    Code::F12,
];

fn parse_key(key: &str) -> Option<Code> {
    let mut chars = key.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if ch.is_ascii_lowercase() {
            return Some(LETTERS[(ch as u8 - b'a') as usize]);
        }
        if ch.is_ascii_digit() {
            return Some(DIGITS[(ch as u8 - b'0') as usize]);
        }
    }

    if let Some(n) = key.strip_prefix('f').and_then(|n| n.parse::<usize>().ok()) {
        return (1..=FUNCTION_KEYS.len())
            .contains(&n)
            .then(|| FUNCTION_KEYS[n - 1]);
    }

    let code = match key {
        "space" => Code::Space,
        "enter" | "return" => Code::Enter,
        "escape" | "esc" => Code::Escape,
        "tab" => Code::Tab,
        "backspace" => Code::Backspace,
        "delete" => Code::Delete,
        "insert" => Code::Insert,
        "home" => Code::Home,
        "end" => Code::End,
        "pageup" => Code::PageUp,
        "pagedown" => Code::PageDown,
        "up" => Code::ArrowUp,
        "down" => Code::ArrowDown,
        "left" => Code::ArrowLeft,
        "right" => Code::ArrowRight,
        "pause" => Code::Pause,
        _ => return None,
    };
    Some(code)
}

/// Parse a hotkey string like "f8" or "ctrl+shift+l"
pub fn parse_hotkey_string(hotkey_str: &str) -> Result<(Modifiers, Code), HotkeyError> {
    let hotkey_lower = hotkey_str.trim().to_lowercase();
    let parts: Vec<&str> = hotkey_lower.split('+').map(str::trim).collect();
    let Some((key_part, modifier_parts)) = parts.split_last() else {
        return Err(HotkeyError::Empty);
    };
    if key_part.is_empty() {
        return Err(HotkeyError::Empty);
    }

    let mut modifiers = Modifiers::empty();
    for part in modifier_parts {
        match *part {
            "cmd" | "command" | "super" | "win" => modifiers |= Modifiers::SUPER,
            "ctrl" | "control" => modifiers |= Modifiers::CONTROL,
            "alt" | "option" => modifiers |= Modifiers::ALT,
            "shift" => modifiers |= Modifiers::SHIFT,
            other => return Err(HotkeyError::UnknownModifier(other.to_string())),
        }
    }

    let code = parse_key(key_part).ok_or_else(|| HotkeyError::UnknownKey(key_part.to_string()))?;
    Ok((modifiers, code))
}

/// Parse into a registrable [`HotKey`]
pub fn parse_hotkey(hotkey_str: &str) -> Result<HotKey, HotkeyError> {
    let (modifiers, code) = parse_hotkey_string(hotkey_str)?;
    let modifiers = (!modifiers.is_empty()).then_some(modifiers);
    Ok(HotKey::new(modifiers, code))
}

/// OS-level hotkey registration
pub trait HotkeyRegistrar {
    fn register(&mut self, hotkey: HotKey) -> Result<(), String>;
    fn unregister(&mut self, hotkey: HotKey) -> Result<(), String>;
}

impl<R: HotkeyRegistrar + ?Sized> HotkeyRegistrar for Box<R> {
    fn register(&mut self, hotkey: HotKey) -> Result<(), String> {
        (**self).register(hotkey)
    }

    fn unregister(&mut self, hotkey: HotKey) -> Result<(), String> {
        (**self).unregister(hotkey)
    }
}

/// Registrar backed by the `global-hotkey` crate.
///
/// Presses are only delivered while the creating thread services the
/// platform's event loop; see [`platform_registrar`].
pub struct GlobalHotkeyRegistrar {
    manager: GlobalHotKeyManager,
}

impl GlobalHotkeyRegistrar {
    pub fn new() -> Result<Self, String> {
        GlobalHotKeyManager::new()
            .map(|manager| Self { manager })
            .map_err(|e| format!("Failed to create global hotkey manager: {}", e))
    }
}

impl HotkeyRegistrar for GlobalHotkeyRegistrar {
    fn register(&mut self, hotkey: HotKey) -> Result<(), String> {
        self.manager.register(hotkey).map_err(|e| e.to_string())
    }

    fn unregister(&mut self, hotkey: HotKey) -> Result<(), String> {
        self.manager.unregister(hotkey).map_err(|e| e.to_string())
    }
}

enum RegistrarRequest {
    Register(HotKey, Sender<Result<(), String>>),
    Unregister(HotKey, Sender<Result<(), String>>),
}

/// How often the registrar thread drains the platform message queue
const PUMP_INTERVAL: Duration = Duration::from_millis(20);

/// Registrar living on a dedicated thread.
///
/// The inner registrar is created on that thread and every register and
/// unregister call runs there. Between requests the thread calls `pump`,
/// which on Windows dispatches the window messages that carry key presses.
pub struct ThreadedRegistrar {
    requests: Option<Sender<RegistrarRequest>>,
    handle: Option<JoinHandle<()>>,
}

impl ThreadedRegistrar {
    pub fn spawn<R, F>(make: F, pump: fn()) -> Result<Self, String>
    where
        R: HotkeyRegistrar,
        F: FnOnce() -> Result<R, String> + Send + 'static,
    {
        let (requests_tx, requests_rx) = mpsc::channel::<RegistrarRequest>();
        let (ready_tx, ready_rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let mut registrar = match make() {
                Ok(registrar) => {
                    let _ = ready_tx.send(Ok(()));
                    registrar
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            loop {
                match requests_rx.recv_timeout(PUMP_INTERVAL) {
                    Ok(RegistrarRequest::Register(hotkey, reply)) => {
                        let _ = reply.send(registrar.register(hotkey));
                    }
                    Ok(RegistrarRequest::Unregister(hotkey, reply)) => {
                        let _ = reply.send(registrar.unregister(hotkey));
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
                pump();
            }
        });

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                requests: Some(requests_tx),
                handle: Some(handle),
            }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err("Hotkey thread exited during startup".to_string())
            }
        }
    }

    fn call(
        &self,
        request: impl FnOnce(Sender<Result<(), String>>) -> RegistrarRequest,
    ) -> Result<(), String> {
        let requests = self
            .requests
            .as_ref()
            .ok_or_else(|| "Hotkey thread is gone".to_string())?;
        let (reply_tx, reply_rx) = mpsc::channel();
        requests
            .send(request(reply_tx))
            .map_err(|_| "Hotkey thread is gone".to_string())?;
        reply_rx
            .recv()
            .map_err(|_| "Hotkey thread is gone".to_string())?
    }
}

impl HotkeyRegistrar for ThreadedRegistrar {
    fn register(&mut self, hotkey: HotKey) -> Result<(), String> {
        self.call(|reply| RegistrarRequest::Register(hotkey, reply))
    }

    fn unregister(&mut self, hotkey: HotKey) -> Result<(), String> {
        self.call(|reply| RegistrarRequest::Unregister(hotkey, reply))
    }
}

impl Drop for ThreadedRegistrar {
    fn drop(&mut self) {
        // closing the request channel ends the thread
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Drain this thread's window message queue
#[cfg(target_os = "windows")]
pub fn pump_messages() {
    use windows::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, MSG, PM_REMOVE, PeekMessageW, TranslateMessage,
    };

    let mut msg = MSG::default();
    // SAFETY: `msg` is a valid, writable MSG for the duration of each call
    unsafe {
        while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}

/// Nothing to pump: the X11 backend delivers presses from its own thread
#[cfg(not(target_os = "windows"))]
pub fn pump_messages() {}

/// The registrar that delivers presses on this platform.
///
/// Windows registers hotkeys per thread and needs a message loop on that
/// thread, so the manager gets a [`ThreadedRegistrar`]. macOS needs the
/// application's main run loop, which a terminal program does not run.
pub fn platform_registrar() -> Result<Box<dyn HotkeyRegistrar>, String> {
    #[cfg(target_os = "windows")]
    {
        let registrar = ThreadedRegistrar::spawn(GlobalHotkeyRegistrar::new, pump_messages)?;
        Ok(Box::new(registrar))
    }

    #[cfg(target_os = "macos")]
    {
        Err("Global hotkeys need an application run loop on macOS; use :toggle instead"
            .to_string())
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        Ok(Box::new(GlobalHotkeyRegistrar::new()?))
    }
}

/// The single active hotkey binding.
///
/// Presses are only forwarded for the id in `active_id`, so during a rebind
/// exactly one of old and new is effective at any instant.
pub struct HotkeyBinding<R: HotkeyRegistrar> {
    registrar: R,
    current: Option<(String, HotKey)>,
    active_id: Arc<AtomicU32>,
}

impl<R: HotkeyRegistrar> HotkeyBinding<R> {
    pub fn new(registrar: R) -> Self {
        Self {
            registrar,
            current: None,
            active_id: Arc::new(AtomicU32::new(NO_HOTKEY)),
        }
    }

    /// The combo string currently bound
    pub fn combo(&self) -> Option<&str> {
        self.current.as_ref().map(|(combo, _)| combo.as_str())
    }

    /// Id the forwarder compares incoming events against
    pub fn active_id(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.active_id)
    }

    /// Bind `combo`, replacing any previous binding.
    ///
    /// On failure the previous binding stays active and untouched.
    pub fn rebind(&mut self, combo: &str) -> Result<(), HotkeyError> {
        let hotkey = parse_hotkey(combo)?;

        if let Some((_, old)) = &self.current {
            if old.id() == hotkey.id() {
                self.current = Some((combo.trim().to_string(), hotkey));
                return Ok(());
            }
        }

        self.registrar
            .register(hotkey)
            .map_err(|message| HotkeyError::Register {
                combo: combo.to_string(),
                message,
            })?;

        self.active_id.store(hotkey.id(), Ordering::SeqCst);

        if let Some((old_combo, old)) = self.current.take() {
            if let Err(e) = self.registrar.unregister(old) {
                tracing::warn!("Failed to unregister hotkey {}: {}", old_combo, e);
            }
        }

        tracing::info!("Global hotkey registered: {}", combo);
        self.current = Some((combo.trim().to_string(), hotkey));
        Ok(())
    }

    /// Drop the binding entirely
    pub fn clear(&mut self) {
        self.active_id.store(NO_HOTKEY, Ordering::SeqCst);
        if let Some((combo, hotkey)) = self.current.take() {
            if let Err(e) = self.registrar.unregister(hotkey) {
                tracing::warn!("Failed to unregister hotkey {}: {}", combo, e);
            }
        }
    }
}

/// Forward presses of the active hotkey as [`AppEvent::Toggle`].
///
/// Runs until `stop` is set or the event receiver is gone.
pub fn spawn_hotkey_forwarder(
    active_id: Arc<AtomicU32>,
    events: Sender<AppEvent>,
    stop: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let receiver = GlobalHotKeyEvent::receiver();
        while !stop.load(Ordering::SeqCst) {
            let Ok(event) = receiver.recv_timeout(Duration::from_millis(200)) else {
                continue;
            };
            if event.state != HotKeyState::Pressed {
                continue;
            }
            let active = active_id.load(Ordering::SeqCst);
            if active == NO_HOTKEY || event.id != active {
                continue;
            }
            if events.send(AppEvent::Toggle).is_err() {
                break;
            }
        }
    })
}
