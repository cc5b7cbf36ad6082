//! Platform executor. URLs, folders and files go to the desktop's default
//! handler through the `open` crate; key chords and closing the foreground
//! program use `osascript` on macOS and `xdotool` on Linux.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use super::{ActionExecutor, ExecutionError};
use crate::KeyChord;

/// Hands a URL or path to the desktop
pub type Opener = fn(&OsStr) -> std::io::Result<()>;

fn open_default(target: &OsStr) -> std::io::Result<()> {
    open::that(target)
}

#[derive(Debug, Clone, Copy)]
pub struct SystemExecutor {
    opener: Opener,
}

impl Default for SystemExecutor {
    fn default() -> Self {
        Self {
            opener: open_default,
        }
    }
}

impl SystemExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `opener` instead of the desktop's default handler
    pub fn with_opener(opener: Opener) -> Self {
        Self { opener }
    }

    /// Hand a path or URL to the opener as a single argument.
    ///
    /// `open` goes through ShellExecuteW on Windows, so the target never
    /// passes through a `cmd.exe` command line.
    fn open_target(&self, target: &OsStr) -> Result<String, ExecutionError> {
        (self.opener)(target).map_err(|e| {
            ExecutionError(format!("Failed to open {}: {}", target.to_string_lossy(), e))
        })?;
        Ok(String::new())
    }
}

/// Spawn `command` detached from our stdio; a helper thread reaps it
fn spawn_detached(mut command: Command, what: &str) -> Result<String, ExecutionError> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ExecutionError(format!("Failed to start {}: {}", what, e)))?;

    let detail = format!("pid {}", child.id());
    thread::spawn(move || {
        let _ = child.wait();
    });
    Ok(detail)
}

/// Run a helper to completion and turn a non-zero exit into an error
fn run_helper(command: &mut Command, helper: &str) -> Result<String, ExecutionError> {
    let output = command
        .output()
        .map_err(|e| ExecutionError(format!("Failed to run {}: {}", helper, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExecutionError(format!("{} failed: {}", helper, stderr.trim())));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn require_existing(path: &Path, what: &str) -> Result<(), ExecutionError> {
    if path.exists() {
        Ok(())
    } else {
        Err(ExecutionError(format!("{} not found: {}", what, path.display())))
    }
}

/// Translate a chord into xdotool's `key` syntax (`ctrl+w`, `alt+Left`, `F5`)
pub fn xdotool_chord(chord: &KeyChord) -> String {
    chord
        .keys()
        .iter()
        .map(|key| match key.to_lowercase().as_str() {
            "ctrl" | "control" => "ctrl".to_string(),
            "alt" | "option" => "alt".to_string(),
            "shift" => "shift".to_string(),
            "cmd" | "super" | "win" | "meta" => "super".to_string(),
            "left" => "Left".to_string(),
            "right" => "Right".to_string(),
            "up" => "Up".to_string(),
            "down" => "Down".to_string(),
            "enter" | "return" => "Return".to_string(),
            "esc" | "escape" => "Escape".to_string(),
            "tab" => "Tab".to_string(),
            "space" => "space".to_string(),
            lower if lower.len() > 1 && lower.starts_with('f') && lower[1..].parse::<u8>().is_ok() => {
                lower.to_uppercase()
            }
            lower => lower.to_string(),
        })
        .collect::<Vec<_>>()
        .join("+")
}

/// AppleScript that presses `chord` via System Events
#[cfg(target_os = "macos")]
fn applescript_chord(chord: &KeyChord) -> Result<String, ExecutionError> {
    let key = chord
        .key()
        .ok_or_else(|| ExecutionError("Empty key chord".to_string()))?;

    let modifiers: Vec<&str> = chord
        .modifiers()
        .iter()
        .filter_map(|m| match m.to_lowercase().as_str() {
            // browsers on macOS use Command where others use Control
            "ctrl" | "control" | "cmd" => Some("command down"),
            "alt" | "option" => Some("option down"),
            "shift" => Some("shift down"),
            _ => None,
        })
        .collect();
    let using = if modifiers.is_empty() {
        String::new()
    } else {
        format!(" using {{{}}}", modifiers.join(", "))
    };

    let press = match key.to_lowercase().as_str() {
        "left" => "key code 123".to_string(),
        "right" => "key code 124".to_string(),
        "f5" => "key code 96".to_string(),
        other => format!("keystroke \"{}\"", other),
    };

    Ok(format!(
        "tell application \"System Events\" to {}{}",
        press, using
    ))
}

impl ActionExecutor for SystemExecutor {
    fn launch(&self, path: &Path) -> Result<String, ExecutionError> {
        // Bare program names are resolved through PATH, so only check paths
        if path.components().count() > 1 {
            require_existing(path, "Program")?;
        }
        spawn_detached(Command::new(path), &path.display().to_string())
    }

    fn open_url(&self, address: &str) -> Result<String, ExecutionError> {
        self.open_target(OsStr::new(address))
    }

    fn open_folder(&self, path: &Path) -> Result<String, ExecutionError> {
        require_existing(path, "Folder")?;
        self.open_target(path.as_os_str())
    }

    fn open_file(&self, path: &Path) -> Result<String, ExecutionError> {
        require_existing(path, "File")?;
        self.open_target(path.as_os_str())
    }

    #[cfg(target_os = "macos")]
    fn send_keys(&self, chord: &KeyChord) -> Result<String, ExecutionError> {
        let script = applescript_chord(chord)?;
        run_helper(Command::new("osascript").args(["-e", &script]), "osascript")
    }

    #[cfg(target_os = "linux")]
    fn send_keys(&self, chord: &KeyChord) -> Result<String, ExecutionError> {
        run_helper(
            Command::new("xdotool").args(["key", &xdotool_chord(chord)]),
            "xdotool",
        )
        .map_err(|e| ExecutionError(format!("{} (sending keys requires xdotool)", e)))
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    fn send_keys(&self, chord: &KeyChord) -> Result<String, ExecutionError> {
        Err(ExecutionError(format!(
            "Sending {} is not supported on this platform yet",
            chord
        )))
    }

    #[cfg(target_os = "macos")]
    fn close_foreground(&self) -> Result<String, ExecutionError> {
        let script = r#"tell application "System Events" to set frontApp to name of first application process whose frontmost is true
tell application frontApp to quit
return frontApp"#;
        run_helper(Command::new("osascript").args(["-e", script]), "osascript")
    }

    #[cfg(target_os = "linux")]
    fn close_foreground(&self) -> Result<String, ExecutionError> {
        let pid = run_helper(
            Command::new("xdotool").args(["getactivewindow", "getwindowpid"]),
            "xdotool",
        )?;
        let pid: u32 = pid
            .parse()
            .map_err(|_| ExecutionError(format!("Unexpected pid from xdotool: {}", pid)))?;
        if pid == std::process::id() {
            return Err(ExecutionError(
                "Foreground window belongs to this program".to_string(),
            ));
        }

        let name = std::fs::read_to_string(format!("/proc/{}/comm", pid))
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| format!("pid {}", pid));

        run_helper(
            Command::new("kill").args(["-TERM", &pid.to_string()]),
            "kill",
        )?;
        Ok(name)
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    fn close_foreground(&self) -> Result<String, ExecutionError> {
        Err(ExecutionError(
            "Closing the foreground program is not supported on this platform yet".to_string(),
        ))
    }
}
