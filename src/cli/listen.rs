//! Listen command: the interactive event loop

use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc;
use tracing::{info, warn};

use super::Context;
use super::run::executor;
use voxcmd::app::{App, AppEvent, AppState, DynHotkeyBinding, TerminalSink, UiSink};
use voxcmd::engine::Engine;
use voxcmd::hotkey::{HotkeyBinding, platform_registrar, spawn_hotkey_forwarder};
use voxcmd::voice::{ListenCoordinator, ListenLimits, WhisperSpeechSource};
use voxcmd::OutputLine;

pub struct ListenOptions {
    pub dry_run: bool,
    pub no_hotkey: bool,
    pub autostart: bool,
}

/// Register the configured hotkey. Failures are reported and leave the
/// listener usable from stdin.
fn bind_hotkey(combo: &str, sink: &impl UiSink) -> Option<DynHotkeyBinding> {
    let registrar = match platform_registrar() {
        Ok(registrar) => registrar,
        Err(e) => {
            warn!("{}", e);
            sink.output(&OutputLine::error(format!("Global hotkey disabled: {}", e)));
            return None;
        }
    };

    let mut binding: DynHotkeyBinding = HotkeyBinding::new(registrar);
    if let Err(e) = binding.rebind(combo) {
        warn!("{}", e);
    }
    Some(binding)
}

pub fn listen_command(ctx: Context, options: ListenOptions) -> Result<()> {
    let table = ctx.open_table()?;
    let (events_tx, events_rx) = mpsc::channel();

    let source = WhisperSpeechSource::from_config(&ctx.config);
    let voice_problem = source.check().err();
    let coordinator = ListenCoordinator::new(
        Box::new(source),
        ListenLimits::from(&ctx.config.listen),
        events_tx.clone(),
    );

    let engine = Engine::new(ctx.config.search.clone(), executor(options.dry_run));
    let (sink, _stdin_reader) = TerminalSink::spawn(events_tx.clone());

    if let Some(problem) = &voice_problem {
        sink.output(&OutputLine::error(format!(
            "Voice input unavailable: {} (typed commands still work)",
            problem
        )));
    }

    let hotkey = if options.no_hotkey {
        None
    } else {
        bind_hotkey(&ctx.config.hotkey, &sink)
    };

    let forwarder_stop = Arc::new(AtomicBool::new(false));
    let forwarder = hotkey.as_ref().map(|binding| {
        spawn_hotkey_forwarder(binding.active_id(), events_tx.clone(), Arc::clone(&forwarder_stop))
    });

    if options.autostart {
        let _ = events_tx.send(AppEvent::Start);
    }
    drop(events_tx);

    let state = AppState::new(ctx.config, Some(ctx.config_path), table);
    let mut app = App::new(state, engine, coordinator, sink, events_rx);
    if let Some(binding) = hotkey {
        app = app.with_hotkey(binding);
    }

    info!("Type a command, or :start :stop :toggle :once :show :hotkey <combo> :quit");
    app.run();

    forwarder_stop.store(true, std::sync::atomic::Ordering::SeqCst);
    if let Some(handle) = forwarder {
        let _ = handle.join();
    }
    // the stdin reader may be blocked on a read; it ends with the process
    Ok(())
}
