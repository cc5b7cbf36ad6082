//! Run command: interpret and dispatch one typed utterance

use anyhow::{Result, bail};
use std::io::{BufRead, Write};
use std::sync::Arc;

use super::Context;
use voxcmd::app::pick_candidate;
use voxcmd::engine::{Candidate, Chooser, Engine};
use voxcmd::executor::{ActionExecutor, DryRunExecutor, SystemExecutor};

/// Asks on the terminal which candidate was meant
struct PromptChooser;

impl Chooser for PromptChooser {
    fn choose(&self, candidates: &[Candidate]) -> Option<String> {
        eprintln!("Did you mean:");
        for (idx, candidate) in candidates.iter().enumerate() {
            eprintln!("  {}. {}", idx + 1, candidate.keyword);
        }
        eprint!("Pick a number (empty to cancel): ");
        let _ = std::io::stderr().flush();

        let mut answer = String::new();
        std::io::stdin().lock().read_line(&mut answer).ok()?;
        pick_candidate(candidates, &answer)
    }
}

pub fn executor(dry_run: bool) -> Arc<dyn ActionExecutor> {
    if dry_run {
        Arc::new(DryRunExecutor::new())
    } else {
        Arc::new(SystemExecutor::new())
    }
}

pub fn run_command(ctx: &Context, text: &str, dry_run: bool) -> Result<()> {
    let table = ctx.open_table()?;
    let engine = Engine::new(ctx.config.search.clone(), executor(dry_run));

    let outcome = engine.handle(text, &table, &PromptChooser);
    if !outcome.success {
        bail!("{}", outcome.message);
    }
    println!("{}", outcome.message);
    Ok(())
}
