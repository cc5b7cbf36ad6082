use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod cli;

use cli::Context;
use cli::listen::ListenOptions;
use cli::table::AddTarget;

#[derive(Parser)]
#[command(name = "voxcmd")]
#[command(about = "Voice-triggered command dispatcher")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.voxcmd/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the command table (overrides commands_file from the config)
    #[arg(long, global = true)]
    commands: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen for voice and typed commands (default)
    Listen {
        /// Log actions instead of performing them
        #[arg(long)]
        dry_run: bool,

        /// Don't register the global hotkey
        #[arg(long)]
        no_hotkey: bool,

        /// Start listening right away
        #[arg(long)]
        autostart: bool,
    },

    /// Interpret and run one command, then exit
    Run {
        /// The utterance, e.g. "打开浏览器"
        #[arg(required = true)]
        text: Vec<String>,

        /// Log the action instead of performing it
        #[arg(long)]
        dry_run: bool,
    },

    /// List the keyword table
    List,

    /// Add or replace a keyword
    Add {
        keyword: String,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Remove a keyword
    Remove { keyword: String },

    /// Rename a keyword, keeping its action
    Rename { old: String, new: String },

    /// Merge keywords from another command map; existing keywords are kept
    Import { file: PathBuf },

    /// Show or change the global hotkey
    Hotkey {
        /// New combination, e.g. "f8" or "ctrl+shift+l"
        combo: Option<String>,
    },

    /// Write a default config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct TargetArgs {
    /// Program to launch
    #[arg(long)]
    program: Option<PathBuf>,

    /// URL to open (must start with http)
    #[arg(long)]
    url: Option<String>,

    /// Folder to open
    #[arg(long)]
    folder: Option<PathBuf>,

    /// File to open with its default application
    #[arg(long)]
    file: Option<PathBuf>,
}

impl TargetArgs {
    fn into_target(self) -> Option<AddTarget> {
        if let Some(path) = self.program {
            return Some(AddTarget::Program(path));
        }
        if let Some(address) = self.url {
            return Some(AddTarget::Url(address));
        }
        if let Some(path) = self.folder {
            return Some(AddTarget::Folder(path));
        }
        self.file.map(AddTarget::File)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let Cli {
        config,
        commands,
        command,
        ..
    } = cli;
    let load = || Context::load(config.clone(), commands.clone());

    match command {
        Some(Commands::Listen {
            dry_run,
            no_hotkey,
            autostart,
        }) => {
            let options = ListenOptions {
                dry_run,
                no_hotkey,
                autostart,
            };
            cli::listen::listen_command(load()?, options)?;
        }
        Some(Commands::Run { text, dry_run }) => {
            cli::run::run_command(&load()?, &text.join(" "), dry_run)?;
        }
        Some(Commands::List) => cli::table::list_command(&load()?)?,
        Some(Commands::Add { keyword, target }) => {
            let Some(target) = target.into_target() else {
                anyhow::bail!("One of --program, --url, --folder or --file is required");
            };
            cli::table::add_command(&load()?, &keyword, target)?;
        }
        Some(Commands::Remove { keyword }) => cli::table::remove_command(&load()?, &keyword)?,
        Some(Commands::Rename { old, new }) => {
            cli::table::rename_command(&load()?, &old, &new)?;
        }
        Some(Commands::Import { file }) => cli::table::import_command(&load()?, &file)?,
        Some(Commands::Hotkey { combo }) => cli::hotkey::hotkey_command(&mut load()?, combo)?,
        Some(Commands::Init { force }) => {
            let path = config
                .clone()
                .unwrap_or_else(voxcmd::config::Config::global_config_path);
            cli::init::init_command(&path, force)?;
        }
        None => {
            // Default: listen
            let options = ListenOptions {
                dry_run: false,
                no_hotkey: false,
                autostart: false,
            };
            cli::listen::listen_command(load()?, options)?;
        }
    }

    Ok(())
}
