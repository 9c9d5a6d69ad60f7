//! continuum: automatic project activity tracking.
//!
//! Scans a project for changed source files, classifies what kind of work is
//! happening, and appends it to the project's memory document. The same
//! document can be edited directly with the note and task commands.
//!
//! ## Subcommands
//!
//! - `scan`: one scan tick
//! - `watch`: scan every INTERVAL seconds until interrupted
//! - `summary`: recent automatically detected activity
//! - `log`, `phase`, `next`, `done`: write to the memory document
//! - `context`, `history`, `tasks`: read from the memory document

mod commands;
mod error;
mod logging;
mod report;
mod watch;

use chrono::Local;
use clap::{Parser, Subcommand};
use continuum_core::{
    Config, ContinuumError, FileTracker, JsonFileStore, MemoryDocument, StorageConfig,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::commands::MemoryCommands;
use crate::error::{CliError, CliResult};

#[derive(Parser)]
#[command(name = "continuum")]
#[command(about = "Automatic project activity tracking")]
#[command(version)]
struct Cli {
    /// Project root to track (default: current directory)
    #[arg(long, global = true, value_name = "DIR")]
    project: Option<PathBuf>,

    /// Config file (default: ~/.continuum/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan once and log any detected activity
    Scan,

    /// Scan repeatedly until interrupted
    Watch {
        /// Seconds between scans (default: scan.interval_secs from config)
        #[arg(value_name = "INTERVAL")]
        interval: Option<u64>,
    },

    /// Show recent automatically detected activity
    Summary,

    /// Append a note to the session history
    Log {
        #[arg(value_name = "NOTES")]
        notes: String,

        /// Activity kind stored with the note
        #[arg(long, default_value = "note")]
        kind: String,
    },

    /// Set the current project phase (empty string clears it)
    Phase {
        #[arg(value_name = "PHASE")]
        phase: String,
    },

    /// Add a pending task
    Next {
        #[arg(value_name = "TASK")]
        task: String,
    },

    /// Mark a task as done
    Done {
        #[arg(value_name = "TASK")]
        task: String,
    },

    /// Print the compact context block for agents
    Context,

    /// Show session history, newest first
    History {
        /// Only show records of this kind
        #[arg(long)]
        kind: Option<String>,

        /// Maximum number of records
        #[arg(long, default_value_t = continuum_core::memory::DEFAULT_HISTORY_LIMIT)]
        limit: usize,
    },

    /// List pending tasks
    Tasks,
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            let _guard = logging::init(None);
            tracing::error!(error = %err, "Failed to load config");
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    };

    let storage = match resolve_storage(cli.project.as_deref(), &config) {
        Ok(storage) => storage,
        Err(err) => {
            let _guard = logging::init(None);
            tracing::error!(error = %err, "Failed to resolve project");
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    };

    let _logging_guard = logging::init(Some(storage.logs_dir().as_path()));
    tracing::debug!(project = %storage.project_root().display(), "continuum starting");

    match run(cli.command, &config, &storage) {
        Ok(output) => print!("{}", output),
        Err(err) => {
            tracing::error!(error = %err, "continuum command failed");
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }
}

fn resolve_storage(project: Option<&Path>, config: &Config) -> Result<StorageConfig, ContinuumError> {
    let requested = match project {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().map_err(|e| ContinuumError::Io {
            context: "Failed to read current directory".to_string(),
            source: e,
        })?,
    };
    let project_root = fs_err::canonicalize(&requested)
        .map_err(|err| {
            tracing::debug!(error = %err, "Project root could not be resolved");
        })
        .ok()
        .filter(|path| path.is_dir())
        .ok_or_else(|| ContinuumError::ProjectRootNotFound(requested.clone()))?;
    StorageConfig::new(project_root, config.files.clone())
}

fn run(command: Commands, config: &Config, storage: &StorageConfig) -> CliResult<String> {
    let memory = || MemoryCommands::new(JsonFileStore::<MemoryDocument>::new(storage.memory_file()));

    match command {
        Commands::Scan => {
            println!("Scanning for project changes...");
            let tick = FileTracker::from_config(config, storage).tick()?;
            for path in &tick.scan.unreadable {
                tracing::warn!(path = %path, "File could not be read");
            }
            Ok(report::render_tick(&tick))
        }
        Commands::Watch { interval } => {
            let secs = interval.unwrap_or(config.scan.interval_secs);
            if secs == 0 {
                return Err(CliError::InvalidInterval);
            }
            let tracker = FileTracker::from_config(config, storage);
            watch::run(&tracker, Duration::from_secs(secs));
            Ok(String::new())
        }
        Commands::Summary => Ok(format!("{}\n", memory().summary().trim_end())),
        Commands::Log { notes, kind } => memory().log(Local::now(), &notes, &kind),
        Commands::Phase { phase } => memory().phase(&phase),
        Commands::Next { task } => memory().next(&task),
        Commands::Done { task } => memory().done(Local::now(), &task),
        Commands::Context => Ok(memory().context()),
        Commands::History { kind, limit } => Ok(memory().history(kind.as_deref(), limit)),
        Commands::Tasks => Ok(memory().tasks()),
    }
}
