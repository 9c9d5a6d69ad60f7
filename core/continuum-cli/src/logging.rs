//! Diagnostics for the CLI.
//!
//! Logs go to a daily rolling file under `~/.continuum/logs/` so `watch`
//! output on stdout stays readable. When the log directory cannot be
//! created, logs fall back to stderr.

use std::env;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "continuum.log";
const DEBUG_ENV: &str = "CONTINUUM_DEBUG_LOG";

/// Installs the global subscriber. Keep the returned guard alive until exit
/// so buffered lines are flushed.
pub fn init(logs_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = env_filter();

    let Some(dir) = logs_dir else {
        init_stderr(filter);
        return None;
    };

    if let Err(err) = prepare_log_dir(dir) {
        init_stderr(filter);
        tracing::warn!(error = %err, "Log directory unavailable; logging to stderr");
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .is_ok();

    installed.then_some(guard)
}

fn prepare_log_dir(dir: &Path) -> std::io::Result<()> {
    fs_err::create_dir_all(dir)
}

fn init_stderr(filter: EnvFilter) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn env_filter() -> EnvFilter {
    if debug_forced(env::var(DEBUG_ENV).ok().as_deref()) {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn debug_forced(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true" | "TRUE" | "yes" | "YES"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_values() {
        assert!(debug_forced(Some("1")));
        assert!(debug_forced(Some("yes")));
        assert!(!debug_forced(Some("0")));
        assert!(!debug_forced(None));
    }

    #[test]
    fn log_dir_errors_name_the_path() {
        let tmp = tempfile::TempDir::new().expect("temp dir");
        let blocker = tmp.path().join("logs");
        std::fs::write(&blocker, "not a directory").expect("write file");

        let err = prepare_log_dir(&blocker.join("daily")).expect_err("file in the way");
        assert!(err.to_string().contains(&*blocker.to_string_lossy()));
    }

    #[test]
    fn log_dir_is_created() {
        let tmp = tempfile::TempDir::new().expect("temp dir");
        let dir = tmp.path().join("nested").join("logs");
        prepare_log_dir(&dir).expect("create");
        assert!(dir.is_dir());
    }
}
