//! Log routing for a migration run.
//!
//! Console output goes to stderr so stdout only carries the run result. Every run also
//! gets its own log file named after its start time, under `IADB_VECTORIZER_LOG_DIR`
//! (default `logs/`), written through a non-blocking appender.
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use time::{OffsetDateTime, UtcOffset};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const LOG_DIR_ENV: &str = "IADB_VECTORIZER_LOG_DIR";
const DEFAULT_LOG_DIR: &str = "logs";

/// Install the stderr console layer and this run's file layer.
///
/// Respects `RUST_LOG` (defaults to `info`). Returns the run log path, or `None` when
/// the file could not be opened and only console logging is active.
pub fn init_tracing() -> Option<PathBuf> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    let log_dir = std::env::var_os(LOG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));
    let log_path = run_log_path(&log_dir, OffsetDateTime::now_utc());

    let (result, installed) = match open_run_log(&log_path) {
        Some(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let _ = LOG_GUARD.set(guard);
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false);
            (registry.with(file_layer).try_init(), Some(log_path))
        }
        None => (registry.try_init(), None),
    };

    if let Err(err) = result {
        eprintln!("Tracing already initialized: {err}");
        return None;
    }
    installed
}

/// Log file for a run started at `started_at`, e.g. `logs/run-20241017T100500Z.log`.
pub fn run_log_path(dir: &Path, started_at: OffsetDateTime) -> PathBuf {
    let utc = started_at.to_offset(UtcOffset::UTC);
    dir.join(format!(
        "run-{:04}{:02}{:02}T{:02}{:02}{:02}Z.log",
        utc.year(),
        u8::from(utc.month()),
        utc.day(),
        utc.hour(),
        utc.minute(),
        utc.second()
    ))
}

fn open_run_log(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent()
        && let Err(err) = std::fs::create_dir_all(parent)
    {
        eprintln!("Failed to create log directory {}: {err}", parent.display());
        return None;
    }
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(file),
        Err(err) => {
            eprintln!("Failed to open log file {}: {err}", path.display());
            None
        }
    }
}
