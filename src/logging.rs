//! Tracing configuration and log routing.
//!
//! The server logs to stdout with a compact formatter and mirrors everything into a log file:
//! `PAPER_PODCAST_LOG_FILE` when set, otherwise `logs/paper-podcast.log`. The CLI logs to
//! stderr only, keeping stdout free for the batch report.
use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_ENV: &str = "PAPER_PODCAST_LOG_FILE";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_NAME: &str = "paper-podcast.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Configure tracing for the HTTP server: stdout plus a non-blocking file layer.
///
/// Respects `RUST_LOG` (defaults to `info`). When the log file cannot be opened the server keeps
/// running with stdout logging only.
pub fn init_tracing() {
    let stdout_layer = fmt::layer().with_target(false).compact();
    let registry = tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(stdout_layer);

    match configure_file_writer() {
        Some(writer) => {
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .compact();
            registry.with(file_layer).init();
        }
        None => registry.init(),
    }
}

/// Configure tracing for the command-line runner: stderr only, `warn` unless `RUST_LOG` says
/// otherwise.
pub fn init_cli_tracing() {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();
    tracing_subscriber::registry()
        .with(env_filter("warn"))
        .with(stderr_layer)
        .init();
}

fn configure_file_writer() -> Option<NonBlocking> {
    let file = match std::env::var(LOG_FILE_ENV) {
        Ok(path) => open_append(Path::new(&path)),
        Err(_) => {
            if let Err(err) = std::fs::create_dir_all(DEFAULT_LOG_DIR) {
                eprintln!("Failed to create logs directory: {err}");
                return None;
            }
            open_append(&Path::new(DEFAULT_LOG_DIR).join(DEFAULT_LOG_NAME))
        }
    }?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    let _ = LOG_GUARD.set(guard);
    Some(non_blocking)
}

fn open_append(path: &Path) -> Option<std::fs::File> {
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| eprintln!("Failed to open log file {}: {err}", path.display()))
        .ok()
}
