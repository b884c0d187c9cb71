//! Tracing subscriber setup

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

const LOG_FILE_NAME: &str = "speakersync.log";

/// Install the global subscriber: console output plus an optional daily
/// rolling file. `RUST_LOG` overrides the configured level.
///
/// Keep the returned guard alive for as long as file logging should flush.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},speakersync=debug", config.level))
    });

    // Console layer
    let console_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed()
    };

    let mut guard = None;
    let file_layer = config.dir.as_deref().and_then(|log_dir| {
        // tracing_appender panics if it cannot create the first file, so
        // check writability before handing it the directory.
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            eprintln!(
                "Warning: Could not create log directory {} ({}), file logging disabled",
                log_dir, e
            );
            return None;
        }
        let write_test = std::path::Path::new(log_dir).join(".speakersync_write_test");
        match std::fs::OpenOptions::new().create(true).append(true).open(&write_test) {
            Ok(_) => {
                let _ = std::fs::remove_file(&write_test);
                let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
                let (non_blocking, worker_guard) = tracing_appender::non_blocking(appender);
                guard = Some(worker_guard);
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true),
                )
            }
            Err(e) => {
                eprintln!(
                    "Warning: Could not write to log directory {} ({}), file logging disabled",
                    log_dir, e
                );
                None
            }
        }
    });

    if let Err(e) = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(filter)
        .try_init()
    {
        eprintln!("Warning: logging already initialised: {}", e);
    }

    guard
}

pub fn init_logging_simple() {
    // Minimal logging for one-shot CLI commands
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .try_init();
}
