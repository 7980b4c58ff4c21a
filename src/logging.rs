//! File logging. The TUI owns the terminal, so nothing is written to stdout
//! or stderr while it runs.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingSettings;
use crate::library::ensure;

/// `<state dir>/soundmix/soundmix.log`, falling back to the local data dir
/// on platforms without a state dir.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|d| d.join("soundmix").join("soundmix.log"))
}

pub fn log_path(settings: &LoggingSettings) -> Option<PathBuf> {
    settings.file.clone().or_else(default_log_path)
}

fn open_log(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        ensure(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// `RUST_LOG` wins over the configured level.
fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Returns the log file in use, if any.
///
/// When no log file can be opened logging is disabled rather than allowed
/// to draw over the UI.
pub fn init(settings: &LoggingSettings) -> Option<PathBuf> {
    let path = log_path(settings)?;
    let file = open_log(&path).ok()?;

    let installed = tracing_subscriber::registry()
        .with(filter(&settings.level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init();

    installed.ok().map(|_| path)
}
