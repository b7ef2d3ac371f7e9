//! Logging through `tracing`, written to a file because the terminal belongs
//! to the TUI.
//!
//! Levels: `-v` gives debug, `-vv` trace, none gives info. `RUST_LOG`
//! overrides all of them.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Our crate at `level`, dependencies at warn, unless `RUST_LOG` says otherwise.
fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.as_str().to_lowercase();
        EnvFilter::new(format!("warn,works_explorer={level}"))
    })
}

/// Install the global subscriber, appending to `path`. Call once.
pub fn init_logging(path: &Path, verbosity: u8) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(build_env_filter(level_for(verbosity)))
        .with(layer)
        .try_init()
        .map_err(io::Error::other)
}
