//! Logging init: stderr always, plus an appended log file when one is given.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info,resilient_probe=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Opens `path` for appending, creating parent directories as needed.
pub fn open_log_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating log directory {}", dir.display()))?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}

// Stderr always; the file layer is skipped when `file` is `None`.
fn subscriber(file: Option<Arc<File>>) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(io::stderr))
        .with(file.map(|file| fmt::layer().with_ansi(false).with_writer(file)))
}

/// Initialize logging to stderr and to `path` at the same time.
///
/// Fails without installing anything if the file cannot be opened, so the
/// caller can fall back to [`init_logging_stderr`].
pub fn init_logging(path: &Path) -> Result<()> {
    let file = Arc::new(open_log_file(path)?);

    subscriber(Some(file))
        .try_init()
        .context("installing tracing subscriber")?;

    tracing::info!("logging to stderr and {}", path.display());
    Ok(())
}

/// Initialize logging to stderr only.
pub fn init_logging_stderr() -> Result<()> {
    subscriber(None)
        .try_init()
        .context("installing tracing subscriber")
}
