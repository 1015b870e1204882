//! File-backed tracing setup.
//!
//! The terminal belongs to the UI while mktui runs, so log records go to
//! `<data-local-dir>/mktui/mktui.log` instead of stderr.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over `default_level`.
///
/// Returns the log file path on success.
pub fn init(default_level: &str) -> Result<PathBuf> {
    let path = log_path()?;
    init_at(&path, default_level)?;
    Ok(path)
}

/// Install the global subscriber writing to `path`.
pub fn init_at(path: &Path, default_level: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level).unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file)),
        )
        .with(filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

fn log_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "mktui")
        .context("Could not determine data directory")?;
    Ok(dirs.data_local_dir().join("mktui.log"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_at_creates_log_file() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let path = temp_dir.path().join("nested").join("mktui.log");

        init_at(&path, "debug").expect("init logging");
        tracing::info!("hello from the test");

        assert!(path.exists());
        // The global subscriber can only be installed once.
        assert!(init_at(&path, "debug").is_err());
    }
}
