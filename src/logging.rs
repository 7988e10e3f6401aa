//! Tracing setup
//!
//! The filter comes from `RUST_LOG` (default `info`). The terminal UI owns
//! stdout and stderr while running, so interactive sessions log to
//! `skycast.log` in the platform data directory instead.

use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use directories::ProjectDirs;
use tracing_subscriber::EnvFilter;

use crate::cli::OutputMode;

const LOG_FILE: &str = "skycast.log";

/// Location of the interactive log file
pub fn log_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "skycast").map(|dirs| dirs.data_dir().join(LOG_FILE))
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn open_log_file() -> Option<File> {
    let path = log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}

/// Installs the global subscriber for the given output mode
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(output: OutputMode) {
    match output {
        OutputMode::Json => {
            let _ = tracing_subscriber::fmt()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_env_filter(env_filter("warn"))
                .try_init();
        }
        OutputMode::Interactive => match open_log_file() {
            Some(file) => {
                let _ = tracing_subscriber::fmt()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_env_filter(env_filter("info"))
                    .try_init();
                tracing::info!("skycast {} starting", env!("CARGO_PKG_VERSION"));
            }
            None => {
                // Nowhere safe to write while the alternate screen is up
                let _ = tracing_subscriber::fmt()
                    .with_writer(std::io::sink)
                    .with_env_filter(EnvFilter::new("off"))
                    .try_init();
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_file_name() {
        if let Some(path) = log_path() {
            assert!(path.ends_with(LOG_FILE));
        }
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init(OutputMode::Json);
        init(OutputMode::Json);
    }
}
