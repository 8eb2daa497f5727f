//! Tracing subscriber bootstrap for the CLI.
//!
//! `RUST_LOG` wins over the level chosen on the command line. Logs go to
//! stderr unless a log file is given, which keeps the interactive screen
//! clean during long reviews.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default level: `warn`, or `debug` when `verbose`.
pub fn level_for(verbose: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else {
        Level::WARN
    }
}

/// Install the global subscriber. Only the first call in a process takes
/// effect; later calls return `Ok(())`.
pub fn init_logging(level: Level, json: bool, log_file: Option<&Path>) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            install(filter, json, false, Mutex::new(file));
        }
        None => install(filter, json, true, std::io::stderr),
    }
    Ok(())
}

fn install<W>(filter: EnvFilter, json: bool, ansi: bool, writer: W)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_target(false)
        .with_ansi(ansi)
        .with_writer(writer);
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_selects_debug() {
        assert_eq!(level_for(true), Level::DEBUG);
        assert_eq!(level_for(false), Level::WARN);
    }

    #[test]
    fn unwritable_log_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("reso.log");
        assert!(init_logging(Level::INFO, false, Some(&path)).is_err());
    }
}
