use std::{fs, path::Path};

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt::writer::BoxMakeWriter};

/// Log file name, created in the working directory.
pub const LOG_FILE: &str = "grabber.log";

/// Initialize structured logging to `<dir>/grabber.log`, or stderr if the file can't be opened.
pub fn init_logging(dir: &Path) -> Result<()> {
    let log_path = dir.join(LOG_FILE);
    let file = fs::OpenOptions::new().create(true).append(true).open(&log_path);

    let (writer, target) = match file {
        Ok(file) => (BoxMakeWriter::new(std::sync::Mutex::new(file)), log_path.display().to_string()),
        Err(_) => (BoxMakeWriter::new(std::io::stderr), "stderr".to_string()),
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tube_grabber=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;

    tracing::info!("logging initialized at {target}");
    Ok(())
}
