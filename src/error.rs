//! Error types for each stage of a download attempt.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Rejected user input; no job is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a video URL.")]
    EmptyUrl,
}

/// A required external tool is missing; no worker is spawned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionFailure {
    #[error("{tool} not found! Please install it and add its folder to your system PATH.")]
    MissingTranscoder { tool: String },
    #[error("{tool} not found! Please install it and add its folder to your system PATH.")]
    MissingExtractor { tool: String },
}

/// Failure reported while running the extraction tool.
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// The tool ran and reported an error of its own.
    #[error("{message}")]
    Download { message: String },
    /// The tool could not be started at all.
    #[error("failed to start {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("I/O error while talking to the extractor: {0}")]
    Io(#[from] io::Error),
}

/// Failure to hand a path to the OS or to a media player.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("could not open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{player} not found. Please install it or set `media_player` in grabber.toml.")]
    PlayerMissing { player: String },
}

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("No text found in clipboard.")]
    NoText,
    #[error("clipboard unavailable: {0}")]
    Unavailable(#[from] arboard::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write settings file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid settings file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}
