use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings file name, looked up in the working directory.
pub const SETTINGS_FILE: &str = "grabber.toml";

/// User-tunable settings loaded from `grabber.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root for `audio/` and `video/`, relative to the working directory unless absolute.
    pub downloads_dir: PathBuf,
    /// Cookie jar forwarded to the extractor when it exists.
    pub cookie_file: PathBuf,
    /// Extraction tool, a name on PATH or a path.
    pub extractor: String,
    /// Transcoding tool, a name on PATH or a path.
    pub transcoder: String,
    /// Player used when the OS cannot open a video itself.
    pub media_player: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            downloads_dir: PathBuf::from("downloads"),
            cookie_file: PathBuf::from("cookies.txt"),
            extractor: "yt-dlp".to_string(),
            transcoder: "ffmpeg".to_string(),
            media_player: "vlc".to_string(),
        }
    }
}

impl Settings {
    /// Resolves relative paths against `base`.
    pub fn resolved(mut self, base: &Path) -> Self {
        if self.downloads_dir.is_relative() {
            self.downloads_dir = base.join(&self.downloads_dir);
        }
        if self.cookie_file.is_relative() {
            self.cookie_file = base.join(&self.cookie_file);
        }
        self
    }
}

/// Load settings from `path`, writing a default file if none exists.
pub fn load_or_init(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        let defaults = Settings::default();
        let toml = toml::to_string_pretty(&defaults)?;
        fs::write(path, toml).map_err(|source| ConfigError::Write { path: path.to_path_buf(), source })?;
        tracing::info!("created default settings at {}", path.display());
        return Ok(defaults);
    }

    let data =
        fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    toml::from_str(&data).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}
