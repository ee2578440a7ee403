use std::{fmt, path::PathBuf};

/// What the user wants out of a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Best audio, transcoded to MP3
    #[default]
    Audio,
    /// Video and audio merged into MP4
    Video,
}

impl Mode {
    /// Name of the output subfolder for this mode
    pub fn folder_name(self) -> &'static str {
        match self {
            Mode::Audio => "audio",
            Mode::Video => "video",
        }
    }
}

/// Target resolution ladder offered in the quality dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    #[default]
    Best,
    P2160,
    P1440,
    P1080,
    P720,
    P480,
    P360,
}

impl Quality {
    pub const ALL: [Quality; 7] = [
        Quality::Best,
        Quality::P2160,
        Quality::P1440,
        Quality::P1080,
        Quality::P720,
        Quality::P480,
        Quality::P360,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Quality::Best => "Best",
            Quality::P2160 => "2160p",
            Quality::P1440 => "1440p",
            Quality::P1080 => "1080p",
            Quality::P720 => "720p",
            Quality::P480 => "480p",
            Quality::P360 => "360p",
        }
    }

    /// Looks up a dropdown label. Anything unknown means `Best`.
    pub fn from_label(label: &str) -> Quality {
        Quality::ALL
            .into_iter()
            .find(|q| q.label() == label.trim())
            .unwrap_or_default()
    }

    /// Format selector handed to the extractor for video downloads
    pub fn format_selector(self) -> String {
        match self.height() {
            Some(h) => format!("bestvideo[height={h}]+bestaudio/best"),
            None => "bestvideo+bestaudio/best".to_string(),
        }
    }

    fn height(self) -> Option<u32> {
        match self {
            Quality::Best => None,
            Quality::P2160 => Some(2160),
            Quality::P1440 => Some(1440),
            Quality::P1080 => Some(1080),
            Quality::P720 => Some(720),
            Quality::P480 => Some(480),
            Quality::P360 => Some(360),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Process-unique number of a download attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Post-processing step requested from the extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcessor {
    /// Drop the video stream and transcode audio to `codec` at `quality` kbps
    ExtractAudio { codec: String, quality: String },
}

/// Every option the extractor understands, as one explicit record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorOptions {
    /// Output path template, e.g. `downloads/video/%(title)s.%(ext)s`
    pub output_template: String,
    /// Stream selection expression
    pub format: String,
    /// Suppress everything but our progress lines
    pub quiet: bool,
    /// Keep going past per-item failures (playlists)
    pub ignore_errors: bool,
    /// Disable ANSI colours in tool output
    pub no_color: bool,
    /// Container for merged video+audio
    pub merge_output_format: Option<String>,
    pub postprocessors: Vec<PostProcessor>,
    /// Netscape cookie jar passed through untouched
    pub cookie_file: Option<PathBuf>,
}

/// Immutable description of one download attempt
#[derive(Debug, Clone)]
pub struct JobDescription {
    pub id: JobId,
    pub url: String,
    pub mode: Mode,
    pub quality: Quality,
    /// Folder the media lands in
    pub output_dir: PathBuf,
    pub options: ExtractorOptions,
}

/// Stage a progress report refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Bytes are still being transferred
    Downloading,
    /// Transfer done, post-processing under way
    Finished,
}

/// One progress report from the extractor
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub phase: Phase,
    /// 0 to 100; unparsable input is reported as 0
    pub percent: f32,
    /// Transfer rate for display, e.g. `1.20MiB/s`
    pub speed: String,
    /// Remaining time for display, e.g. `00:42`
    pub eta: String,
}

/// Failure categories that get a targeted message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// HTTP 403; the site most likely wants cookies
    AccessDenied,
    /// The transcoder could not be used
    MissingTranscoder,
    Other,
}

/// Terminal result of a job
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Success { output_dir: PathBuf },
    KnownFailure { category: FailureCategory, message: String },
    UnknownFailure { message: String },
}
