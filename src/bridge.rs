//! Interface state and the events that drive it.
//!
//! Workers only ever send [`UiEvent`]s; [`UiState`] is owned and mutated by the rendering thread.

use std::path::{Path, PathBuf};

use crate::model::{FailureCategory, JobId, JobOutcome, Phase, ProgressEvent};

/// Message from a worker to the rendering thread.
#[derive(Debug, Clone, PartialEq)]
pub struct UiEvent {
    pub job: JobId,
    pub kind: UiEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiEventKind {
    Progress(ProgressEvent),
    Finished(JobOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgePhase {
    Ready,
    Downloading(JobId),
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Something the user has to acknowledge in a dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, title: title.into(), body: body.into() }
    }

    pub fn warning(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, title: title.into(), body: body.into() }
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, title: title.into(), body: body.into() }
    }

    /// Dialog text for a failed job.
    pub fn for_failure(outcome: &JobOutcome, cookie_file: &Path) -> Option<Notice> {
        let cookie_name = cookie_file.file_name().map(|n| n.to_string_lossy().into_owned());
        let cookie_name = cookie_name.unwrap_or_else(|| "cookies.txt".to_string());
        match outcome {
            JobOutcome::Success { .. } => None,
            JobOutcome::KnownFailure { category: FailureCategory::AccessDenied, .. } => Some(Notice::error(
                "403 Forbidden",
                format!(
                    "🚫 The site blocked this download.\nTry adding a '{cookie_name}' file for authentication."
                ),
            )),
            JobOutcome::KnownFailure { category: FailureCategory::MissingTranscoder, .. } => Some(Notice::error(
                "FFmpeg Error",
                "⚠️ FFmpeg not found. Please install it and add it to PATH.",
            )),
            JobOutcome::KnownFailure { category: FailureCategory::Other, message } => {
                Some(Notice::error("Download Error", format!("❌ yt-dlp failed:\n{message}")))
            }
            JobOutcome::UnknownFailure { message } => {
                Some(Notice::error("Error", format!("❌ Download failed:\n{message}")))
            }
        }
    }
}

/// Returned when a download is started while another one runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Busy(pub JobId);

/// Everything the window shows about downloads.
#[derive(Debug, Clone)]
pub struct UiState {
    pub status: String,
    /// 0 to 100
    pub progress: f32,
    pub open_folder_enabled: bool,
    pub play_enabled: bool,
    phase: BridgePhase,
    last_success: Option<PathBuf>,
    cookie_file: PathBuf,
}

impl UiState {
    pub fn new(cookie_file: impl Into<PathBuf>) -> Self {
        Self {
            status: "Ready.".to_string(),
            progress: 0.0,
            open_folder_enabled: false,
            play_enabled: false,
            phase: BridgePhase::Ready,
            last_success: None,
            cookie_file: cookie_file.into(),
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> BridgePhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, BridgePhase::Downloading(_))
    }

    #[cfg(test)]
    pub fn last_success(&self) -> Option<&Path> {
        self.last_success.as_deref()
    }

    /// Moves a finished job's state back to `Ready`. Call on every user action.
    pub fn settle(&mut self) {
        if matches!(self.phase, BridgePhase::Succeeded | BridgePhase::Failed) {
            self.phase = BridgePhase::Ready;
            let enabled = self.last_success.is_some();
            self.open_folder_enabled = enabled;
            self.play_enabled = enabled;
        }
    }

    /// Ready → Downloading. Only one job may be in flight.
    pub fn begin(&mut self, job: JobId) -> Result<(), Busy> {
        self.settle();
        if let BridgePhase::Downloading(current) = self.phase {
            return Err(Busy(current));
        }
        self.phase = BridgePhase::Downloading(job);
        self.progress = 0.0;
        self.status = "⏳ Starting download...".to_string();
        Ok(())
    }

    /// Applies one worker event. Returns a dialog to show when the job failed.
    pub fn apply(&mut self, event: UiEvent) -> Option<Notice> {
        if self.phase != BridgePhase::Downloading(event.job) {
            tracing::debug!(job = %event.job, phase = ?self.phase, "dropping stale event");
            return None;
        }

        match event.kind {
            UiEventKind::Progress(p) => {
                self.apply_progress(&p);
                None
            }
            UiEventKind::Finished(outcome) => self.finish(outcome),
        }
    }

    fn apply_progress(&mut self, p: &ProgressEvent) {
        match p.phase {
            Phase::Downloading => {
                self.progress = p.percent;
                self.status = format!("⬇️ {:.1}% | {} | ETA: {}", p.percent, p.speed, p.eta);
            }
            Phase::Finished => {
                self.progress = 100.0;
                self.status = "✅ Download complete! Finalizing...".to_string();
            }
        }
    }

    fn finish(&mut self, outcome: JobOutcome) -> Option<Notice> {
        let notice = Notice::for_failure(&outcome, &self.cookie_file);
        match outcome {
            JobOutcome::Success { output_dir } => {
                self.phase = BridgePhase::Succeeded;
                self.progress = 100.0;
                self.status = format!("✅ Done! Saved to: {}", output_dir.display());
                self.open_folder_enabled = true;
                self.play_enabled = true;
                self.last_success = Some(output_dir);
            }
            _ => {
                self.phase = BridgePhase::Failed;
                self.status = "❌ Download failed.".to_string();
                self.open_folder_enabled = false;
                self.play_enabled = false;
            }
        }
        notice
    }

    /// Plain status line for auxiliary actions.
    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = text.into();
    }
}
