//! Turns the user's selections into a [`JobDescription`].

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{
    error::ValidationError,
    model::{ExtractorOptions, JobDescription, JobId, Mode, PostProcessor, Quality},
};

pub const AUDIO_FORMAT: &str = "bestaudio/best";
pub const AUDIO_CODEC: &str = "mp3";
/// kbps
pub const AUDIO_QUALITY: &str = "192";
pub const MERGE_CONTAINER: &str = "mp4";

pub struct RequestBuilder {
    downloads_root: PathBuf,
    cookie_file: PathBuf,
    next_id: AtomicU64,
}

impl RequestBuilder {
    pub fn new(downloads_root: impl Into<PathBuf>, cookie_file: impl Into<PathBuf>) -> Self {
        Self { downloads_root: downloads_root.into(), cookie_file: cookie_file.into(), next_id: AtomicU64::new(1) }
    }

    pub fn downloads_root(&self) -> &Path {
        &self.downloads_root
    }

    pub fn output_dir(&self, mode: Mode) -> PathBuf {
        self.downloads_root.join(mode.folder_name())
    }

    /// Builds the job for one download click.
    ///
    /// `quality` is a dropdown label; unknown labels select `Best`. It is ignored in audio mode.
    /// Failing to create the output folders is logged, not returned.
    pub fn build_job(&self, url: &str, mode: Mode, quality: &str) -> Result<JobDescription, ValidationError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ValidationError::EmptyUrl);
        }

        if let Err(e) = ensure_output_dirs(&self.downloads_root) {
            tracing::warn!(root = %self.downloads_root.display(), error = %e, "could not create output folders");
        }

        let quality = Quality::from_label(quality);
        let output_dir = self.output_dir(mode);
        let output_template = output_dir.join("%(title)s.%(ext)s").to_string_lossy().into_owned();

        let cookie_file = self.cookie_file.is_file().then(|| self.cookie_file.clone());
        if let Some(path) = &cookie_file {
            tracing::debug!(cookies = %path.display(), "attaching cookie file");
        }

        let (format, merge_output_format, postprocessors) = match mode {
            Mode::Audio => (
                AUDIO_FORMAT.to_string(),
                None,
                vec![PostProcessor::ExtractAudio {
                    codec: AUDIO_CODEC.to_string(),
                    quality: AUDIO_QUALITY.to_string(),
                }],
            ),
            Mode::Video => (quality.format_selector(), Some(MERGE_CONTAINER.to_string()), Vec::new()),
        };

        let id = JobId(self.next_id.fetch_add(1, Ordering::Relaxed));
        Ok(JobDescription {
            id,
            url: url.to_string(),
            mode,
            quality,
            output_dir,
            options: ExtractorOptions {
                output_template,
                format,
                quiet: true,
                ignore_errors: true,
                no_color: true,
                merge_output_format,
                postprocessors,
                cookie_file,
            },
        })
    }
}

/// Creates `<root>/audio` and `<root>/video`. Safe to call repeatedly.
pub fn ensure_output_dirs(root: &Path) -> io::Result<()> {
    for mode in [Mode::Audio, Mode::Video] {
        fs::create_dir_all(root.join(mode.folder_name()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(dir: &Path) -> RequestBuilder {
        RequestBuilder::new(dir.join("downloads"), dir.join("cookies.txt"))
    }

    #[test]
    fn empty_or_blank_url_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let b = builder(dir.path());
        for url in ["", "   ", "\t\n"] {
            for mode in [Mode::Audio, Mode::Video] {
                assert_eq!(b.build_job(url, mode, "Best").unwrap_err(), ValidationError::EmptyUrl);
            }
        }
        // nothing is created for rejected input
        assert!(!dir.path().join("downloads").exists());
    }

    #[test]
    fn video_1080p_job() {
        let dir = tempfile::tempdir().unwrap();
        let job = builder(dir.path()).build_job("https://example/video", Mode::Video, "1080p").unwrap();
        assert_eq!(job.options.format, "bestvideo[height=1080]+bestaudio/best");
        assert!(job.output_dir.ends_with("downloads/video"));
        assert_eq!(job.options.merge_output_format.as_deref(), Some("mp4"));
        assert!(job.options.postprocessors.is_empty());
        assert!(job.options.output_template.ends_with("%(title)s.%(ext)s"));
        assert!(job.options.ignore_errors);
        assert!(job.options.quiet);
    }

    #[test]
    fn video_selectors_follow_ladder_and_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let b = builder(dir.path());
        for q in Quality::ALL {
            let job = b.build_job("https://example/v", Mode::Video, q.label()).unwrap();
            assert_eq!(job.options.format, q.format_selector());
        }
        let job = b.build_job("https://example/v", Mode::Video, "8K please").unwrap();
        assert_eq!(job.options.format, "bestvideo+bestaudio/best");
        assert_eq!(job.quality, Quality::Best);
    }

    #[test]
    fn audio_job_ignores_quality() {
        let dir = tempfile::tempdir().unwrap();
        let b = builder(dir.path());
        for label in ["Best", "360p", "2160p", "nonsense"] {
            let job = b.build_job("https://example/song", Mode::Audio, label).unwrap();
            assert_eq!(job.options.format, "bestaudio/best");
            assert_eq!(
                job.options.postprocessors,
                vec![PostProcessor::ExtractAudio { codec: "mp3".into(), quality: "192".into() }]
            );
            assert!(job.output_dir.ends_with("downloads/audio"));
        }
    }

    #[test]
    fn building_creates_both_output_folders() {
        let dir = tempfile::tempdir().unwrap();
        builder(dir.path()).build_job("https://example/a", Mode::Audio, "Best").unwrap();
        assert!(dir.path().join("downloads/audio").is_dir());
        assert!(dir.path().join("downloads/video").is_dir());
    }

    #[test]
    fn ensure_output_dirs_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("downloads");
        ensure_output_dirs(&root).unwrap();
        ensure_output_dirs(&root).unwrap();
        assert!(root.join("audio").is_dir());
        assert!(root.join("video").is_dir());
    }

    #[test]
    fn cookie_file_attached_only_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let b = builder(dir.path());
        let job = b.build_job("https://example/a", Mode::Video, "720p").unwrap();
        assert!(job.options.cookie_file.is_none());

        fs::write(dir.path().join("cookies.txt"), "# Netscape HTTP Cookie File\n").unwrap();
        let job = b.build_job("https://example/a", Mode::Video, "720p").unwrap();
        assert_eq!(job.options.cookie_file, Some(dir.path().join("cookies.txt")));
    }

    #[test]
    fn url_is_trimmed_and_ids_increase() {
        let dir = tempfile::tempdir().unwrap();
        let b = builder(dir.path());
        let first = b.build_job("  https://example/a \n", Mode::Audio, "Best").unwrap();
        let second = b.build_job("https://example/b", Mode::Audio, "Best").unwrap();
        assert_eq!(first.url, "https://example/a");
        assert!(second.id > first.id);
    }
}
