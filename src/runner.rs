//! Runs one job off the rendering thread and reports back through the event queue.

use std::sync::Arc;

use tokio::{runtime::Handle, sync::mpsc::UnboundedSender, task::JoinHandle};

use crate::{
    bridge::{UiEvent, UiEventKind},
    downloader::Extractor,
    error::{ExtractorError, PreconditionFailure},
    model::{FailureCategory, JobDescription, JobOutcome, ProgressEvent},
    tools,
};

pub struct JobRunner {
    extractor: Arc<dyn Extractor>,
    extractor_program: String,
    transcoder: String,
    events: UnboundedSender<UiEvent>,
}

impl JobRunner {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        extractor_program: impl Into<String>,
        transcoder: impl Into<String>,
        events: UnboundedSender<UiEvent>,
    ) -> Self {
        Self {
            extractor,
            extractor_program: extractor_program.into(),
            transcoder: transcoder.into(),
            events,
        }
    }

    /// Both tools must be resolvable before anything touches the network.
    pub fn check_preconditions(&self) -> Result<(), PreconditionFailure> {
        if tools::locate(&self.transcoder).is_none() {
            return Err(PreconditionFailure::MissingTranscoder { tool: self.transcoder.clone() });
        }
        if tools::locate(&self.extractor_program).is_none() {
            return Err(PreconditionFailure::MissingExtractor { tool: self.extractor_program.clone() });
        }
        Ok(())
    }

    /// Spawns the job on `runtime`. Rejected jobs never spawn anything.
    pub fn launch(&self, job: JobDescription, runtime: &Handle) -> Result<JoinHandle<()>, PreconditionFailure> {
        if let Err(e) = self.check_preconditions() {
            tracing::warn!(job = %job.id, error = %e, "job rejected before launch");
            return Err(e);
        }

        tracing::info!(
            job = %job.id,
            extractor = self.extractor.name(),
            url = %job.url,
            mode = ?job.mode,
            quality = %job.quality,
            "launching job"
        );
        let extractor = Arc::clone(&self.extractor);
        let events = self.events.clone();
        Ok(runtime.spawn(async move {
            let outcome = execute(extractor.as_ref(), &job, &events).await;
            let _ = events.send(UiEvent { job: job.id, kind: UiEventKind::Finished(outcome) });
        }))
    }
}

/// Runs the extractor once and classifies how it ended.
pub async fn execute(extractor: &dyn Extractor, job: &JobDescription, events: &UnboundedSender<UiEvent>) -> JobOutcome {
    let id = job.id;
    let forward = move |event: ProgressEvent| {
        let _ = events.send(UiEvent { job: id, kind: UiEventKind::Progress(event) });
    };

    let result = extractor.download(&job.url, &job.options, &forward).await;
    let outcome = classify(result, job);
    match &outcome {
        JobOutcome::Success { output_dir } => {
            tracing::info!(job = %id, dir = %output_dir.display(), "job finished")
        }
        JobOutcome::KnownFailure { category, message } => {
            tracing::warn!(job = %id, ?category, %message, "job failed")
        }
        JobOutcome::UnknownFailure { .. } => {}
    }
    outcome
}

/// Maps the extractor's result to a [`JobOutcome`].
pub fn classify(result: Result<(), ExtractorError>, job: &JobDescription) -> JobOutcome {
    match result {
        Ok(()) => JobOutcome::Success { output_dir: job.output_dir.clone() },
        Err(ExtractorError::Download { message }) => {
            JobOutcome::KnownFailure { category: classify_message(&message), message }
        }
        Err(other) => {
            tracing::error!(job = %job.id, error = ?other, "unexpected download error");
            JobOutcome::UnknownFailure { message: other.to_string() }
        }
    }
}

/// yt-dlp only gives us free text, so the category comes from substrings.
pub fn classify_message(message: &str) -> FailureCategory {
    if message.contains("403") {
        FailureCategory::AccessDenied
    } else if message.to_lowercase().contains("ffmpeg") {
        FailureCategory::MissingTranscoder
    } else {
        FailureCategory::Other
    }
}

#[cfg(test)]
mod tests {
    use std::{io, path::Path};

    use async_trait::async_trait;
    use tokio::sync::mpsc::unbounded_channel;

    use super::*;
    use crate::{
        downloader::ProgressCallback,
        model::{ExtractorOptions, Mode, Phase},
        request::RequestBuilder,
    };

    enum Ending {
        Ok,
        Download(&'static str),
        Launch,
    }

    struct ScriptedExtractor {
        events: Vec<ProgressEvent>,
        ending: Ending,
    }

    #[async_trait]
    impl Extractor for ScriptedExtractor {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn download(
            &self,
            _url: &str,
            _options: &ExtractorOptions,
            on_progress: ProgressCallback<'_>,
        ) -> Result<(), ExtractorError> {
            for ev in &self.events {
                on_progress(ev.clone());
            }
            match self.ending {
                Ending::Ok => Ok(()),
                Ending::Download(msg) => Err(ExtractorError::Download { message: msg.to_string() }),
                Ending::Launch => Err(ExtractorError::Launch {
                    program: "yt-dlp".into(),
                    source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
                }),
            }
        }
    }

    fn job(dir: &Path) -> JobDescription {
        RequestBuilder::new(dir.join("downloads"), dir.join("cookies.txt"))
            .build_job("https://example/video", Mode::Video, "1080p")
            .unwrap()
    }

    fn progress(percent: f32) -> ProgressEvent {
        ProgressEvent { phase: Phase::Downloading, percent, speed: "1MiB/s".into(), eta: "00:01".into() }
    }

    async fn run_with(ending: Ending) -> JobOutcome {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path());
        let (tx, _rx) = unbounded_channel();
        let extractor = ScriptedExtractor { events: Vec::new(), ending };
        execute(&extractor, &job, &tx).await
    }

    #[tokio::test]
    async fn success_reports_output_dir() {
        let outcome = run_with(Ending::Ok).await;
        match outcome {
            JobOutcome::Success { output_dir } => assert!(output_dir.ends_with("downloads/video")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn forbidden_is_access_denied() {
        let outcome = run_with(Ending::Download("[youtube] abc: HTTP Error 403: Forbidden")).await;
        assert!(matches!(outcome, JobOutcome::KnownFailure { category: FailureCategory::AccessDenied, .. }));
    }

    #[tokio::test]
    async fn transcoder_mention_is_missing_transcoder() {
        let outcome = run_with(Ending::Download("Postprocessing: FFmpeg not found. Please install")).await;
        assert!(matches!(outcome, JobOutcome::KnownFailure { category: FailureCategory::MissingTranscoder, .. }));
    }

    #[tokio::test]
    async fn other_download_errors_keep_their_text() {
        let outcome = run_with(Ending::Download("Unsupported URL: https://example/video")).await;
        assert_eq!(
            outcome,
            JobOutcome::KnownFailure {
                category: FailureCategory::Other,
                message: "Unsupported URL: https://example/video".into()
            }
        );
    }

    #[tokio::test]
    async fn non_download_errors_are_unknown() {
        let outcome = run_with(Ending::Launch).await;
        match outcome {
            JobOutcome::UnknownFailure { message } => assert!(message.contains("yt-dlp")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn forbidden_wins_over_ffmpeg() {
        assert_eq!(classify_message("ffmpeg: HTTP error 403"), FailureCategory::AccessDenied);
        assert_eq!(classify_message("FFMPEG exploded"), FailureCategory::MissingTranscoder);
        assert_eq!(classify_message("video unavailable"), FailureCategory::Other);
    }

    #[tokio::test]
    async fn progress_is_forwarded_in_order_and_tagged() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path());
        let (tx, mut rx) = unbounded_channel();
        let extractor = ScriptedExtractor { events: vec![progress(5.0), progress(60.0)], ending: Ending::Ok };
        execute(&extractor, &job, &tx).await;
        drop(tx);

        let mut percents = Vec::new();
        while let Some(ev) = rx.recv().await {
            assert_eq!(ev.job, job.id);
            if let UiEventKind::Progress(p) = ev.kind {
                percents.push(p.percent);
            }
        }
        assert_eq!(percents, vec![5.0, 60.0]);
    }

    #[tokio::test]
    async fn launch_sends_terminal_event() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path());
        let (tx, mut rx) = unbounded_channel();
        let exe = std::env::current_exe().unwrap().to_string_lossy().into_owned();
        let extractor = Arc::new(ScriptedExtractor { events: vec![progress(50.0)], ending: Ending::Ok });
        let runner = JobRunner::new(extractor, exe.clone(), exe, tx);

        runner.launch(job.clone(), &Handle::current()).unwrap().await.unwrap();

        let first = rx.recv().await.unwrap();
        assert!(matches!(first.kind, UiEventKind::Progress(_)));
        let last = rx.recv().await.unwrap();
        assert_eq!(last.job, job.id);
        assert!(matches!(last.kind, UiEventKind::Finished(JobOutcome::Success { .. })));
    }

    #[tokio::test]
    async fn missing_transcoder_rejects_before_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path());
        let (tx, mut rx) = unbounded_channel();
        let extractor = Arc::new(ScriptedExtractor { events: vec![progress(1.0)], ending: Ending::Ok });
        let runner = JobRunner::new(extractor, "yt-dlp", "tube-grabber-no-such-ffmpeg-77aa", tx);

        let err = runner.launch(job, &Handle::current()).unwrap_err();
        assert!(matches!(err, PreconditionFailure::MissingTranscoder { .. }));
        drop(runner);
        assert!(rx.recv().await.is_none());
    }
}
