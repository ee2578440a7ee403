use std::{io, path::PathBuf, process::Stdio};

use async_trait::async_trait;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader},
    process::Command,
};

use crate::{
    error::ExtractorError,
    model::{ExtractorOptions, Phase, PostProcessor, ProgressEvent},
    progress::{parse_progress_line, progress_template},
};

/// Receives progress events in the order the extractor emits them.
pub type ProgressCallback<'a> = &'a (dyn Fn(ProgressEvent) + Send + Sync);

/// The media extraction tool, seen as a single blocking download call.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Name of the tool (for logging)
    fn name(&self) -> &str;

    /// Downloads `url` with `options`, reporting progress until the tool exits.
    async fn download(
        &self,
        url: &str,
        options: &ExtractorOptions,
        on_progress: ProgressCallback<'_>,
    ) -> Result<(), ExtractorError>;
}

/// yt-dlp driven through its command line.
pub struct YtDlp {
    program: String,
    ffmpeg_location: Option<PathBuf>,
}

impl YtDlp {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), ffmpeg_location: None }
    }

    /// Tell yt-dlp where ffmpeg lives instead of letting it search PATH.
    pub fn with_ffmpeg_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.ffmpeg_location = Some(location.into());
        self
    }

    pub fn build_args(&self, url: &str, options: &ExtractorOptions) -> Vec<String> {
        let mut args = vec![
            "-o".to_owned(),
            options.output_template.clone(),
            "-f".to_owned(),
            options.format.clone(),
            "--newline".to_owned(),
            "--progress-template".to_owned(),
            progress_template(),
        ];

        if options.quiet {
            // --progress keeps our template lines alive under --quiet
            args.extend(["--quiet".to_owned(), "--progress".to_owned()]);
        }
        if options.no_color {
            args.extend(["--color".to_owned(), "no_color".to_owned()]);
        }
        if options.ignore_errors {
            args.push("--ignore-errors".to_owned());
        }
        if let Some(container) = &options.merge_output_format {
            args.extend(["--merge-output-format".to_owned(), container.clone()]);
        }
        for pp in &options.postprocessors {
            match pp {
                PostProcessor::ExtractAudio { codec, quality } => {
                    args.extend([
                        "--extract-audio".to_owned(),
                        "--audio-format".to_owned(),
                        codec.clone(),
                        "--audio-quality".to_owned(),
                        format!("{quality}K"),
                    ]);
                }
            }
        }
        if let Some(cookies) = &options.cookie_file {
            args.extend(["--cookies".to_owned(), cookies.to_string_lossy().into_owned()]);
        }
        if let Some(ffmpeg) = &self.ffmpeg_location {
            args.extend(["--ffmpeg-location".to_owned(), ffmpeg.to_string_lossy().into_owned()]);
        }

        args.push("--".to_owned());
        args.push(url.to_owned());
        args
    }
}

#[async_trait]
impl Extractor for YtDlp {
    fn name(&self) -> &str {
        &self.program
    }

    async fn download(
        &self,
        url: &str,
        options: &ExtractorOptions,
        on_progress: ProgressCallback<'_>,
    ) -> Result<(), ExtractorError> {
        let args = self.build_args(url, options);
        tracing::debug!(program = %self.program, ?args, "spawning extractor");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExtractorError::Launch { program: self.program.clone(), source })?;

        let out = child.stdout.take().ok_or_else(|| io::Error::other("extractor stdout not captured"))?;
        let err = child.stderr.take().ok_or_else(|| io::Error::other("extractor stderr not captured"))?;
        let errors = tokio::spawn(collect_errors(err));

        let finished = pump_progress(BufReader::new(out), on_progress).await?;
        let status = child.wait().await?;
        let errors = match errors.await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "reading extractor stderr failed");
                String::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "stderr reader task failed");
                String::new()
            }
        };

        // --ignore-errors exits non-zero when any playlist item failed
        if status.success() || finished > 0 {
            if !errors.is_empty() {
                tracing::warn!(%status, finished, %errors, "extractor skipped items");
            }
            return Ok(());
        }

        let message = if errors.is_empty() { format!("{} exited with {status}", self.program) } else { errors };
        Err(ExtractorError::Download { message })
    }
}

/// Feeds every progress line from `reader` to `on_progress` and returns how many items finished.
pub async fn pump_progress<R>(mut reader: R, on_progress: ProgressCallback<'_>) -> io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut finished = 0;
    while let Some(line) = next_line_lossy(&mut reader, &mut buf).await? {
        match parse_progress_line(&line) {
            Some(event) => {
                if event.phase == Phase::Finished {
                    finished += 1;
                }
                on_progress(event);
            }
            None => tracing::trace!(%line, "extractor output"),
        }
    }
    Ok(finished)
}

/// Gathers the `ERROR:` lines yt-dlp prints. Falls back to the last stderr lines when there are none.
pub async fn collect_errors<R>(reader: R) -> io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut errors = Vec::new();
    let mut tail = Vec::new();
    while let Some(line) = next_line_lossy(&mut reader, &mut buf).await? {
        tracing::debug!(%line, "extractor stderr");
        if let Some(msg) = line.strip_prefix("ERROR:") {
            errors.push(msg.trim().to_owned());
        } else if !line.trim().is_empty() {
            tail.push(line);
            if tail.len() > 5 {
                tail.remove(0);
            }
        }
    }
    Ok(if errors.is_empty() { tail.join("\n") } else { errors.join("\n") })
}

/// Next line without its terminator; bytes that aren't UTF-8 (console code pages) become U+FFFD.
async fn next_line_lossy<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_owned()))
}
