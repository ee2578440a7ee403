//! Main application for the media downloader GUI

// Auxiliary buttons: paste, open folder, play
mod actions;
// Interface state driven by worker events
mod bridge;
// Settings file
mod config;
// External downloader spawning logic (yt-dlp)
mod downloader;
// Error types
mod error;
// Log file setup
mod logging;
// Data models for jobs, progress and outcomes
mod model;
// Progress parsing utilities
mod progress;
// UI selections -> job description
mod request;
// Background job execution
mod runner;
// PATH lookups for external tools
mod tools;

use std::{sync::Arc, time::Duration};

use actions::{PlayOutcome, SystemLauncher};
use anyhow::Context;
use bridge::{Notice, NoticeLevel, UiEvent, UiState};
use config::Settings;
use downloader::YtDlp;
use error::{LaunchError, PreconditionFailure};
use model::{Mode, Quality};
use request::RequestBuilder;
use runner::JobRunner;

// eframe/egui for GUI application framework
use eframe::{App, Frame, egui};
use egui::Visuals;
// OnceCell for single-time runtime initialization
use once_cell::sync::OnceCell;
use rfd::{MessageButtons, MessageDialog, MessageLevel};
use tokio::{
    runtime::{Handle, Runtime},
    sync::mpsc::{UnboundedReceiver, unbounded_channel},
};

// Global Tokio runtime stored in a OnceCell for lazy init
static RUNTIME: OnceCell<Arc<Runtime>> = OnceCell::new();

/// Program entry point: logging, settings, runtime, then the window
fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    if let Err(e) = logging::init_logging(&cwd) {
        eprintln!("logging disabled: {e:#}");
    }

    let settings = config::load_or_init(&cwd.join(config::SETTINGS_FILE))
        .context("loading settings")?
        .resolved(&cwd);
    tracing::info!(?settings, "settings loaded");

    let rt = RUNTIME
        .get_or_try_init(|| Runtime::new().map(Arc::new))
        .context("starting async runtime")?;
    let app = GrabberApp::new(settings, rt.handle().clone());

    // Fixed-size window, like the classic single-form downloader
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([620.0, 480.0])
            .with_resizable(false),
        ..Default::default()
    };
    eframe::run_native(
        "Media Downloader",
        options,
        Box::new(move |cc| {
            // Use dark theme visuals
            cc.egui_ctx.set_visuals(Visuals::dark());
            Box::new(app)
        }),
    )
    .map_err(|e| anyhow::anyhow!("window closed with an error: {e}"))
}

/// Application state for the GUI
struct GrabberApp {
    /// Input field for the media URL
    url_input: String,
    /// Audio or video
    mode: Mode,
    /// Selected quality, only used in video mode
    quality: Quality,
    /// Status, progress and button state
    ui: UiState,
    builder: RequestBuilder,
    runner: JobRunner,
    /// Worker events, drained every frame
    events_rx: UnboundedReceiver<UiEvent>,
    runtime: Handle,
    launcher: SystemLauncher,
    media_player: String,
}

impl GrabberApp {
    fn new(settings: Settings, runtime: Handle) -> Self {
        let (tx, rx) = unbounded_channel();

        let mut ytdlp = YtDlp::new(settings.extractor.clone());
        if tools::is_explicit_path(&settings.transcoder) {
            ytdlp = ytdlp.with_ffmpeg_location(&settings.transcoder);
        }
        let runner = JobRunner::new(Arc::new(ytdlp), settings.extractor.clone(), settings.transcoder.clone(), tx);

        Self {
            url_input: String::new(),
            mode: Mode::default(),
            quality: Quality::default(),
            ui: UiState::new(settings.cookie_file.clone()),
            builder: RequestBuilder::new(settings.downloads_dir, settings.cookie_file),
            runner,
            events_rx: rx,
            runtime,
            launcher: SystemLauncher,
            media_player: settings.media_player,
        }
    }

    /// Download button: validate, check tools, spawn the worker
    fn start_download(&mut self) {
        self.ui.settle();
        if self.ui.is_busy() {
            show_notice(&Notice::warning("Busy", "A download is already running."));
            return;
        }

        let job = match self.builder.build_job(&self.url_input, self.mode, self.quality.label()) {
            Ok(job) => job,
            Err(e) => {
                show_notice(&Notice::error("Error", e.to_string()));
                return;
            }
        };
        let id = job.id;

        if let Err(e) = self.runner.launch(job, &self.runtime) {
            let title = match e {
                PreconditionFailure::MissingTranscoder { .. } => "FFmpeg Missing",
                PreconditionFailure::MissingExtractor { .. } => "yt-dlp Missing",
            };
            show_notice(&Notice::warning(title, format!("⚠️ {e}")));
            return;
        }

        if let Err(busy) = self.ui.begin(id) {
            tracing::warn!(job = %id, running = %busy.0, "job started while another was in flight");
        }
    }

    fn paste_url(&mut self) {
        self.ui.settle();
        match actions::clipboard_text() {
            Ok(text) => {
                self.url_input = text;
                self.ui.set_status("📋 URL pasted from clipboard!");
            }
            Err(e) => {
                tracing::warn!(error = %e, "clipboard paste failed");
                show_notice(&Notice::warning("Clipboard Empty", format!("⚠️ {e}")));
            }
        }
    }

    fn open_folder(&mut self) {
        self.ui.settle();
        if let Err(e) = actions::open_folder(&self.launcher, self.builder.downloads_root()) {
            tracing::warn!(error = %e, "open folder failed");
            show_notice(&Notice::warning("Open Folder", e.to_string()));
        }
    }

    fn play_latest(&mut self) {
        self.ui.settle();
        let video_dir = self.builder.output_dir(Mode::Video);
        match actions::play_latest(&self.launcher, &video_dir, &self.media_player) {
            Ok(PlayOutcome::Opened(path)) => {
                self.ui.set_status(format!("▶️ Playing: {}", file_name(&path)));
            }
            Ok(PlayOutcome::OpenedWithPlayer(path)) => {
                self.ui.set_status(format!("▶️ Playing with {}: {}", self.media_player, file_name(&path)));
            }
            Ok(PlayOutcome::NothingToPlay(msg)) => show_notice(&Notice::info("Play", msg)),
            Err(e @ LaunchError::PlayerMissing { .. }) => {
                show_notice(&Notice::warning("Player Missing", format!("⚠️ {e}")))
            }
            Err(e) => {
                tracing::warn!(error = %e, "play failed");
                show_notice(&Notice::warning("Play", e.to_string()));
            }
        }
    }
}

/// GUI update loop: called each frame to redraw and handle interactions
impl App for GrabberApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        // 1️⃣ Drain worker events; all UI mutation happens here on the render thread
        while let Ok(event) = self.events_rx.try_recv() {
            if let Some(notice) = self.ui.apply(event) {
                show_notice(&notice);
            }
        }

        // 2️⃣ Single form: URL, mode, quality, progress, buttons
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("🎧 Media Downloader");
            });
            ui.add_space(10.0);

            // URL input + paste button
            ui.label("Enter video URL:");
            ui.horizontal(|ui| {
                ui.add(egui::TextEdit::singleline(&mut self.url_input).desired_width(480.0));
                if ui.button("📋 Paste").clicked() {
                    self.paste_url();
                }
            });

            // Mode selection
            ui.horizontal(|ui| {
                ui.label("Download Mode:");
                ui.radio_value(&mut self.mode, Mode::Audio, "Audio (MP3)");
                ui.radio_value(&mut self.mode, Mode::Video, "Video (MP4)");
            });

            // Quality dropdown, only meaningful for video
            ui.add_enabled_ui(self.mode == Mode::Video, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Select Quality:");
                    egui::ComboBox::from_id_source("quality")
                        .selected_text(self.quality.label())
                        .show_ui(ui, |ui| {
                            for q in Quality::ALL {
                                ui.selectable_value(&mut self.quality, q, q.label());
                            }
                        });
                });
            });

            ui.add_space(20.0);
            ui.add(egui::ProgressBar::new(self.ui.progress / 100.0).show_percentage());
            ui.label(&self.ui.status);
            ui.add_space(10.0);

            // Download / open folder / play
            ui.horizontal(|ui| {
                if ui.add_enabled(!self.ui.is_busy(), egui::Button::new("⬇️ Download")).clicked() {
                    self.start_download();
                }
                if ui.add_enabled(self.ui.open_folder_enabled, egui::Button::new("📂 Open Folder")).clicked() {
                    self.open_folder();
                }
                if ui.add_enabled(self.ui.play_enabled, egui::Button::new("▶️ Play Latest")).clicked() {
                    self.play_latest();
                }
            });
        });

        // Request periodic repaint for progress updates
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

/// Modal dialog; blocks the render thread until dismissed
fn show_notice(notice: &Notice) {
    let level = match notice.level {
        NoticeLevel::Info => MessageLevel::Info,
        NoticeLevel::Warning => MessageLevel::Warning,
        NoticeLevel::Error => MessageLevel::Error,
    };
    MessageDialog::new()
        .set_level(level)
        .set_title(&notice.title)
        .set_description(&notice.body)
        .set_buttons(MessageButtons::Ok)
        .show();
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
