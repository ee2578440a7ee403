use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{Phase, ProgressEvent};

/// Marker yt-dlp puts in front of every progress line we ask it for.
pub const PROGRESS_PREFIX: &str = "grabber-progress|";

/// Value for `--progress-template`; fields are split on `|` by [`parse_progress_line`].
pub fn progress_template() -> String {
    format!(
        "download:{PROGRESS_PREFIX}%(progress.status)s|%(progress._percent_str)s|%(progress._speed_str)s|%(progress._eta_str)s"
    )
}

static ANSI_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("static ANSI pattern"));

fn strip_ansi(s: &str) -> String {
    ANSI_ESCAPE.replace_all(s, "").trim().to_string()
}

/// Parses a percent string like ` 42.3%`. Anything unreadable is 0.
pub fn parse_percent(raw: &str) -> f32 {
    let cleaned = strip_ansi(raw);
    match cleaned.trim_end_matches('%').trim().parse::<f32>() {
        Ok(v) if v.is_finite() => v.clamp(0.0, 100.0),
        _ => 0.0,
    }
}

/// Turns one stdout line into a progress event, if it is one of ours.
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let rest = line.trim().strip_prefix(PROGRESS_PREFIX)?;
    let mut fields = rest.split('|');
    let phase = match fields.next()?.trim() {
        "downloading" => Phase::Downloading,
        "finished" => Phase::Finished,
        _ => return None,
    };
    let percent = parse_percent(fields.next().unwrap_or(""));
    let speed = strip_ansi(fields.next().unwrap_or(""));
    let eta = strip_ansi(fields.next().unwrap_or(""));
    Some(ProgressEvent { phase, percent, speed, eta })
}
