//! Buttons that don't start a download: paste, open folder, play.

use std::{
    fs, io,
    path::{Path, PathBuf},
    process::Command,
    time::SystemTime,
};

use crate::{
    error::{ClipboardError, LaunchError},
    tools,
};

/// Extensions "play latest video" considers.
pub const VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "mkv", "webm"];

/// Hands paths to the operating system or a media player.
pub trait Launcher {
    /// Open a file or folder with the OS default handler.
    fn open(&self, target: &Path) -> io::Result<()>;
    /// Start `player` with `target`.
    fn play_with(&self, player: &str, target: &Path) -> io::Result<()>;
}

pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn open(&self, target: &Path) -> io::Result<()> {
        let opener = if cfg!(target_os = "windows") {
            "explorer"
        } else if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        };
        Command::new(opener).arg(target).spawn().map(|_| ())
    }

    fn play_with(&self, player: &str, target: &Path) -> io::Result<()> {
        Command::new(player).arg(target).spawn().map(|_| ())
    }
}

/// Result of the play button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Opened with the OS default player
    Opened(PathBuf),
    /// Opened with the configured media player
    OpenedWithPlayer(PathBuf),
    /// Nothing to play; informational only
    NothingToPlay(String),
}

/// Opens the downloads root in the file manager.
pub fn open_folder(launcher: &dyn Launcher, root: &Path) -> Result<(), LaunchError> {
    tracing::info!(dir = %root.display(), "opening download folder");
    launcher.open(root).map_err(|source| LaunchError::Open { path: root.to_path_buf(), source })
}

/// Newest video in `dir` by creation time (modification time where creation time isn't recorded).
pub fn latest_video(dir: &Path) -> io::Result<Option<PathBuf>> {
    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(error = %e, dir = %dir.display(), "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        if !is_video(&path) {
            continue;
        }
        let stamp = match file_stamp(&entry) {
            Ok(Some(stamp)) => stamp,
            Ok(None) => continue,
            Err(e) => {
                tracing::debug!(error = %e, file = %path.display(), "skipping unreadable file");
                continue;
            }
        };
        if newest.as_ref().is_none_or(|(best, _)| stamp > *best) {
            newest = Some((stamp, path));
        }
    }
    Ok(newest.map(|(_, path)| path))
}

/// Creation time of a regular file, `None` for anything else.
fn file_stamp(entry: &fs::DirEntry) -> io::Result<Option<SystemTime>> {
    let meta = entry.metadata()?;
    if !meta.is_file() {
        return Ok(None);
    }
    meta.created().or_else(|_| meta.modified()).map(Some)
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| VIDEO_EXTENSIONS.iter().any(|v| v.eq_ignore_ascii_case(e)))
}

/// Plays the newest file in `video_dir`: OS default first, then `player`.
pub fn play_latest(launcher: &dyn Launcher, video_dir: &Path, player: &str) -> Result<PlayOutcome, LaunchError> {
    if !video_dir.is_dir() {
        return Ok(PlayOutcome::NothingToPlay("No video folder found yet.".to_string()));
    }
    let latest = match latest_video(video_dir) {
        Ok(Some(path)) => path,
        Ok(None) => {
            return Ok(PlayOutcome::NothingToPlay(format!("No video files found in {}.", video_dir.display())));
        }
        Err(source) => return Err(LaunchError::Open { path: video_dir.to_path_buf(), source }),
    };

    match launcher.open(&latest) {
        Ok(()) => {
            tracing::info!(file = %latest.display(), "playing with default handler");
            Ok(PlayOutcome::Opened(latest))
        }
        Err(e) => {
            tracing::warn!(error = %e, player, "default handler failed, trying media player");
            if tools::locate(player).is_none() {
                return Err(LaunchError::PlayerMissing { player: player.to_string() });
            }
            launcher
                .play_with(player, &latest)
                .map_err(|source| LaunchError::Open { path: latest.clone(), source })?;
            Ok(PlayOutcome::OpenedWithPlayer(latest))
        }
    }
}

/// Reads text from the system clipboard.
pub fn clipboard_text() -> Result<String, ClipboardError> {
    let mut clipboard = arboard::Clipboard::new()?;
    match clipboard.get_text() {
        Ok(text) => accept_clipboard_text(text),
        Err(arboard::Error::ContentNotAvailable) => Err(ClipboardError::NoText),
        Err(e) => Err(e.into()),
    }
}

fn accept_clipboard_text(text: String) -> Result<String, ClipboardError> {
    let trimmed = text.trim();
    if trimmed.is_empty() { Err(ClipboardError::NoText) } else { Ok(trimmed.to_string()) }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, thread, time::Duration};

    use super::*;

    #[derive(Default)]
    struct RecordingLauncher {
        fail_open: bool,
        opened: RefCell<Vec<PathBuf>>,
        played: RefCell<Vec<(String, PathBuf)>>,
    }

    impl Launcher for RecordingLauncher {
        fn open(&self, target: &Path) -> io::Result<()> {
            if self.fail_open {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no opener"));
            }
            self.opened.borrow_mut().push(target.to_path_buf());
            Ok(())
        }

        fn play_with(&self, player: &str, target: &Path) -> io::Result<()> {
            self.played.borrow_mut().push((player.to_string(), target.to_path_buf()));
            Ok(())
        }
    }

    #[test]
    fn missing_folder_is_informational_and_launches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = RecordingLauncher::default();
        let outcome = play_latest(&launcher, &dir.path().join("downloads/video"), "vlc").unwrap();
        assert!(matches!(outcome, PlayOutcome::NothingToPlay(_)));
        assert!(launcher.opened.borrow().is_empty());
        assert!(launcher.played.borrow().is_empty());
    }

    #[test]
    fn empty_folder_is_informational_and_launches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::write(dir.path().join("song.mp3"), "x").unwrap();
        let launcher = RecordingLauncher::default();
        let outcome = play_latest(&launcher, dir.path(), "vlc").unwrap();
        assert!(matches!(outcome, PlayOutcome::NothingToPlay(_)));
        assert!(launcher.opened.borrow().is_empty());
    }

    #[test]
    fn newest_video_is_opened() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("old.mp4"), "x").unwrap();
        thread::sleep(Duration::from_millis(30));
        fs::write(dir.path().join("new.WEBM"), "x").unwrap();
        thread::sleep(Duration::from_millis(30));
        fs::write(dir.path().join("newest.txt"), "x").unwrap();

        let launcher = RecordingLauncher::default();
        let outcome = play_latest(&launcher, dir.path(), "vlc").unwrap();
        assert_eq!(outcome, PlayOutcome::Opened(dir.path().join("new.WEBM")));
        assert_eq!(*launcher.opened.borrow(), vec![dir.path().join("new.WEBM")]);
    }

    #[test]
    fn falls_back_to_player_when_default_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("clip.mkv"), "x").unwrap();
        let player = std::env::current_exe().unwrap().to_string_lossy().into_owned();
        let launcher = RecordingLauncher { fail_open: true, ..Default::default() };
        let outcome = play_latest(&launcher, dir.path(), &player).unwrap();
        assert_eq!(outcome, PlayOutcome::OpenedWithPlayer(dir.path().join("clip.mkv")));
        assert_eq!(launcher.played.borrow()[0].0, player);
    }

    #[test]
    fn missing_player_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("clip.mp4"), "x").unwrap();
        let launcher = RecordingLauncher { fail_open: true, ..Default::default() };
        let err = play_latest(&launcher, dir.path(), "tube-grabber-no-such-player-0c3d").unwrap_err();
        assert!(matches!(err, LaunchError::PlayerMissing { .. }));
        assert!(launcher.played.borrow().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_entries_are_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("clip.mp4"), "x").unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.mkv"), dir.path().join("broken.mkv")).unwrap();
        fs::create_dir(dir.path().join("folder.webm")).unwrap();

        assert_eq!(latest_video(dir.path()).unwrap(), Some(dir.path().join("clip.mp4")));

        // Listable but not searchable: every stat fails unless running as root
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o444)).unwrap();
        let listed = latest_video(dir.path());
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o755)).unwrap();
        assert!(listed.is_ok(), "{listed:?}");
    }

    #[test]
    fn open_folder_passes_root() {
        let launcher = RecordingLauncher::default();
        open_folder(&launcher, Path::new("/work/downloads")).unwrap();
        assert_eq!(*launcher.opened.borrow(), vec![PathBuf::from("/work/downloads")]);
    }

    #[test]
    fn clipboard_text_must_not_be_blank() {
        assert!(matches!(accept_clipboard_text("  \n".into()), Err(ClipboardError::NoText)));
        assert_eq!(accept_clipboard_text(" https://example/v \n".into()).unwrap(), "https://example/v");
    }
}
