//! Real hardware variants.
//!
//! "Real" is relative to a headless Linux box: the clock reads the
//! system time (kept right by the battery-backed RTC at the OS
//! level), the player shells out to `mpg123`, and the display writes
//! to the log where a panel driver would sit on the device itself.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use parking_lot::Mutex;
use time::{OffsetDateTime, PrimitiveDateTime};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use super::{Clock, Display, Player};
use crate::error::{Error, Result};

const SOUND_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac"];

/// System wall clock in the local timezone.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> PrimitiveDateTime {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        PrimitiveDateTime::new(now.date(), now.time())
    }
}

/// Plays sounds by spawning an `mpg123` child process.
pub struct ProcessPlayer {
    sounds_dir: PathBuf,
    child: Mutex<Option<Child>>,
}

impl ProcessPlayer {
    pub fn new(sounds_dir: impl Into<PathBuf>) -> Self {
        Self {
            sounds_dir: sounds_dir.into(),
            child: Mutex::new(None),
        }
    }

    fn spawn(&self, sound: &str, looped: bool) -> Result<()> {
        let path = self.sounds_dir.join(sound);
        if !path.is_file() {
            return Err(Error::Collaborator(format!(
                "sound file not found: {}",
                path.display()
            )));
        }

        let mut cmd = Command::new("mpg123");
        cmd.arg("-q");
        if looped {
            cmd.args(["--loop", "-1"]);
        }
        cmd.arg(&path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| Error::Collaborator(format!("failed to spawn mpg123: {e}")))?;

        self.kill_current();
        *self.child.lock() = Some(child);
        info!(sound, looped, "Started playback");
        Ok(())
    }

    fn kill_current(&self) {
        if let Some(mut child) = self.child.lock().take()
            && let Err(err) = child.start_kill()
        {
            warn!(%err, "Failed to kill playback process");
        }
    }
}

#[async_trait]
impl Player for ProcessPlayer {
    async fn start(&self, sound: &str) -> Result<()> {
        self.spawn(sound, true)
    }

    async fn preview(&self, sound: &str) -> Result<()> {
        self.spawn(sound, false)
    }

    async fn stop(&self) -> Result<()> {
        self.kill_current();
        Ok(())
    }

    /// Sets the system mixer via `amixer`, which is what actually
    /// controls loudness on the target box.
    async fn set_volume(&self, volume: u8) -> Result<()> {
        let volume = volume.min(100);
        let output = Command::new("amixer")
            .args(["sset", "Master", &format!("{volume}%")])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::Collaborator(format!("failed to run amixer: {e}")))?;

        if !output.status.success() {
            return Err(Error::Collaborator(format!(
                "amixer exited with {}",
                output.status
            )));
        }
        info!(volume, "Volume set");
        Ok(())
    }

    fn available_sounds(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.sounds_dir) else {
            return Vec::new();
        };
        let mut sounds: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| SOUND_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            })
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        sounds.sort();
        sounds
    }
}

/// Stand-in for the physical panel: renders to the log.
pub struct ConsoleDisplay;

impl Display for ConsoleDisplay {
    fn set_alarm_indicator(&self, on: bool) {
        info!(on, "Alarm indicator");
    }

    fn set_brightness(&self, level: u8) {
        info!(level, "Display brightness");
    }

    fn show_time(&self, now: PrimitiveDateTime) {
        debug!(
            "Display time {:02}:{:02}",
            now.time().hour(),
            now.time().minute()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_only_sound_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mp3", "a.wav", "notes.txt", "c.FLAC"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let player = ProcessPlayer::new(dir.path());
        assert_eq!(player.available_sounds(), vec!["a.wav", "b.mp3", "c.FLAC"]);
    }

    #[test]
    fn empty_when_sounds_dir_missing() {
        let player = ProcessPlayer::new("/nonexistent/sounds");
        assert!(player.available_sounds().is_empty());
    }

    #[tokio::test]
    async fn starting_a_missing_sound_is_a_collaborator_error() {
        let dir = tempfile::tempdir().unwrap();
        let player = ProcessPlayer::new(dir.path());
        let err = player.start("nope.mp3").await.unwrap_err();
        assert!(matches!(err, Error::Collaborator(_)));
    }
}
