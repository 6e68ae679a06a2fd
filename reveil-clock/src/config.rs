//! Daemon configuration.
//!
//! Loaded from an optional `config.json`; missing fields fall back to
//! defaults so a partial file (or none at all) always yields a
//! runnable configuration. The settings API writes the file back
//! through [`ClockConfig::save`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Use mock hardware variants instead of the real clock, player,
    /// and display.
    pub mock_hardware: bool,
    pub listen_addr: String,
    /// Directory holding `alarms.json` and `overrides.json`.
    pub data_dir: PathBuf,
    pub sounds_dir: PathBuf,
    pub snooze_minutes: u16,
    /// Evaluation loop tick interval.
    pub check_interval_secs: u64,
    /// An alarm ringing longer than this is auto-dismissed.
    pub ring_timeout_minutes: u16,
    /// Display brightness, 0--15.
    pub display_brightness: u8,
    /// Playback volume, 0--100.
    pub volume: u8,
    pub default_sound: String,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            mock_hardware: true,
            listen_addr: "0.0.0.0:5000".into(),
            data_dir: "data".into(),
            sounds_dir: "sounds".into(),
            snooze_minutes: 9,
            check_interval_secs: 30,
            ring_timeout_minutes: 5,
            display_brightness: 10,
            volume: 80,
            default_sound: "default.mp3".into(),
        }
    }
}

impl ClockConfig {
    /// Read the config file, or fall back to defaults when it does
    /// not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Write the config file atomically (temp file + rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn check_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.check_interval_secs)
    }

    pub fn ring_timeout(&self) -> time::Duration {
        time::Duration::minutes(i64::from(self.ring_timeout_minutes))
    }
}
