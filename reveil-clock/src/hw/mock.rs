//! Mock hardware variants.
//!
//! Used by the daemon's mock-hardware mode (development off the
//! device) and by tests, which inspect the recorded calls.

use async_trait::async_trait;
use parking_lot::Mutex;
use time::macros::datetime;
use time::PrimitiveDateTime;

use super::{Clock, Display, Player};
use crate::error::{Error, Result};

/// Settable clock.
pub struct MockClock {
    now: Mutex<PrimitiveDateTime>,
}

impl MockClock {
    pub fn starting_at(now: PrimitiveDateTime) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: PrimitiveDateTime) {
        *self.now.lock() = now;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::starting_at(datetime!(2026-03-02 06:00))
    }
}

impl Clock for MockClock {
    fn now(&self) -> PrimitiveDateTime {
        *self.now.lock()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    Started(String),
    Previewed(String),
    Stopped,
    VolumeSet(u8),
}

/// Records playback calls instead of making noise.
#[derive(Default)]
pub struct MockPlayer {
    pub events: Mutex<Vec<PlayerEvent>>,
    pub sounds: Vec<String>,
    pub fail_calls: Mutex<bool>,
}

impl MockPlayer {
    pub fn with_sounds(sounds: &[&str]) -> Self {
        Self {
            sounds: sounds.iter().map(|s| (*s).to_owned()).collect(),
            ..Self::default()
        }
    }

    fn record(&self, event: PlayerEvent) -> Result<()> {
        if *self.fail_calls.lock() {
            return Err(Error::Collaborator("mock player failure".into()));
        }
        self.events.lock().push(event);
        Ok(())
    }
}

#[async_trait]
impl Player for MockPlayer {
    async fn start(&self, sound: &str) -> Result<()> {
        self.record(PlayerEvent::Started(sound.to_owned()))
    }

    async fn preview(&self, sound: &str) -> Result<()> {
        self.record(PlayerEvent::Previewed(sound.to_owned()))
    }

    async fn stop(&self) -> Result<()> {
        self.record(PlayerEvent::Stopped)
    }

    async fn set_volume(&self, volume: u8) -> Result<()> {
        self.record(PlayerEvent::VolumeSet(volume))
    }

    fn available_sounds(&self) -> Vec<String> {
        self.sounds.clone()
    }
}

/// Records the indicator and brightness it was last given.
#[derive(Default)]
pub struct MockDisplay {
    pub indicator: Mutex<bool>,
    pub brightness: Mutex<u8>,
}

impl Display for MockDisplay {
    fn set_alarm_indicator(&self, on: bool) {
        *self.indicator.lock() = on;
    }

    fn set_brightness(&self, level: u8) {
        *self.brightness.lock() = level;
    }

    fn show_time(&self, _now: PrimitiveDateTime) {}
}
