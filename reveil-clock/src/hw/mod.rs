//! Hardware capability traits.
//!
//! The engine and monitor depend only on these interfaces; which
//! variant is active (real or mock) is decided once at daemon
//! startup. Player and display calls are best-effort: a failure is
//! reported as [`Error::Collaborator`](crate::error::Error) and
//! logged by the caller, never propagated into a state transition.

mod mock;
mod system;

pub use mock::{MockClock, MockDisplay, MockPlayer, PlayerEvent};
pub use system::{ConsoleDisplay, ProcessPlayer, SystemClock};

use async_trait::async_trait;
use time::PrimitiveDateTime;

use crate::error::Result;

/// Local wall-clock source. Minute accuracy is all the engine needs.
pub trait Clock: Send + Sync {
    fn now(&self) -> PrimitiveDateTime;
}

/// Audio playback for alarm sounds.
#[async_trait]
pub trait Player: Send + Sync {
    /// Start looping playback of a sound. Replaces anything already
    /// playing.
    async fn start(&self, sound: &str) -> Result<()>;

    /// Play a sound once, for previewing from the API.
    async fn preview(&self, sound: &str) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    /// Set the playback volume, 0--100.
    async fn set_volume(&self, volume: u8) -> Result<()>;

    /// Names of the sound assets on this device. Used by the API
    /// layer to validate sound references.
    fn available_sounds(&self) -> Vec<String>;
}

/// The bedside display. Narrow on purpose: the engine only pushes
/// the time and the alarm indicator.
pub trait Display: Send + Sync {
    fn set_alarm_indicator(&self, on: bool);
    fn set_brightness(&self, level: u8);
    fn show_time(&self, now: PrimitiveDateTime);
}
