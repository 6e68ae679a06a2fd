//! Error types shared across the clock engine.

use crate::types::{AlarmId, OverrideId};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("alarm {0} not found")]
    AlarmNotFound(AlarmId),

    #[error("override {0} not found")]
    OverrideNotFound(OverrideId),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A write to durable storage failed. The in-memory state is
    /// rolled back so it never diverges from what is on disk.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// A hardware collaborator (player, display, clock) call failed.
    /// Never fatal; transitions proceed as if the side effect
    /// succeeded.
    #[error("collaborator unavailable: {0}")]
    Collaborator(String),

    #[error("no alarm is currently ringing")]
    NotRinging,
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Persistence(err.to_string())
    }
}
