//! API data transfer objects.
//!
//! Alarm and override records serialize directly from the store
//! types; the shapes here are the request/response bodies that have
//! no storage counterpart.

use serde::{Deserialize, Serialize};
use time::{Date, Time};
use utoipa::{IntoParams, ToSchema};

use crate::engine::NextOccurrence;
use crate::types::{AlarmId, DayTag};

/// Body for creating (or upserting) an override.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OverrideCreate {
    pub alarm_id: AlarmId,
    #[serde(with = "crate::types::ymd")]
    #[schema(value_type = String, example = "2026-03-02")]
    pub target_date: Date,
    #[serde(default, with = "crate::types::hhmm::option")]
    #[schema(value_type = Option<String>, example = "08:00")]
    pub override_time: Option<Time>,
    #[serde(default)]
    pub override_sound: Option<String>,
    #[serde(default)]
    pub skip: Option<bool>,
}

/// Filter for listing overrides.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct OverrideFilter {
    /// Restrict to overrides of one alarm.
    pub alarm_id: Option<AlarmId>,
}

/// Current system status snapshot.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    /// Local wall-clock time, `HH:MM:SS`.
    pub time: String,
    #[serde(with = "crate::types::ymd")]
    #[schema(value_type = String, example = "2026-03-02")]
    pub date: Date,
    pub day: DayTag,
    pub alarm_ringing: bool,
    pub next_alarm: Option<NextOccurrence>,
}

/// Adjustable runtime settings.
#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsResponse {
    pub snooze_minutes: u16,
    pub display_brightness: u8,
    /// Playback volume, 0--100.
    pub volume: u8,
    pub default_sound: String,
}

/// Partial settings update. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SettingsPatch {
    pub snooze_minutes: Option<u16>,
    pub display_brightness: Option<u8>,
    pub volume: Option<u8>,
    pub default_sound: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
