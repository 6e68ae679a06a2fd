//! Occurrence resolution.
//!
//! Pure lookups that merge an alarm's weekly recurrence with any
//! per-date override. Nothing here mutates state or touches the
//! wall clock; callers supply `now`.
//!
//! Overrides never add occurrences: they only retime, re-sound, or
//! skip a date the recurrence already produces. A date whose weekday
//! is outside the alarm's `days` yields no occurrence even if an
//! override targets it.

use serde::Serialize;
use time::{Date, Duration, PrimitiveDateTime, Time};
use utoipa::ToSchema;

use crate::store::{Alarm, AlarmStore};
use crate::types::{truncate_to_minute, AlarmId, DayTag, OverrideId};

/// Bounds the forward scan so a store with no enabled alarms
/// terminates.
const MAX_LOOKAHEAD_DAYS: i64 = 365;

/// The resolved view of one alarm on one date.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveOccurrence {
    /// Effective fire time (override wins over recurrence).
    pub time: Time,
    /// The recurrence-defined time before any override.
    pub original_time: Time,
    /// Effective sound (override wins over recurrence).
    pub sound: String,
    pub label: String,
    /// The occurrence is suppressed for this date.
    pub skip: bool,
    pub override_id: Option<OverrideId>,
}

/// The next upcoming occurrence across all alarms, annotated for
/// status reporting.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NextOccurrence {
    pub alarm_id: AlarmId,
    #[serde(with = "crate::types::ymd")]
    #[schema(value_type = String, example = "2026-03-02")]
    pub date: Date,
    pub day: DayTag,
    #[serde(with = "crate::types::hhmm")]
    #[schema(value_type = String, example = "07:00")]
    pub time: Time,
    #[serde(with = "crate::types::hhmm")]
    #[schema(value_type = String, example = "07:00")]
    pub original_time: Time,
    pub sound: String,
    pub label: String,
    /// Whole minutes from `now` to the fire time, floored.
    pub minutes_until: i64,
    pub has_override: bool,
    pub override_id: Option<OverrideId>,
}

/// Resolve one alarm on one date.
///
/// Returns `None` when the alarm is disabled or its recurrence
/// excludes the date's weekday. The returned occurrence may still
/// carry `skip = true`; callers decide whether to discard it.
pub fn occurrence_on(store: &AlarmStore, alarm: &Alarm, date: Date) -> Option<EffectiveOccurrence> {
    if !alarm.enabled || !alarm.days.contains(&DayTag::from(date.weekday())) {
        return None;
    }

    let overridden = store.override_for(&alarm.id, date);
    Some(EffectiveOccurrence {
        time: overridden
            .and_then(|o| o.override_time)
            .unwrap_or(alarm.time),
        original_time: alarm.time,
        sound: overridden
            .and_then(|o| o.override_sound.clone())
            .unwrap_or_else(|| alarm.sound.clone()),
        label: alarm.label.clone(),
        skip: overridden.is_some_and(|o| o.skip),
        override_id: overridden.map(|o| o.id.clone()),
    })
}

/// Find the earliest effective occurrence at or after `now`.
///
/// Scans forward one date at a time. Today's candidates that have
/// already passed are dropped; a candidate at exactly `now` (to the
/// minute) is kept, which is what lets the evaluation loop fire on
/// the due minute itself. Ties on the fire time break by ascending
/// alarm id so repeated calls are deterministic.
pub fn next_occurrence(store: &AlarmStore, now: PrimitiveDateTime) -> Option<NextOccurrence> {
    let now = truncate_to_minute(now);

    for offset in 0..=MAX_LOOKAHEAD_DAYS {
        let date = now.date().checked_add(Duration::days(offset))?;
        let mut best: Option<(PrimitiveDateTime, NextOccurrence)> = None;

        for alarm in store.alarms() {
            let Some(occurrence) = occurrence_on(store, alarm, date) else {
                continue;
            };
            if occurrence.skip {
                continue;
            }

            let when = PrimitiveDateTime::new(date, occurrence.time);
            if when < now {
                continue;
            }

            let better = match &best {
                None => true,
                Some((best_when, best_occ)) => {
                    when < *best_when || (when == *best_when && alarm.id < best_occ.alarm_id)
                }
            };
            if better {
                best = Some((
                    when,
                    NextOccurrence {
                        alarm_id: alarm.id.clone(),
                        date,
                        day: DayTag::from(date.weekday()),
                        time: occurrence.time,
                        original_time: occurrence.original_time,
                        sound: occurrence.sound,
                        label: occurrence.label,
                        minutes_until: (when - now).whole_minutes(),
                        has_override: occurrence.override_id.is_some(),
                        override_id: occurrence.override_id,
                    },
                ));
            }
        }

        if let Some((_, winner)) = best {
            return Some(winner);
        }
    }

    None
}
