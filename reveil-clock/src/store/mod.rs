//! Alarm and override storage.
//!
//! [`AlarmStore`] owns the two persisted collections and enforces
//! their invariants:
//!
//! - every override references an existing alarm, and deleting an
//!   alarm cascades to its overrides;
//! - at most one override exists per (alarm, target date) pair;
//! - a mutation is committed in memory only after the full set has
//!   been durably persisted, so a crash right after a successful call
//!   never loses the change.

mod persist;

pub use persist::{JsonFiles, Persistence};

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use time::{Date, Time};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::{AlarmId, DayTag, OverrideId};

/// A recurring alarm definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Alarm {
    pub id: AlarmId,
    /// Wall-clock time of day, minute precision.
    #[serde(with = "crate::types::hhmm")]
    #[schema(value_type = String, example = "07:00")]
    pub time: Time,
    /// Weekdays the recurrence applies to. Non-empty.
    pub days: BTreeSet<DayTag>,
    pub sound: String,
    #[serde(default)]
    pub label: String,
    pub enabled: bool,
}

/// A single-date exception to a recurring alarm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Override {
    pub id: OverrideId,
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
    pub skip: bool,
}

/// Fields for creating an alarm.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct NewAlarm {
    #[serde(with = "crate::types::hhmm")]
    #[schema(value_type = String, example = "07:00")]
    pub time: Time,
    pub days: BTreeSet<DayTag>,
    #[serde(default = "default_sound")]
    pub sound: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_sound() -> String {
    "default.mp3".into()
}

fn default_enabled() -> bool {
    true
}

/// Partial update for an alarm. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct AlarmPatch {
    #[serde(default, with = "crate::types::hhmm::option")]
    #[schema(value_type = Option<String>, example = "08:30")]
    pub time: Option<Time>,
    pub days: Option<BTreeSet<DayTag>>,
    pub sound: Option<String>,
    pub label: Option<String>,
    pub enabled: Option<bool>,
}

/// Partial update for an override. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct OverridePatch {
    #[serde(default, with = "crate::types::hhmm::option")]
    #[schema(value_type = Option<String>, example = "08:00")]
    pub override_time: Option<Time>,
    pub override_sound: Option<String>,
    pub skip: Option<bool>,
}

/// In-memory collection of alarms and overrides, backed by durable
/// storage.
pub struct AlarmStore {
    alarms: BTreeMap<AlarmId, Alarm>,
    overrides: BTreeMap<OverrideId, Override>,
    persistence: Box<dyn Persistence>,
}

impl AlarmStore {
    /// Load the persisted state into a new store.
    ///
    /// The two files are written one after the other, so a crash can
    /// leave an override whose alarm no longer exists; such orphans
    /// are dropped here (and gone from disk on the next save).
    pub fn open(persistence: Box<dyn Persistence>) -> Result<Self> {
        let (alarms, overrides) = persistence.load()?;
        let alarms: BTreeMap<AlarmId, Alarm> =
            alarms.into_iter().map(|a| (a.id.clone(), a)).collect();
        let mut overrides: BTreeMap<OverrideId, Override> =
            overrides.into_iter().map(|o| (o.id.clone(), o)).collect();

        let before = overrides.len();
        overrides.retain(|_, o| alarms.contains_key(&o.alarm_id));
        let orphaned = before - overrides.len();
        if orphaned > 0 {
            warn!(orphaned, "Dropped overrides referencing missing alarms");
        }

        Ok(Self {
            alarms,
            overrides,
            persistence,
        })
    }

    fn persist(&self) -> Result<()> {
        let alarms: Vec<Alarm> = self.alarms.values().cloned().collect();
        let overrides: Vec<Override> = self.overrides.values().cloned().collect();
        self.persistence.save(&alarms, &overrides)
    }

    pub fn add(&mut self, new: NewAlarm) -> Result<Alarm> {
        if new.days.is_empty() {
            return Err(Error::InvalidInput("days must not be empty".into()));
        }

        let alarm = Alarm {
            id: AlarmId::generate(),
            time: new.time,
            days: new.days,
            sound: new.sound,
            label: new.label,
            enabled: new.enabled,
        };

        self.alarms.insert(alarm.id.clone(), alarm.clone());
        if let Err(err) = self.persist() {
            self.alarms.remove(&alarm.id);
            return Err(err);
        }

        info!(alarm_id = %alarm.id, time = %alarm.time, "Created alarm");
        Ok(alarm)
    }

    pub fn update(&mut self, id: &AlarmId, patch: AlarmPatch) -> Result<Alarm> {
        if patch.days.as_ref().is_some_and(BTreeSet::is_empty) {
            return Err(Error::InvalidInput("days must not be empty".into()));
        }

        let previous = self
            .alarms
            .get(id)
            .cloned()
            .ok_or_else(|| Error::AlarmNotFound(id.clone()))?;

        let alarm = self.alarms.get_mut(id).ok_or_else(|| Error::AlarmNotFound(id.clone()))?;
        if let Some(time) = patch.time {
            alarm.time = time;
        }
        if let Some(days) = patch.days {
            alarm.days = days;
        }
        if let Some(sound) = patch.sound {
            alarm.sound = sound;
        }
        if let Some(label) = patch.label {
            alarm.label = label;
        }
        if let Some(enabled) = patch.enabled {
            alarm.enabled = enabled;
        }
        let updated = alarm.clone();

        if let Err(err) = self.persist() {
            self.alarms.insert(id.clone(), previous);
            return Err(err);
        }

        info!(alarm_id = %id, "Updated alarm");
        Ok(updated)
    }

    /// Delete an alarm and every override that references it.
    pub fn remove(&mut self, id: &AlarmId) -> Result<()> {
        let removed = self
            .alarms
            .remove(id)
            .ok_or_else(|| Error::AlarmNotFound(id.clone()))?;

        let cascaded: Vec<Override> = {
            let ids: Vec<OverrideId> = self
                .overrides
                .values()
                .filter(|o| &o.alarm_id == id)
                .map(|o| o.id.clone())
                .collect();
            ids.iter()
                .filter_map(|oid| self.overrides.remove(oid))
                .collect()
        };

        if let Err(err) = self.persist() {
            self.alarms.insert(id.clone(), removed);
            for o in cascaded {
                self.overrides.insert(o.id.clone(), o);
            }
            return Err(err);
        }

        info!(alarm_id = %id, cascaded = cascaded.len(), "Deleted alarm");
        Ok(())
    }

    pub fn toggle(&mut self, id: &AlarmId) -> Result<Alarm> {
        let enabled = !self
            .alarms
            .get(id)
            .ok_or_else(|| Error::AlarmNotFound(id.clone()))?
            .enabled;
        let updated = self.update(
            id,
            AlarmPatch {
                enabled: Some(enabled),
                ..AlarmPatch::default()
            },
        )?;
        Ok(updated)
    }

    pub fn get(&self, id: &AlarmId) -> Option<&Alarm> {
        self.alarms.get(id)
    }

    /// All alarms, ordered by id for deterministic iteration.
    pub fn alarms(&self) -> impl Iterator<Item = &Alarm> {
        self.alarms.values()
    }

    pub fn get_override(&self, id: &OverrideId) -> Option<&Override> {
        self.overrides.get(id)
    }

    /// Overrides, optionally restricted to one alarm.
    pub fn overrides(&self, alarm_id: Option<&AlarmId>) -> Vec<Override> {
        self.overrides
            .values()
            .filter(|o| alarm_id.is_none_or(|id| &o.alarm_id == id))
            .cloned()
            .collect()
    }

    /// The override targeting one (alarm, date) pair, if any.
    pub fn override_for(&self, alarm_id: &AlarmId, date: Date) -> Option<&Override> {
        self.overrides
            .values()
            .find(|o| &o.alarm_id == alarm_id && o.target_date == date)
    }

    /// Create an override for (alarm, date), or update the existing
    /// one -- the pair is unique by invariant, so a second create
    /// must not duplicate it.
    pub fn upsert_override(
        &mut self,
        alarm_id: &AlarmId,
        target_date: Date,
        patch: OverridePatch,
    ) -> Result<Override> {
        if !self.alarms.contains_key(alarm_id) {
            return Err(Error::AlarmNotFound(alarm_id.clone()));
        }

        if let Some(existing) = self.override_for(alarm_id, target_date) {
            let id = existing.id.clone();
            return self.update_override(&id, patch);
        }

        let overridden = Override {
            id: OverrideId::generate(),
            alarm_id: alarm_id.clone(),
            target_date,
            override_time: patch.override_time,
            override_sound: patch.override_sound,
            skip: patch.skip.unwrap_or(false),
        };

        self.overrides.insert(overridden.id.clone(), overridden.clone());
        if let Err(err) = self.persist() {
            self.overrides.remove(&overridden.id);
            return Err(err);
        }

        info!(
            override_id = %overridden.id,
            alarm_id = %alarm_id,
            target_date = %target_date,
            "Created override"
        );
        Ok(overridden)
    }

    pub fn update_override(&mut self, id: &OverrideId, patch: OverridePatch) -> Result<Override> {
        let previous = self
            .overrides
            .get(id)
            .cloned()
            .ok_or_else(|| Error::OverrideNotFound(id.clone()))?;

        let overridden = self
            .overrides
            .get_mut(id)
            .ok_or_else(|| Error::OverrideNotFound(id.clone()))?;
        if let Some(time) = patch.override_time {
            overridden.override_time = Some(time);
        }
        if let Some(sound) = patch.override_sound {
            overridden.override_sound = Some(sound);
        }
        if let Some(skip) = patch.skip {
            overridden.skip = skip;
        }
        let updated = overridden.clone();

        if let Err(err) = self.persist() {
            self.overrides.insert(id.clone(), previous);
            return Err(err);
        }

        info!(override_id = %id, "Updated override");
        Ok(updated)
    }

    /// Delete an override, restoring the recurring default for its
    /// date.
    pub fn remove_override(&mut self, id: &OverrideId) -> Result<()> {
        let removed = self
            .overrides
            .remove(id)
            .ok_or_else(|| Error::OverrideNotFound(id.clone()))?;

        if let Err(err) = self.persist() {
            self.overrides.insert(id.clone(), removed);
            return Err(err);
        }

        info!(override_id = %id, "Deleted override");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::persist::testing::MemFiles;
    use super::*;
    use time::macros::time;

    pub fn empty_store() -> AlarmStore {
        AlarmStore::open(Box::new(MemFiles::default())).unwrap()
    }

    pub fn new_alarm(time: Time, days: &[DayTag]) -> NewAlarm {
        NewAlarm {
            time,
            days: days.iter().copied().collect(),
            sound: "default.mp3".into(),
            label: String::new(),
            enabled: true,
        }
    }

    pub fn weekday_alarm() -> NewAlarm {
        new_alarm(
            time!(07:00),
            &[DayTag::Mon, DayTag::Tue, DayTag::Wed, DayTag::Thu, DayTag::Fri],
        )
    }
}
