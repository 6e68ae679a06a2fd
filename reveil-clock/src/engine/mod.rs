//! The alarm scheduling engine.
//!
//! [`Engine`] combines the alarm store, the ringing state machine,
//! and the fired-today guard behind one value. All callers (the
//! evaluation loop and the API handlers) share it through a single
//! mutex, so every read-modify-write serializes. Transitions return
//! [`PlayerAction`]s instead of touching hardware; the caller applies
//! them after the lock is released.

pub mod monitor;
mod resolver;
mod session;

pub use monitor::AlarmMonitor;
pub use resolver::{next_occurrence, occurrence_on, EffectiveOccurrence, NextOccurrence};
pub use session::{PlayerAction, RingState, Session};

use std::collections::HashMap;

use time::{Date, PrimitiveDateTime};
use tracing::info;

use crate::config::ClockConfig;
use crate::error::Result;
use crate::store::AlarmStore;
use crate::types::{truncate_to_minute, AlarmId};

pub struct Engine {
    store: AlarmStore,
    ring: RingState,
    /// Explicit per-alarm date stamp recorded at trigger time. An
    /// (alarm, date) pair that already fired never fires again that
    /// day, even if a late tick re-observes the due minute. Stale
    /// stamps are pruned each tick, which is what resets the guard at
    /// midnight.
    fired_today: HashMap<AlarmId, Date>,
    snooze_minutes: u16,
    ring_timeout: time::Duration,
}

impl Engine {
    pub fn new(store: AlarmStore, config: &ClockConfig) -> Self {
        Self {
            store,
            ring: RingState::Idle,
            fired_today: HashMap::new(),
            snooze_minutes: config.snooze_minutes,
            ring_timeout: config.ring_timeout(),
        }
    }

    pub fn store(&self) -> &AlarmStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut AlarmStore {
        &mut self.store
    }

    pub fn is_ringing(&self) -> bool {
        self.ring.is_ringing()
    }

    pub fn session(&self) -> Option<&Session> {
        self.ring.session()
    }

    pub fn snooze_minutes(&self) -> u16 {
        self.snooze_minutes
    }

    pub fn set_snooze_minutes(&mut self, minutes: u16) {
        self.snooze_minutes = minutes;
    }

    /// The next upcoming occurrence, for status reporting.
    pub fn next_alarm(&self, now: PrimitiveDateTime) -> Option<NextOccurrence> {
        next_occurrence(&self.store, now)
    }

    /// One evaluation step, driven by the monitor task.
    ///
    /// In priority order: re-ring an expired snooze, auto-dismiss a
    /// session that rang past the timeout, or trigger an alarm whose
    /// effective time equals the current minute. A non-idle session
    /// defers any other due alarm to a later tick.
    pub fn tick(&mut self, now: PrimitiveDateTime) -> Option<PlayerAction> {
        let now = truncate_to_minute(now);

        if let Some(action) = self.ring.resume_if_due(now) {
            let session = self.ring.session();
            info!(
                alarm_id = session.map(|s| s.alarm_id.to_string()).unwrap_or_default(),
                "Snooze expired, ringing again"
            );
            return Some(action);
        }

        if self.ring.ringing_past(now, self.ring_timeout) {
            info!(
                timeout_minutes = self.ring_timeout.whole_minutes(),
                "Alarm rang unattended past the timeout, auto-dismissing"
            );
            return self.ring.dismiss().ok();
        }

        if !self.ring.is_idle() {
            return None;
        }

        let today = now.date();
        self.fired_today.retain(|_, date| *date == today);

        let due = self.store.alarms().find_map(|alarm| {
            if self.fired_today.contains_key(&alarm.id) {
                return None;
            }
            let occurrence = occurrence_on(&self.store, alarm, today)?;
            if occurrence.skip || occurrence.time != now.time() {
                return None;
            }
            Some(Session {
                alarm_id: alarm.id.clone(),
                fire_time: now,
                sound: occurrence.sound,
                label: occurrence.label,
                override_id: occurrence.override_id,
                ringing_since: now,
            })
        })?;

        self.fired_today.insert(due.alarm_id.clone(), today);
        info!(
            alarm_id = %due.alarm_id,
            fire_time = %due.fire_time,
            sound = %due.sound,
            "Alarm triggered"
        );
        Some(self.ring.trigger(due))
    }

    /// Snooze the currently ringing alarm.
    pub fn snooze(&mut self, now: PrimitiveDateTime) -> Result<PlayerAction> {
        let now = truncate_to_minute(now);
        let duration = time::Duration::minutes(i64::from(self.snooze_minutes));
        let action = self.ring.snooze(now, duration)?;
        info!(
            snooze_minutes = self.snooze_minutes,
            until = %(now + duration),
            "Alarm snoozed"
        );
        Ok(action)
    }

    /// Dismiss the ringing or snoozed alarm.
    pub fn dismiss(&mut self) -> Result<PlayerAction> {
        let action = self.ring.dismiss()?;
        info!("Alarm dismissed");
        Ok(action)
    }
}
