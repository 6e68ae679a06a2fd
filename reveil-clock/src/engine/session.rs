//! Ringing state machine.
//!
//! ```text
//!            trigger                    snooze
//!  Idle ──────────────► Ringing ──────────────────► Snoozed
//!   ▲                     │  ▲                         │ │
//!   │       dismiss       │  │  now >= snooze_until    │ │
//!   ◄─────────────────────┘  └─────────────────────────┘ │
//!   │                          dismiss                   │
//!   ◄────────────────────────────────────────────────────┘
//! ```
//!
//! At most one non-Idle session exists at any time; a second alarm
//! becoming due while one is active is deferred to a later tick.
//! Transitions return the [`PlayerAction`] they require so the caller
//! can apply side effects after releasing the engine lock.

use time::{Duration, PrimitiveDateTime};

use crate::error::{Error, Result};
use crate::types::{AlarmId, OverrideId};

/// Audio side effect requested by a transition. Best-effort: applying
/// it must never block or fail the transition itself.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerAction {
    Start { sound: String },
    Stop,
}

/// Runtime record of the alarm currently ringing or snoozed.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub alarm_id: AlarmId,
    /// The exact minute the occurrence was due.
    pub fire_time: PrimitiveDateTime,
    /// Effective sound for this occurrence (override already merged).
    pub sound: String,
    pub label: String,
    pub override_id: Option<OverrideId>,
    /// When ringing began, for the ring timeout.
    pub ringing_since: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RingState {
    #[default]
    Idle,
    Ringing(Session),
    Snoozed {
        session: Session,
        until: PrimitiveDateTime,
    },
}

impl RingState {
    pub fn is_ringing(&self) -> bool {
        matches!(self, RingState::Ringing(_))
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, RingState::Idle)
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            RingState::Idle => None,
            RingState::Ringing(session) | RingState::Snoozed { session, .. } => Some(session),
        }
    }

    /// Idle -> Ringing. Callers guarantee no session is active.
    pub fn trigger(&mut self, session: Session) -> PlayerAction {
        let sound = session.sound.clone();
        *self = RingState::Ringing(session);
        PlayerAction::Start { sound }
    }

    /// Ringing -> Snoozed. The pending re-ring keeps the original
    /// alarm and sound.
    pub fn snooze(&mut self, now: PrimitiveDateTime, duration: Duration) -> Result<PlayerAction> {
        match std::mem::take(self) {
            RingState::Ringing(session) => {
                *self = RingState::Snoozed {
                    session,
                    until: now + duration,
                };
                Ok(PlayerAction::Stop)
            }
            other => {
                *self = other;
                Err(Error::NotRinging)
            }
        }
    }

    /// Ringing -> Idle, or Snoozed -> Idle (cancels the re-ring).
    pub fn dismiss(&mut self) -> Result<PlayerAction> {
        match self {
            RingState::Idle => Err(Error::NotRinging),
            RingState::Ringing(_) | RingState::Snoozed { .. } => {
                *self = RingState::Idle;
                Ok(PlayerAction::Stop)
            }
        }
    }

    /// Snoozed -> Ringing once the wall clock reaches `snooze_until`.
    pub fn resume_if_due(&mut self, now: PrimitiveDateTime) -> Option<PlayerAction> {
        let due = matches!(self, RingState::Snoozed { until, .. } if now >= *until);
        if !due {
            return None;
        }
        let RingState::Snoozed { mut session, .. } = std::mem::take(self) else {
            return None;
        };
        session.ringing_since = now;
        let sound = session.sound.clone();
        *self = RingState::Ringing(session);
        Some(PlayerAction::Start { sound })
    }

    /// True when the session has been ringing for at least `timeout`.
    pub fn ringing_past(&self, now: PrimitiveDateTime, timeout: Duration) -> bool {
        match self {
            RingState::Ringing(session) => now - session.ringing_since >= timeout,
            _ => false,
        }
    }
}
