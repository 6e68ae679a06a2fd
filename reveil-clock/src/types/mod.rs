//! Small domain types shared by the store, engine, and API.

mod day;
mod id;

pub use day::DayTag;
pub use id::{AlarmId, OverrideId};

use time::{PrimitiveDateTime, Time};

// serde helpers for the wire/disk formats: times are "HH:MM", dates
// are "YYYY-MM-DD". Both round-trip exactly through save/load.
time::serde::format_description!(pub(crate) hhmm, Time, "[hour]:[minute]");
time::serde::format_description!(pub(crate) ymd, Date, "[year]-[month]-[day]");

/// Drop the seconds (and sub-seconds) from a date-time.
///
/// The engine compares everything at minute granularity; seconds are
/// truncated, never rounded.
pub fn truncate_to_minute(dt: PrimitiveDateTime) -> PrimitiveDateTime {
    let t = dt.time();
    // hour/minute came from a valid Time, so this cannot fail
    let minute = Time::from_hms(t.hour(), t.minute(), 0).unwrap_or(t);
    dt.replace_time(minute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn truncation_drops_seconds() {
        let dt = datetime!(2026-03-02 07:00:30);
        assert_eq!(truncate_to_minute(dt), datetime!(2026-03-02 07:00:00));
    }

    #[test]
    fn truncation_is_idempotent() {
        let dt = datetime!(2026-03-02 06:59:00);
        assert_eq!(truncate_to_minute(dt), dt);
    }
}
