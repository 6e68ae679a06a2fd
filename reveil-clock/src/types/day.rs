//! Weekday tags for alarm recurrence.
//!
//! The wire format uses the short lowercase names ("mon".."sun");
//! the long names are accepted on input for compatibility with
//! hand-edited data files.

use serde::{Deserialize, Serialize};
use time::Weekday;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum DayTag {
    #[serde(alias = "monday")]
    #[strum(to_string = "mon", serialize = "monday")]
    Mon,
    #[serde(alias = "tuesday")]
    #[strum(to_string = "tue", serialize = "tuesday")]
    Tue,
    #[serde(alias = "wednesday")]
    #[strum(to_string = "wed", serialize = "wednesday")]
    Wed,
    #[serde(alias = "thursday")]
    #[strum(to_string = "thu", serialize = "thursday")]
    Thu,
    #[serde(alias = "friday")]
    #[strum(to_string = "fri", serialize = "friday")]
    Fri,
    #[serde(alias = "saturday")]
    #[strum(to_string = "sat", serialize = "saturday")]
    Sat,
    #[serde(alias = "sunday")]
    #[strum(to_string = "sun", serialize = "sunday")]
    Sun,
}

impl From<Weekday> for DayTag {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Monday => DayTag::Mon,
            Weekday::Tuesday => DayTag::Tue,
            Weekday::Wednesday => DayTag::Wed,
            Weekday::Thursday => DayTag::Thu,
            Weekday::Friday => DayTag::Fri,
            Weekday::Saturday => DayTag::Sat,
            Weekday::Sunday => DayTag::Sun,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn short_names_round_trip_through_json() {
        let json = serde_json::to_string(&DayTag::Wed).unwrap();
        assert_eq!(json, "\"wed\"");
        assert_eq!(serde_json::from_str::<DayTag>(&json).unwrap(), DayTag::Wed);
        assert_eq!(DayTag::Wed.to_string(), "wed");
    }

    #[test]
    fn long_names_accepted_on_input() {
        assert_eq!(
            serde_json::from_str::<DayTag>("\"wednesday\"").unwrap(),
            DayTag::Wed
        );
    }

    #[test]
    fn parses_either_name_case_insensitively() {
        assert_eq!(DayTag::from_str("MON").unwrap(), DayTag::Mon);
        assert_eq!(DayTag::from_str("Saturday").unwrap(), DayTag::Sat);
    }

    #[test]
    fn maps_from_time_weekday() {
        assert_eq!(DayTag::from(Weekday::Sunday), DayTag::Sun);
    }
}
