//! Durable storage for the alarm and override collections.
//!
//! The engine only needs two operations: load everything, save
//! everything. [`JsonFiles`] keeps the collections in a pair of JSON
//! files and replaces each atomically (write to a temp file in the
//! same directory, then rename) so a crash mid-write never leaves a
//! torn file behind.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::{Alarm, Override};
use crate::error::Result;

/// Storage backend for the full alarm + override set.
pub trait Persistence: Send {
    fn load(&self) -> Result<(Vec<Alarm>, Vec<Override>)>;
    fn save(&self, alarms: &[Alarm], overrides: &[Override]) -> Result<()>;
}

/// JSON-file persistence rooted at a data directory.
pub struct JsonFiles {
    alarms_path: PathBuf,
    overrides_path: PathBuf,
}

impl JsonFiles {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        Self {
            alarms_path: dir.join("alarms.json"),
            overrides_path: dir.join("overrides.json"),
        }
    }

    fn write_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_vec_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn read_or_default<T: serde::de::DeserializeOwned + Default>(path: &Path) -> Result<T> {
        if !path.exists() {
            return Ok(T::default());
        }
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl Persistence for JsonFiles {
    fn load(&self) -> Result<(Vec<Alarm>, Vec<Override>)> {
        let alarms: Vec<Alarm> = Self::read_or_default(&self.alarms_path)?;
        let overrides: Vec<Override> = Self::read_or_default(&self.overrides_path)?;
        info!(
            alarms = alarms.len(),
            overrides = overrides.len(),
            "Loaded persisted state"
        );
        Ok((alarms, overrides))
    }

    fn save(&self, alarms: &[Alarm], overrides: &[Override]) -> Result<()> {
        if let Some(dir) = self.alarms_path.parent() {
            fs::create_dir_all(dir)?;
        }
        Self::write_atomic(&self.alarms_path, &alarms)?;
        Self::write_atomic(&self.overrides_path, &overrides)?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlarmId, DayTag};
    use std::collections::BTreeSet;
    use time::macros::time;

    fn sample_alarm() -> Alarm {
        Alarm {
            id: AlarmId::from("alarm001"),
            time: time!(07:00),
            days: BTreeSet::from([DayTag::Mon, DayTag::Fri]),
            sound: "default.mp3".into(),
            label: "work".into(),
            enabled: true,
        }
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFiles::new(dir.path());

        store.save(&[sample_alarm()], &[]).unwrap();
        let (alarms, overrides) = store.load().unwrap();

        assert_eq!(alarms, vec![sample_alarm()]);
        assert!(overrides.is_empty());
    }

    #[test]
    fn loads_empty_when_files_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFiles::new(dir.path());

        let (alarms, overrides) = store.load().unwrap();
        assert!(alarms.is_empty());
        assert!(overrides.is_empty());
    }

    #[test]
    fn persisted_time_format_is_hh_mm() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFiles::new(dir.path());
        store.save(&[sample_alarm()], &[]).unwrap();

        let raw = fs::read_to_string(dir.path().join("alarms.json")).unwrap();
        assert!(raw.contains("\"07:00\""), "unexpected format: {raw}");
        assert!(raw.contains("\"mon\""));
    }

    #[test]
    fn leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFiles::new(dir.path());
        store.save(&[sample_alarm()], &[]).unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
