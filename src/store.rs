use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
    alarm::Alarm,
    error::{Result, WakeyError},
};

/// on-disk shape of the snapshot file
#[derive(Debug, Serialize, Deserialize, Default)]
struct Snapshot {
    #[serde(default)]
    alarms: Vec<Alarm>,
}

/// the ordered collection of alarms, insertion order preserved.
/// alarm numbers shown to the user are 1-based indexes into this order.
/// owns its snapshot file, loaded at startup and written at save points
#[derive(Debug)]
pub struct AlarmStore {
    alarms: Vec<Alarm>,
    path: PathBuf,
}

impl AlarmStore {
    /// an empty store that will snapshot to `path`
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            alarms: Vec::new(),
            path,
        }
    }

    /// load the store from its snapshot file.
    /// a missing snapshot means an empty store, not an error
    pub fn open(path: PathBuf) -> Result<Self> {
        let mut store = Self::new(path);
        store.restore()?;
        Ok(store)
    }

    pub fn add(&mut self, alarm: Alarm) {
        self.alarms.push(alarm);
    }

    /// remove alarm `number` (1-based), shifting the rest down
    pub fn remove_at(&mut self, number: usize) -> Result<Alarm> {
        if number < 1 || number > self.alarms.len() {
            return Err(WakeyError::IndexOutOfRange(number));
        }
        Ok(self.alarms.remove(number - 1))
    }

    pub fn get_mut(&mut self, number: usize) -> Result<&mut Alarm> {
        if number < 1 || number > self.alarms.len() {
            return Err(WakeyError::IndexOutOfRange(number));
        }
        Ok(&mut self.alarms[number - 1])
    }

    #[must_use]
    pub fn list(&self) -> &[Alarm] {
        &self.alarms
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }

    /// the first due alarm in store order, if any.
    /// when several alarms are due at the same tick only this one is
    /// dispatched, that is deliberate policy
    #[must_use]
    pub fn first_due(&self, now: NaiveDateTime) -> Option<&Alarm> {
        self.alarms.iter().find(|alarm| alarm.is_due(now))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// write the full sequence to the snapshot file
    pub fn snapshot(&self) -> Result<()> {
        let snapshot = toml::to_string(&Snapshot {
            alarms: self.alarms.clone(),
        })?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, snapshot)?;
        log::debug!("saved {} alarms to {}", self.alarms.len(), self.path.display());
        Ok(())
    }

    /// replace the in-memory sequence with the snapshot file's contents
    pub fn restore(&mut self) -> Result<()> {
        if !self.path.exists() {
            self.alarms = Vec::new();
            return Ok(());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let snapshot: Snapshot = toml::from_str(&contents)?;
        self.alarms = snapshot.alarms;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::{NotifyKind, Weekday};
    use chrono::NaiveDate;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(name).join("alarms.toml")
    }

    fn seven_am() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap()
    }

    #[test]
    fn add_appends_in_order() {
        let mut store = AlarmStore::new(scratch("wakey-test-add"));
        let mut first = Alarm::new(seven_am());
        first.message = Some("first".to_string());
        let mut second = Alarm::new(seven_am());
        second.message = Some("second".to_string());
        store.add(first);
        store.add(second);
        assert_eq!(store.len(), 2);
        assert_eq!(store.list()[0].message.as_deref(), Some("first"));
        assert_eq!(store.list()[1].message.as_deref(), Some("second"));
    }

    #[test]
    fn remove_at_is_one_based_and_shifts() {
        let mut store = AlarmStore::new(scratch("wakey-test-remove"));
        let mut first = Alarm::new(seven_am());
        first.message = Some("first".to_string());
        let mut second = Alarm::new(seven_am());
        second.message = Some("second".to_string());
        store.add(first);
        store.add(second);
        let removed = store.remove_at(1).unwrap();
        assert_eq!(removed.message.as_deref(), Some("first"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.list()[0].message.as_deref(), Some("second"));
    }

    #[test]
    fn remove_at_out_of_range_leaves_store_unchanged() {
        let mut store = AlarmStore::new(scratch("wakey-test-oob"));
        assert!(matches!(
            store.remove_at(1),
            Err(WakeyError::IndexOutOfRange(1))
        ));
        store.add(Alarm::new(seven_am()));
        assert!(matches!(
            store.remove_at(0),
            Err(WakeyError::IndexOutOfRange(0))
        ));
        assert!(matches!(
            store.remove_at(2),
            Err(WakeyError::IndexOutOfRange(2))
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn first_due_picks_the_first_in_store_order() {
        let mut store = AlarmStore::new(scratch("wakey-test-first"));
        let mut first = Alarm::new(seven_am());
        first.message = Some("first".to_string());
        let mut second = Alarm::new(seven_am());
        second.message = Some("second".to_string());
        store.add(first);
        store.add(second);
        let due = store.first_due(seven_am()).unwrap();
        assert_eq!(due.message.as_deref(), Some("first"));
    }

    #[test]
    fn missing_snapshot_restores_to_empty() {
        let path = scratch("wakey-test-missing");
        std::fs::remove_file(&path).ok();
        let store = AlarmStore::open(path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn snapshot_round_trips_every_field() {
        let path = scratch("wakey-test-roundtrip");

        let mut alarm = Alarm::new(seven_am());
        alarm.repeat_days = [Weekday::Mon, Weekday::Wed].into_iter().collect();
        alarm.repeat_dates = [NaiveDate::from_ymd_opt(2024, 2, 14).unwrap()]
            .into_iter()
            .collect();
        alarm.message = Some("stand up".to_string());
        alarm.notify_kind = NotifyKind::Music;
        alarm.location = Some("home office".to_string());
        alarm.music_file = Some("/music/rooster.mp3".to_string());
        alarm.calendar_event = Some("dentist at 09:00".to_string());
        alarm.snooze(5);
        let mut stopped = Alarm::new(seven_am());
        stopped.stop();

        let mut store = AlarmStore::new(path.clone());
        store.add(alarm);
        store.add(stopped);
        store.snapshot().unwrap();

        let restored = AlarmStore::open(path.clone()).unwrap();
        assert_eq!(restored.list(), store.list());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn restore_replaces_the_sequence_wholesale() {
        let path = scratch("wakey-test-wholesale");
        let mut on_disk = AlarmStore::new(path.clone());
        on_disk.add(Alarm::new(seven_am()));
        on_disk.snapshot().unwrap();

        let mut store = AlarmStore::new(path.clone());
        store.add(Alarm::new(seven_am()));
        store.add(Alarm::new(seven_am()));
        store.restore().unwrap();
        assert_eq!(store.len(), 1);
        std::fs::remove_file(&path).ok();
    }
}
