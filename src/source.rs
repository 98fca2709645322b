//! Where alarms come from.
//!
//! The engine treats the source as somebody else's problem: it asks for the
//! current list now and then and keeps whatever it got last in an [`AlarmFeed`].

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    alarm::{AlarmId, AlarmRecord, Urgency},
    config::Config,
    error::SourceError,
};

pub trait AlarmSource {
    fn list_alarms(&mut self) -> Result<Vec<AlarmRecord>, SourceError>;
    fn create_alarm(
        &mut self,
        hour: u32,
        minute: u32,
        difficulty: Urgency,
    ) -> Result<AlarmRecord, SourceError>;
    fn delete_alarm(&mut self, alarm_id: AlarmId) -> Result<(), SourceError>;
}

/// Outcome of the latest fetch from an [`AlarmSource`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AlarmFeed {
    #[default]
    Pending,
    Failed(String),
    Ready(Vec<AlarmRecord>),
}

impl AlarmFeed {
    /// The alarms to match against, only if the last fetch worked.
    #[must_use]
    pub fn alarms(&self) -> Option<&[AlarmRecord]> {
        match self {
            Self::Ready(alarms) => Some(alarms),
            Self::Pending | Self::Failed(_) => None,
        }
    }

    /// Fetches the list, trying again up to `retries` times before giving up.
    pub fn refresh<S: AlarmSource + ?Sized>(&mut self, source: &mut S, retries: u32) {
        let mut attempt = 0;
        *self = loop {
            match source.list_alarms() {
                Ok(alarms) => {
                    debug!("fetched {} alarms", alarms.len());
                    break Self::Ready(alarms);
                }
                Err(e) if attempt < retries => {
                    attempt += 1;
                    debug!("fetching alarms failed ({e}), retry {attempt} of {retries}");
                }
                Err(e) => {
                    warn!("couldn't fetch alarms: {e}");
                    break Self::Failed(e.to_string());
                }
            }
        };
    }
}

fn check_time(hour: u32, minute: u32) -> Result<(), SourceError> {
    if AlarmRecord::is_valid_time(hour, minute) {
        Ok(())
    } else {
        Err(SourceError::InvalidTime { hour, minute })
    }
}

fn next_id(alarms: &[AlarmRecord]) -> AlarmId {
    alarms.iter().map(|alarm| alarm.alarm_id).max().map_or(1, |id| id + 1)
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct AlarmsFile {
    #[serde(default)]
    alarms: Vec<AlarmRecord>,
}

/// Alarms kept in a TOML file, re-read on every fetch so edits made by another
/// process show up.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Opens the alarms file the config points at.
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        Ok(Self::new(config.alarms_path()?))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SourceError {
        SourceError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read(&self) -> Result<AlarmsFile, SourceError> {
        if !self.path.exists() {
            return Ok(AlarmsFile::default());
        }
        let contents = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        Ok(toml::from_str(&contents)?)
    }

    fn write(&self, file: &AlarmsFile) -> Result<(), SourceError> {
        let contents = toml::to_string(file)?;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }
        fs::write(&self.path, contents).map_err(|e| self.io_error(e))
    }
}

impl AlarmSource for FileSource {
    fn list_alarms(&mut self) -> Result<Vec<AlarmRecord>, SourceError> {
        Ok(self.read()?.alarms)
    }

    fn create_alarm(
        &mut self,
        hour: u32,
        minute: u32,
        difficulty: Urgency,
    ) -> Result<AlarmRecord, SourceError> {
        check_time(hour, minute)?;
        let mut file = self.read()?;
        let alarm = AlarmRecord::new(next_id(&file.alarms), hour, minute, difficulty);
        file.alarms.push(alarm.clone());
        self.write(&file)?;
        info!("created alarm {alarm}");
        Ok(alarm)
    }

    fn delete_alarm(&mut self, alarm_id: AlarmId) -> Result<(), SourceError> {
        let mut file = self.read()?;
        let before = file.alarms.len();
        file.alarms.retain(|alarm| alarm.alarm_id != alarm_id);
        if file.alarms.len() == before {
            return Err(SourceError::NotFound(alarm_id));
        }
        self.write(&file)?;
        info!("deleted alarm {alarm_id}");
        Ok(())
    }
}

/// Alarms held in memory. `set_unavailable` makes every call fail, to stand in
/// for an unreachable backend.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    alarms: Vec<AlarmRecord>,
    unavailable: bool,
}

impl MemorySource {
    #[must_use]
    pub const fn new(alarms: Vec<AlarmRecord>) -> Self {
        Self {
            alarms,
            unavailable: false,
        }
    }

    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    fn available(&self) -> Result<(), SourceError> {
        if self.unavailable {
            Err(SourceError::Unavailable("source marked unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl AlarmSource for MemorySource {
    fn list_alarms(&mut self) -> Result<Vec<AlarmRecord>, SourceError> {
        self.available()?;
        Ok(self.alarms.clone())
    }

    fn create_alarm(
        &mut self,
        hour: u32,
        minute: u32,
        difficulty: Urgency,
    ) -> Result<AlarmRecord, SourceError> {
        self.available()?;
        check_time(hour, minute)?;
        let alarm = AlarmRecord::new(next_id(&self.alarms), hour, minute, difficulty);
        self.alarms.push(alarm.clone());
        Ok(alarm)
    }

    fn delete_alarm(&mut self, alarm_id: AlarmId) -> Result<(), SourceError> {
        self.available()?;
        let before = self.alarms.len();
        self.alarms.retain(|alarm| alarm.alarm_id != alarm_id);
        if self.alarms.len() == before {
            return Err(SourceError::NotFound(alarm_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// fails a set number of times before answering
    struct Flaky {
        failures_left: u32,
        calls: u32,
    }

    impl AlarmSource for Flaky {
        fn list_alarms(&mut self) -> Result<Vec<AlarmRecord>, SourceError> {
            self.calls += 1;
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(SourceError::Unavailable("flaky".to_string()));
            }
            Ok(vec![AlarmRecord::new(1, 8, 0, Urgency::Low)])
        }

        fn create_alarm(&mut self, _: u32, _: u32, _: Urgency) -> Result<AlarmRecord, SourceError> {
            unimplemented!()
        }

        fn delete_alarm(&mut self, _: AlarmId) -> Result<(), SourceError> {
            unimplemented!()
        }
    }

    #[test]
    fn feed_starts_pending() {
        let feed = AlarmFeed::default();
        assert_eq!(feed, AlarmFeed::Pending);
        assert!(feed.alarms().is_none());
    }

    #[test]
    fn refresh_retries_once() {
        let mut flaky = Flaky {
            failures_left: 1,
            calls: 0,
        };
        let mut feed = AlarmFeed::default();
        feed.refresh(&mut flaky, 1);
        assert_eq!(flaky.calls, 2);
        assert_eq!(feed.alarms().map(<[AlarmRecord]>::len), Some(1));
    }

    #[test]
    fn refresh_gives_up_after_retries() {
        let mut flaky = Flaky {
            failures_left: 5,
            calls: 0,
        };
        let mut feed = AlarmFeed::Ready(vec![]);
        feed.refresh(&mut flaky, 1);
        assert_eq!(flaky.calls, 2);
        assert!(matches!(feed, AlarmFeed::Failed(_)));
        assert!(feed.alarms().is_none());
    }

    #[test]
    fn file_source_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut source = FileSource::new(dir.path().join("nested").join("alarms.toml"));
        assert!(source.list_alarms().unwrap().is_empty());

        let first = source.create_alarm(9, 30, Urgency::High).unwrap();
        let second = source.create_alarm(6, 0, Urgency::Low).unwrap();
        assert_eq!(first.alarm_id, 1);
        assert_eq!(second.alarm_id, 2);

        // a fresh handle sees the same file
        let mut reopened = FileSource::new(source.path().to_path_buf());
        assert_eq!(reopened.list_alarms().unwrap(), vec![first, second.clone()]);

        reopened.delete_alarm(1).unwrap();
        assert_eq!(source.list_alarms().unwrap(), vec![second]);
        assert!(matches!(source.delete_alarm(1), Err(SourceError::NotFound(1))));
    }

    #[test]
    fn from_config_uses_alarms_path() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            alarms_path: Some(dir.path().join("mine.toml")),
            ..Config::default()
        };
        let source = FileSource::from_config(&config).unwrap();
        assert_eq!(source.path(), dir.path().join("mine.toml"));
    }

    #[test]
    fn ids_are_not_reused_after_delete_of_lower_id() {
        let mut source = MemorySource::default();
        source.create_alarm(1, 0, Urgency::Low).unwrap();
        source.create_alarm(2, 0, Urgency::Low).unwrap();
        source.delete_alarm(1).unwrap();
        assert_eq!(source.create_alarm(3, 0, Urgency::Low).unwrap().alarm_id, 3);
    }

    #[test]
    fn rejects_invalid_times() {
        let mut source = MemorySource::default();
        assert!(matches!(
            source.create_alarm(24, 0, Urgency::Low),
            Err(SourceError::InvalidTime { hour: 24, minute: 0 })
        ));
        assert!(source.create_alarm(23, 60, Urgency::Low).is_err());
    }

    #[test]
    fn unavailable_memory_source_fails() {
        let mut source = MemorySource::new(vec![AlarmRecord::new(1, 1, 1, Urgency::Low)]);
        source.set_unavailable(true);
        assert!(matches!(source.list_alarms(), Err(SourceError::Unavailable(_))));
        source.set_unavailable(false);
        assert_eq!(source.list_alarms().unwrap().len(), 1);
    }

    #[test]
    fn reads_hand_written_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alarms.toml");
        fs::write(
            &path,
            r#"
            [[alarms]]
            alarm_id = 12
            hour = 5
            minute = 15
            "#,
        )
        .unwrap();
        let alarms = FileSource::new(path).list_alarms().unwrap();
        assert_eq!(alarms, vec![AlarmRecord::new(12, 5, 15, Urgency::Low)]);
    }
}
