use std::{fs, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{controller::RetriggerPolicy, error::ConfigError};

/// longest poll interval that still can't step over a whole minute
pub const MAX_POLL_INTERVAL_MS: u64 = 60_000;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// how often the current time is checked against the alarms
    pub poll_interval_ms: u64,
    /// how often the alarm list is fetched again
    pub refresh_interval_ms: u64,
    /// extra attempts when fetching the alarm list fails
    pub fetch_retries: u32,
    pub retrigger: RetriggerPolicy,
    /// sound file to loop while ringing, a beep is used if this is not set
    pub sound: Option<PathBuf>,
    /// 0 - 100
    pub volume: f32,
    /// where the alarms are stored, defaults to the data dir
    pub alarms_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            refresh_interval_ms: 5_000,
            fetch_retries: 1,
            retrigger: RetriggerPolicy::default(),
            sound: None,
            volume: 100.0,
            alarms_path: None,
        }
    }
}

fn project_dirs() -> Result<directories::ProjectDirs, ConfigError> {
    directories::ProjectDirs::from("", "", "alarm_trigger").ok_or(ConfigError::NoProjectDirs)
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        let config = fs::read_to_string(&path).map_err(|source| ConfigError::Read { path, source })?;
        let config: Self = toml::from_str(&config)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the config at `path`, or the defaults if there is no file yet.
    pub fn load_or_default(path: PathBuf) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: PathBuf) -> Result<(), ConfigError> {
        let config = toml::to_string(self)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, config).map_err(|source| ConfigError::Write { path, source })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 || self.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(ConfigError::PollInterval(self.poll_interval_ms));
        }
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::RefreshInterval);
        }
        if !(0.0..=100.0).contains(&self.volume) {
            return Err(ConfigError::Volume(self.volume));
        }
        Ok(())
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn alarms_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.alarms_path {
            Some(path) => Ok(path.clone()),
            None => Self::default_alarms_path(),
        }
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let mut path = project_dirs()?.config_dir().to_path_buf();
        path.push("config.toml");
        Ok(path)
    }

    pub fn default_alarms_path() -> Result<PathBuf, ConfigError> {
        let mut path = project_dirs()?.data_dir().to_path_buf();
        path.push("alarms.toml");
        Ok(path)
    }
}
