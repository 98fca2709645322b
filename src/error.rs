//! Error types for the alarm engine.
//!
//! None of these are fatal to a running [`Clock`](crate::clock::Clock): source
//! failures become [`AlarmFeed::Failed`](crate::source::AlarmFeed::Failed) and
//! an [`AudioError`] only swaps in a silent alert.

use std::path::PathBuf;
use thiserror::Error;

/// Top level error, returned by [`FileSource::from_config`](crate::source::FileSource::from_config)
/// and by the binary.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Alarm source error: {0}")]
    Source(#[from] SourceError),

    #[error("invalid time: {0}")]
    Time(#[from] chrono::ParseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("couldn't read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("couldn't serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("no home directory to place the config in")]
    NoProjectDirs,

    #[error("poll interval must be between 1 and 60000 ms, got {0}")]
    PollInterval(u64),

    #[error("refresh interval must be greater than 0 ms")]
    RefreshInterval,

    #[error("volume must be between 0 and 100, got {0}")]
    Volume(f32),
}

/// Failures of an [`AlarmSource`](crate::source::AlarmSource).
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("alarm source unavailable: {0}")]
    Unavailable(String),

    #[error("couldn't access alarms file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't parse alarms file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("couldn't serialize alarms: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("no alarm with id {0}")]
    NotFound(u64),

    #[error("{hour:02}:{minute:02} is not a valid alarm time")]
    InvalidTime { hour: u32, minute: u32 },
}

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("couldn't open audio output: {0}")]
    Device(#[from] rodio::StreamError),

    #[error("couldn't open sound file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't decode sound file: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
}

pub type Result<T> = std::result::Result<T, Error>;
