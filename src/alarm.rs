use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub type AlarmId = u64;

/// represents an alarm as the alarm source hands it to us.
/// the engine never edits these, it only reads them
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AlarmRecord {
    pub alarm_id: AlarmId,
    pub hour: u32,
    pub minute: u32,
    /// missing difficulties are treated as low
    #[serde(default)]
    pub difficulty: Urgency,
}

impl AlarmRecord {
    #[must_use]
    pub const fn new(alarm_id: AlarmId, hour: u32, minute: u32, difficulty: Urgency) -> Self {
        Self {
            alarm_id,
            hour,
            minute,
            difficulty,
        }
    }

    #[must_use]
    pub const fn is_valid_time(hour: u32, minute: u32) -> bool {
        hour < 24 && minute < 60
    }
}

impl fmt::Display for AlarmRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {:02}:{:02} ({})",
            self.alarm_id, self.hour, self.minute, self.difficulty
        )
    }
}

/// How hard the dismissal challenge should be.
///
/// Open ended: levels we don't know about are kept verbatim in `Other` so they
/// survive a round trip through the alarm source.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum Urgency {
    #[default]
    Low,
    Medium,
    High,
    Other(String),
}

impl Urgency {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Urgency {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for Urgency {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Urgency> for String {
    fn from(value: Urgency) -> Self {
        match value {
            Urgency::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for Urgency {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
