//! Calendar client configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{ClientError, Result};

/// Comma-separated calendar URLs replacing the configured list
pub const CALENDARS_ENV: &str = "SST_CALENDARS";

pub const DEFAULT_CALENDARS: [&str; 4] = [
    "https://alice.btc.calendar.opentimestamps.org",
    "https://bob.btc.calendar.opentimestamps.org",
    "https://finney.calendar.eternitywall.com",
    "https://btc.calendar.catallaxy.com",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Calendars a new timestamp is submitted to
    #[serde(default = "default_calendars")]
    pub calendars: Vec<String>,

    /// Per-request timeout for the HTTP transport (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_calendars() -> Vec<String> {
    DEFAULT_CALENDARS.iter().map(|url| url.to_string()).collect()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            calendars: default_calendars(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CalendarConfig {
    /// Load configuration from a TOML file, then apply the environment.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: CalendarConfig = toml::from_str(&contents)
            .map_err(|e| ClientError::Config(format!("Invalid config: {}", e)))?;

        Ok(config.with_env())
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ClientError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)
            .map_err(|e| ClientError::Config(format!("Failed to write {}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Replace the calendar list from `SST_CALENDARS` when it is set.
    pub fn with_env(self) -> Self {
        match std::env::var(CALENDARS_ENV) {
            Ok(value) => self.with_calendar_list(&value),
            Err(_) => self,
        }
    }

    fn with_calendar_list(mut self, list: &str) -> Self {
        let calendars: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(String::from)
            .collect();

        if !calendars.is_empty() {
            self.calendars = calendars;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CalendarConfig::default();
        assert_eq!(config.calendars.len(), 4);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sst.toml");

        let config = CalendarConfig {
            calendars: vec!["https://calendar.example".to_string()],
            timeout_secs: 5,
        };
        config.to_file(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let loaded: CalendarConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: CalendarConfig = toml::from_str("timeout_secs = 3").unwrap();
        assert_eq!(config.calendars, default_calendars());
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn test_calendar_list_override() {
        let config = CalendarConfig::default()
            .with_calendar_list(" https://a.example , ,https://b.example");
        assert_eq!(config.calendars, vec!["https://a.example", "https://b.example"]);

        // A blank list keeps what was configured
        let config = CalendarConfig::default().with_calendar_list(" , ");
        assert_eq!(config.calendars, default_calendars());
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "calendars = 12").unwrap();

        assert!(matches!(
            CalendarConfig::from_file(&path),
            Err(ClientError::Config(_))
        ));
    }
}
