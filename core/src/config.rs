use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::driver::sqlite::SQLITE_DRIVER_NAME;
use crate::errors::ConfigError;

pub const DEFAULT_DRIVER_NAME: &str = "sqlite-log";
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Settings for the hooked driver and where its records go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentationConfig {
    /// Name the hooked driver is registered under.
    pub driver_name: String,
    pub measure_duration: bool,
    /// Records the buffered sink holds before it starts dropping.
    pub buffer_capacity: usize,
    /// Persist records in the `event_log` table.
    pub event_log: bool,
    /// Most verbose level the process logger lets through, e.g. `"debug"`.
    pub log_level: LevelFilter,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            driver_name: DEFAULT_DRIVER_NAME.to_string(),
            measure_duration: true,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            event_log: true,
            log_level: DEFAULT_LOG_LEVEL,
        }
    }
}

impl InstrumentationConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = self.driver_name.trim();
        if name.is_empty() || name == SQLITE_DRIVER_NAME {
            return Err(ConfigError::DriverName(self.driver_name.clone()));
        }
        if self.buffer_capacity == 0 {
            return Err(ConfigError::BufferCapacity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = InstrumentationConfig::from_json_str(r#"{"measure_duration": false}"#).unwrap();
        assert_eq!(config.driver_name, DEFAULT_DRIVER_NAME);
        assert!(!config.measure_duration);
        assert_eq!(config.buffer_capacity, DEFAULT_BUFFER_CAPACITY);
        assert!(config.event_log);
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn log_level_parses_case_insensitively() {
        let config = InstrumentationConfig::from_json_str(r#"{"log_level": "debug"}"#).unwrap();
        assert_eq!(config.log_level, LevelFilter::Debug);
        let config = InstrumentationConfig::from_json_str(r#"{"log_level": "OFF"}"#).unwrap();
        assert_eq!(config.log_level, LevelFilter::Off);
    }

    #[test]
    fn unknown_log_level_is_a_parse_error() {
        let err = InstrumentationConfig::from_json_str(r#"{"log_level": "loud"}"#).unwrap_err();
        assert_eq!(err.code(), "CFG-1001");
    }

    #[test]
    fn wrapped_driver_name_is_rejected() {
        let err = InstrumentationConfig::from_json_str(r#"{"driver_name": "sqlite"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::DriverName(_)));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = InstrumentationConfig::from_json_str(r#"{"buffer_capacity": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::BufferCapacity));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = InstrumentationConfig::from_json_str("{").unwrap_err();
        assert_eq!(err.code(), "CFG-1001");
    }
}
