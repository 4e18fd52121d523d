use thiserror::Error;

use crate::driver::DriverError;

/// Failures while mutating or reading the driver registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("sql driver {0:?} is already registered")]
    DuplicateDriver(String),
    #[error("sql driver name must not be blank")]
    InvalidName,
}

impl RegistryError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateDriver(_) => "REG-1001",
            Self::InvalidName => "REG-1003",
        }
    }

    pub fn explain(&self) -> &'static str {
        match self {
            Self::DuplicateDriver(_) => {
                "Driver names are write-once; register the hooked driver under a new name."
            }
            Self::InvalidName => "Driver names identify a driver at connection time and cannot be empty.",
        }
    }
}

/// Failures while opening a connection by driver name.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("sql driver {0:?} is not registered")]
    UnknownDriver(String),
    #[error("driver failed to open connection: {0}")]
    Driver(#[source] DriverError),
}

impl ConnectError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownDriver(_) => "CON-1001",
            Self::Driver(_) => "CON-1002",
        }
    }

    pub fn explain(&self) -> &'static str {
        match self {
            Self::UnknownDriver(_) => "The connection named a driver that was never registered.",
            Self::Driver(_) => "The underlying driver rejected the data source name.",
        }
    }
}

/// Failures reported by a log sink. The hook discards these.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("log buffer is full, record dropped")]
    Saturated,
    #[error("log sink is closed")]
    Closed,
    #[error("event log write failed: {0}")]
    Storage(String),
    #[error("failed to start log worker: {0}")]
    Spawn(#[from] std::io::Error),
}

impl SinkError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Saturated => "LOG-1001",
            Self::Closed => "LOG-1002",
            Self::Storage(_) => "LOG-1003",
            Self::Spawn(_) => "LOG-1004",
        }
    }

    pub fn explain(&self) -> &'static str {
        match self {
            Self::Saturated => "The buffered sink dropped a record instead of blocking the statement.",
            Self::Closed => "The sink worker has shut down and no longer accepts records.",
            Self::Storage(_) => "The event log table could not be written.",
            Self::Spawn(_) => "The operating system refused to start the log worker thread.",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid instrumentation config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("driver name {0:?} is reserved or blank")]
    DriverName(String),
    #[error("buffer capacity must be greater than zero")]
    BufferCapacity,
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "CFG-1001",
            Self::DriverName(_) => "CFG-1002",
            Self::BufferCapacity => "CFG-1003",
        }
    }

    pub fn explain(&self) -> &'static str {
        match self {
            Self::Parse(_) => "The configuration is not valid JSON for this schema.",
            Self::DriverName(_) => "The hooked driver needs its own name, distinct from the driver it wraps.",
            Self::BufferCapacity => "A zero-sized log buffer would drop every record.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(RegistryError::DuplicateDriver("x".into()).code(), "REG-1001");
        assert_eq!(RegistryError::InvalidName.code(), "REG-1003");
        assert_eq!(ConnectError::UnknownDriver("x".into()).code(), "CON-1001");
        assert_eq!(SinkError::Saturated.code(), "LOG-1001");
        assert_eq!(ConfigError::BufferCapacity.code(), "CFG-1003");
    }

    #[test]
    fn duplicate_message_names_the_driver() {
        let err = RegistryError::DuplicateDriver("sqlite".into());
        assert!(err.to_string().contains("\"sqlite\""));
        assert!(!err.explain().is_empty());
    }
}
