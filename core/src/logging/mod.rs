//! Logging capability consumed by [`LoggingHook`](crate::hooks::LoggingHook).
//!
//! A [`LogSink`] receives owned [`LogRecord`]s. Sinks may fail; the hook
//! drops those failures so logging never changes a statement's outcome.
//! - [`FacadeSink`] forwards to the `log` crate with structured key/values.
//! - [`EventLogSink`] persists records in the `event_log` table.
//! - [`BufferedSink`] puts a bounded queue and a worker thread in front of
//!   another sink.
//! - [`CaptureSink`] keeps records in memory.

mod buffered;
mod event_log;
mod facade;

use std::sync::{Mutex, MutexGuard};

use log::Level;

use crate::errors::SinkError;
use crate::fields::FieldSet;

pub use buffered::BufferedSink;
pub use event_log::{log_event, EventLogSink, EVENT_LOG_MODULE};
pub use facade::{FacadeSink, FACADE_TARGET};

/// Statement phase a record was emitted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Before,
    After,
    Error,
}

impl Phase {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Before => "SQL-1001",
            Self::After => "SQL-1002",
            Self::Error => "SQL-5001",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: Level,
    pub phase: Phase,
    pub message: String,
    pub fields: FieldSet,
}

impl LogRecord {
    pub fn new(level: Level, phase: Phase, message: impl Into<String>, fields: FieldSet) -> Self {
        Self {
            level,
            phase,
            message: message.into(),
            fields,
        }
    }
}

pub trait LogSink: Send + Sync {
    fn log(&self, record: LogRecord) -> Result<(), SinkError>;
}

/// Keeps every record in memory, in arrival order.
#[derive(Debug, Default)]
pub struct CaptureSink {
    records: Mutex<Vec<LogRecord>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    pub fn take(&self) -> Vec<LogRecord> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock only loses the in-flight push.
    fn lock(&self) -> MutexGuard<'_, Vec<LogRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LogSink for CaptureSink {
    fn log(&self, record: LogRecord) -> Result<(), SinkError> {
        self.lock().push(record);
        Ok(())
    }
}
