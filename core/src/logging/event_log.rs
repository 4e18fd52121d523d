use r2d2::Pool;
use r2d2_sqlite::rusqlite::{params, Connection};
use r2d2_sqlite::SqliteConnectionManager;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{LogRecord, LogSink};
use crate::errors::SinkError;

pub const EVENT_LOG_MODULE: &str = "sql.hook";

/// Append one row to the `event_log` table.
pub fn log_event(
    conn: &Connection,
    level: &str,
    code: Option<&str>,
    module: &str,
    message: &str,
    data: Option<Value>,
) -> rusqlite::Result<()> {
    let id = Uuid::new_v4().to_string();
    let ts = OffsetDateTime::now_utc().unix_timestamp();
    let data_str = data.map(|v| v.to_string());
    conn.execute(
        "INSERT INTO event_log (id, ts, level, code, module, message, data) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![id, ts, level, code, module, message, data_str],
    )?;
    Ok(())
}

/// Persists hook records in the `event_log` table of a separate SQLite
/// database. It talks to rusqlite directly so its own inserts never pass
/// through a hooked connection.
#[derive(Clone)]
pub struct EventLogSink {
    pool: Pool<SqliteConnectionManager>,
}

impl EventLogSink {
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Self {
        Self { pool }
    }
}

impl LogSink for EventLogSink {
    fn log(&self, record: LogRecord) -> Result<(), SinkError> {
        let conn = self
            .pool
            .get()
            .map_err(|err| SinkError::Storage(err.to_string()))?;
        let level = record.level.as_str().to_ascii_lowercase();
        log_event(
            &conn,
            &level,
            Some(record.phase.code()),
            EVENT_LOG_MODULE,
            &record.message,
            Some(record.fields.to_json()),
        )
        .map_err(|err| SinkError::Storage(err.to_string()))
    }
}
