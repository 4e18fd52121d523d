use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use sqlhook_core::db::{init_event_log, open_pool, EventLogPool};
use sqlhook_core::logging::{BufferedSink, EventLogSink, FacadeSink, LogSink};
use sqlhook_core::registrar::install;
use sqlhook_core::{sql_args, DriverRegistry, InstrumentationConfig, LoggingHook, SqliteDriver};
use time::OffsetDateTime;

const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

fn workspace_dir() -> PathBuf {
    if let Some(proj) = ProjectDirs::from("com", "SqlHook", "SqlHook") {
        proj.data_dir().to_path_buf()
    } else {
        std::env::temp_dir().join("SqlHook")
    }
}

fn load_config() -> Result<InstrumentationConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config {path}"))?;
            Ok(InstrumentationConfig::from_json_str(&raw)?)
        }
        None => Ok(InstrumentationConfig::default()),
    }
}

fn print_events(events: &EventLogPool) -> Result<()> {
    let conn = events.get()?;
    let mut stmt =
        conn.prepare("SELECT level, code, message, data FROM event_log ORDER BY ts DESC, rowid DESC LIMIT 20")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
        ))
    })?;
    for row in rows {
        let (level, code, message, data) = row?;
        println!(
            "{level:<5} {:<8} {message} {}",
            code.unwrap_or_default(),
            data.unwrap_or_default()
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let config = load_config()?;
    let dir = workspace_dir();

    env_logger::Builder::new()
        .filter_level(config.log_level)
        .try_init()
        .context("failed to install logger")?;

    let (sink, buffered, events): (
        Arc<dyn LogSink>,
        Option<Arc<BufferedSink>>,
        Option<EventLogPool>,
    ) = if config.event_log {
        let events = init_event_log(dir.clone())?;
        let buffered = Arc::new(BufferedSink::new(
            Arc::new(EventLogSink::new(events.clone())),
            config.buffer_capacity,
        )?);
        (buffered.clone(), Some(buffered), Some(events))
    } else {
        (Arc::new(FacadeSink), None, None)
    };
    let hook = LoggingHook::new(sink).with_duration(config.measure_duration);
    install(&config.driver_name, Arc::new(SqliteDriver), Arc::new(hook));

    let dsn = dir.join("demo.db");
    let dsn = dsn
        .to_str()
        .ok_or_else(|| anyhow!("data directory is not valid UTF-8"))?;
    let pool = open_pool(DriverRegistry::global(), &config.driver_name, dsn, 4)?;
    let mut conn = pool.get()?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS test_table (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            score INTEGER NOT NULL,
            create_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            update_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .map_err(|err| anyhow!(err))?;

    let seed = i64::from(OffsetDateTime::now_utc().nanosecond());
    for offset in 0..3 {
        conn.execute(
            "INSERT INTO test_table (score) VALUES (?)",
            &sql_args![seed + offset],
        )
        .map_err(|err| anyhow!(err))?;
    }

    let rows = conn
        .query("SELECT id, score, create_at, update_at FROM test_table", &[])
        .map_err(|err| anyhow!(err))?;
    for row in rows.iter() {
        println!(
            "- id: {}, score: {}, createAt: {}, updateAt: {}",
            row[0], row[1], row[2], row[3]
        );
    }

    if let Err(err) = conn.query("SELECT * FROM missing_table", &[]) {
        println!("expected failure surfaced unchanged: {err}");
    }

    if let Some(buffered) = &buffered {
        if !buffered.flush(FLUSH_TIMEOUT) {
            eprintln!("event log still has {} pending records", buffered.pending());
        }
    }
    if let Some(events) = events {
        print_events(&events)?;
    }
    Ok(())
}
