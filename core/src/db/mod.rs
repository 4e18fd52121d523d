use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use r2d2::{ManageConnection, Pool};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::driver::{Driver, DriverConnection, DriverResult};
use crate::errors::ConnectError;
use crate::registry::DriverRegistry;

/// Pool of connections opened through a registered driver name.
pub type HookedPool = Pool<RegistryConnectionManager>;

/// Pool for the database that stores the `event_log` table.
pub type EventLogPool = Pool<SqliteConnectionManager>;

pub const EVENT_LOG_FILE: &str = "sqlhook-events.db";

/// r2d2 manager that opens connections the way application code does: by
/// driver name plus an opaque data source name.
pub struct RegistryConnectionManager {
    driver: Arc<dyn Driver>,
    dsn: String,
}

impl RegistryConnectionManager {
    pub fn new(registry: &DriverRegistry, driver_name: &str, dsn: &str) -> Result<Self, ConnectError> {
        let driver = registry
            .get(driver_name)
            .ok_or_else(|| ConnectError::UnknownDriver(driver_name.to_string()))?;
        Ok(Self {
            driver,
            dsn: dsn.to_string(),
        })
    }
}

impl ManageConnection for RegistryConnectionManager {
    type Connection = Box<dyn DriverConnection>;
    type Error = ConnectError;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        self.driver.open(&self.dsn).map_err(ConnectError::Driver)
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        conn.ping().map_err(ConnectError::Driver)
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

pub fn open_pool(
    registry: &DriverRegistry,
    driver_name: &str,
    dsn: &str,
    max_size: u32,
) -> Result<HookedPool> {
    let mgr = RegistryConnectionManager::new(registry, driver_name, dsn)?;
    let pool = Pool::builder()
        .max_size(max_size)
        .build(mgr)
        .with_context(|| format!("failed to open pool for driver {driver_name}"))?;
    Ok(pool)
}

/// Run `f` with a pooled connection on tokio's blocking pool.
///
/// Driver errors come back exactly as the driver raised them; pool and join
/// failures are boxed alongside them.
pub async fn run_blocking<T, F>(pool: &HookedPool, f: F) -> DriverResult<T>
where
    T: Send + 'static,
    F: FnOnce(&mut dyn DriverConnection) -> DriverResult<T> + Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        f(&mut **conn)
    })
    .await?
}

pub fn init_event_log(workspace_dir: PathBuf) -> Result<EventLogPool> {
    std::fs::create_dir_all(&workspace_dir)?;
    let db_path = workspace_dir.join(EVENT_LOG_FILE);
    let mgr = SqliteConnectionManager::file(&db_path);
    let pool = Pool::new(mgr)?;
    {
        let conn = pool.get()?;
        apply_migrations(&conn)?;
    }
    Ok(pool)
}

fn apply_migrations(conn: &Connection) -> Result<()> {
    let migrations: &[(&str, &str)] = &[(
        "0001_event_log.sql",
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../migrations/0001_event_log.sql"
        )),
    )];

    for (name, sql) in migrations {
        conn.execute_batch(sql)
            .with_context(|| format!("failed to apply migration {name}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::SqliteDriver;
    use crate::fields::{FieldValue, ARGS, DURATION};
    use crate::hooks::LoggingHook;
    use crate::logging::{CaptureSink, EventLogSink, LogSink, Phase};
    use crate::registrar::register_hooked;
    use crate::sql_args;
    use crate::value::SqlValue;
    use std::collections::HashMap;

    fn hooked_registry(sink: Arc<dyn LogSink>) -> DriverRegistry {
        let registry = DriverRegistry::with_defaults();
        register_hooked(
            &registry,
            "sqlite-log",
            Arc::new(SqliteDriver),
            Arc::new(LoggingHook::new(sink)),
        )
        .unwrap();
        registry
    }

    #[test]
    fn pool_for_unknown_driver_fails() {
        let registry = DriverRegistry::new();
        assert!(open_pool(&registry, "nope", ":memory:", 1).is_err());
    }

    #[test]
    fn pooled_connections_are_hooked() {
        let sink = Arc::new(CaptureSink::new());
        let registry = hooked_registry(sink.clone());
        let pool = open_pool(&registry, "sqlite-log", ":memory:", 2).unwrap();
        assert_eq!(pool.max_size(), 2);

        let mut conn = pool.get().unwrap();
        conn.query("SELECT 1", &[]).unwrap();
        // Pool health checks use ping, which is not logged.
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn async_callers_keep_records_paired() {
        let sink = Arc::new(CaptureSink::new());
        let registry = hooked_registry(sink.clone());
        let pool = open_pool(&registry, "sqlite-log", ":memory:", 4).unwrap();

        let mut tasks = Vec::new();
        for marker in 0..24i64 {
            let pool = pool.clone();
            tasks.push(tokio::spawn(async move {
                run_blocking(&pool, move |conn| conn.query("SELECT ?", &sql_args![marker])).await
            }));
        }
        for (marker, task) in tasks.into_iter().enumerate() {
            let rows = task.await.unwrap().unwrap();
            assert_eq!(rows.rows[0][0], SqlValue::Integer(marker as i64));
        }

        let mut phases: HashMap<i64, Vec<Phase>> = HashMap::new();
        for record in sink.records() {
            let Some(FieldValue::Args(args)) = record.fields.get(ARGS) else {
                panic!("every statement here has an argument");
            };
            if record.phase == Phase::After {
                assert!(record.fields.contains(DURATION));
            }
            phases.entry(args[0].as_i64().unwrap()).or_default().push(record.phase);
        }
        assert_eq!(phases.len(), 24);
        assert!(phases.values().all(|p| p == &vec![Phase::Before, Phase::After]));
    }

    #[tokio::test]
    async fn driver_error_survives_the_blocking_hop() {
        let registry = hooked_registry(Arc::new(CaptureSink::new()));
        let pool = open_pool(&registry, "sqlite-log", ":memory:", 1).unwrap();
        let err = run_blocking(&pool, |conn| conn.execute("INSERT INTO missing VALUES (1)", &[]))
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<rusqlite::Error>().is_some());
    }

    #[test]
    fn event_log_receives_hook_records() {
        let dir = tempfile::tempdir().unwrap();
        let events = init_event_log(dir.path().to_path_buf()).unwrap();
        let registry = hooked_registry(Arc::new(EventLogSink::new(events.clone())));

        let mut conn = registry.open("sqlite-log", ":memory:").unwrap();
        let _ = conn.execute("INSERT INTO missing VALUES (?)", &sql_args![1i64]);

        let codes: Vec<String> = {
            let conn = events.get().unwrap();
            let mut stmt = conn
                .prepare("SELECT code FROM event_log ORDER BY rowid")
                .unwrap();
            let rows = stmt.query_map([], |row| row.get(0)).unwrap();
            rows.map(Result::unwrap).collect()
        };
        assert_eq!(codes, vec!["SQL-1001", "SQL-5001"]);
    }

    #[test]
    fn migrations_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        init_event_log(dir.path().to_path_buf()).unwrap();
        init_event_log(dir.path().to_path_buf()).unwrap();
        assert!(dir.path().join(EVENT_LOG_FILE).exists());
    }
}
