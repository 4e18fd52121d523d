use rusqlite::{params_from_iter, Connection};

use super::{Driver, DriverConnection, DriverResult, Rows};
use crate::value::SqlValue;

/// Name the SQLite driver is registered under by default.
pub const SQLITE_DRIVER_NAME: &str = "sqlite";

/// SQLite driver backed by rusqlite. The DSN is a file path, `:memory:`, or
/// a `file:` URI.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

impl Driver for SqliteDriver {
    fn open(&self, dsn: &str) -> DriverResult<Box<dyn DriverConnection>> {
        let conn = Connection::open(dsn)?;
        Ok(Box::new(SqliteConnection { conn }))
    }
}

pub struct SqliteConnection {
    conn: Connection,
}

impl DriverConnection for SqliteConnection {
    fn execute(&mut self, query: &str, args: &[SqlValue]) -> DriverResult<u64> {
        let mut stmt = self.conn.prepare_cached(query)?;
        let changed = stmt.execute(params_from_iter(args.iter()))?;
        Ok(changed as u64)
    }

    fn query(&mut self, query: &str, args: &[SqlValue]) -> DriverResult<Rows> {
        let mut stmt = self.conn.prepare_cached(query)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();
        let mut rows = stmt.query(params_from_iter(args.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                let value: rusqlite::types::Value = row.get(idx)?;
                cells.push(SqlValue::from(value));
            }
            out.push(cells);
        }
        Ok(Rows { columns, rows: out })
    }

    fn execute_batch(&mut self, sql: &str) -> DriverResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn ping(&mut self) -> DriverResult<()> {
        self.conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }
}
