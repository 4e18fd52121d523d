//! Driver abstraction shared by concrete drivers and the hook wrapper.
//!
//! A [`Driver`] turns a data source name into a [`DriverConnection`]; the
//! connection executes statements with positional [`SqlValue`] arguments.
//! Errors are the driver's own values, boxed, so a wrapper can hand them back
//! to the caller untouched.

pub mod sqlite;

use std::error::Error;

use crate::value::SqlValue;

pub use sqlite::SqliteDriver;

/// The error a driver raised, carried as-is through every layer.
pub type DriverError = Box<dyn Error + Send + Sync + 'static>;

pub type DriverResult<T> = Result<T, DriverError>;

pub trait Driver: Send + Sync {
    fn open(&self, dsn: &str) -> DriverResult<Box<dyn DriverConnection>>;
}

pub trait DriverConnection: Send {
    /// Run a statement and return the number of affected rows.
    fn execute(&mut self, query: &str, args: &[SqlValue]) -> DriverResult<u64>;

    /// Run a statement and buffer every row it yields.
    fn query(&mut self, query: &str, args: &[SqlValue]) -> DriverResult<Rows>;

    /// Run one or more argument-free statements separated by semicolons.
    fn execute_batch(&mut self, sql: &str) -> DriverResult<()>;

    /// Cheap liveness check used by pools.
    fn ping(&mut self) -> DriverResult<()>;
}

/// A fully buffered result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl Rows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[SqlValue]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}
