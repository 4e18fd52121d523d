//! SQL statement instrumentation for registered database drivers.
//!
//! A driver is wrapped with a set of lifecycle hooks and registered under a
//! new name; connections opened with that name report every statement to
//! the hooks before and after it runs:
//! - [`driver`] defines the driver traits and the rusqlite-backed driver.
//! - [`registry`] holds the write-once name → driver table.
//! - [`registrar`] composes a driver with hooks and registers the result.
//! - [`hooks`] has the lifecycle contract, the wrapper and [`LoggingHook`].
//! - [`fields`] builds the key/value set attached to each record.
//! - [`logging`] provides the sinks records are written to.
//! - [`db`] opens r2d2 pools over registered drivers and the event log.
//! - [`config`] and [`errors`] carry settings and the error catalogue.

pub mod config;
pub mod db;
pub mod driver;
pub mod errors;
pub mod fields;
pub mod hooks;
pub mod logging;
pub mod registrar;
pub mod registry;
pub mod value;

pub use config::InstrumentationConfig;
pub use driver::{Driver, DriverConnection, DriverError, DriverResult, Rows, SqliteDriver};
pub use errors::{ConfigError, ConnectError, RegistryError, SinkError};
pub use hooks::{CallContext, HookedDriver, Hooks, Invocation, LoggingHook};
pub use logging::{BufferedSink, CaptureSink, EventLogSink, FacadeSink, LogRecord, LogSink};
pub use registry::DriverRegistry;
pub use value::SqlValue;
