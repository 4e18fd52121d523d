//! Name → driver table used when opening connections.
//!
//! Names are write-once. The process-wide table lives behind
//! [`DriverRegistry::global`]; tests build their own with
//! [`DriverRegistry::new`] so they never touch shared state.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::driver::sqlite::SQLITE_DRIVER_NAME;
use crate::driver::{Driver, DriverConnection, SqliteDriver};
use crate::errors::{ConnectError, RegistryError};

#[derive(Default)]
pub struct DriverRegistry {
    drivers: RwLock<HashMap<String, Arc<dyn Driver>>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that already knows the built-in `"sqlite"` driver.
    pub fn with_defaults() -> Self {
        let mut drivers: HashMap<String, Arc<dyn Driver>> = HashMap::new();
        drivers.insert(SQLITE_DRIVER_NAME.to_string(), Arc::new(SqliteDriver));
        Self {
            drivers: RwLock::new(drivers),
        }
    }

    pub fn global() -> &'static DriverRegistry {
        static GLOBAL: OnceLock<DriverRegistry> = OnceLock::new();
        GLOBAL.get_or_init(DriverRegistry::with_defaults)
    }

    pub fn register(&self, name: &str, driver: Arc<dyn Driver>) -> Result<(), RegistryError> {
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidName);
        }
        let mut drivers = self
            .drivers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if drivers.contains_key(name) {
            return Err(RegistryError::DuplicateDriver(name.to_string()));
        }
        drivers.insert(name.to_string(), driver);
        log::debug!(target: "sqlhook", "registered sql driver {name:?}");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Driver>> {
        self.drivers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .drivers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Open a connection with the driver registered as `name`, handing it
    /// `dsn` unchanged.
    pub fn open(&self, name: &str, dsn: &str) -> Result<Box<dyn DriverConnection>, ConnectError> {
        let driver = self
            .get(name)
            .ok_or_else(|| ConnectError::UnknownDriver(name.to_string()))?;
        driver.open(dsn).map_err(ConnectError::Driver)
    }
}
