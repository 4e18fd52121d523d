//! Registers a driver wrapped with hooks under a new name.
//!
//! The wrapped driver can never take over the name of the driver it wraps:
//! names are write-once, so application code opts in by switching the driver
//! name it connects with and nothing else.

use std::sync::Arc;

use crate::driver::Driver;
use crate::errors::RegistryError;
use crate::hooks::{HookedDriver, Hooks};
use crate::registry::DriverRegistry;

pub fn wrap(driver: Arc<dyn Driver>, hooks: Arc<dyn Hooks>) -> Arc<dyn Driver> {
    Arc::new(HookedDriver::new(driver, hooks))
}

pub fn register_hooked(
    registry: &DriverRegistry,
    name: &str,
    driver: Arc<dyn Driver>,
    hooks: Arc<dyn Hooks>,
) -> Result<(), RegistryError> {
    registry.register(name, wrap(driver, hooks))
}

/// Register into the process-wide registry, once, at startup.
///
/// # Panics
///
/// Panics if `name` is already registered. A second registration would leave
/// two driver configurations answering to one name, so startup must stop.
pub fn install(name: &str, driver: Arc<dyn Driver>, hooks: Arc<dyn Hooks>) {
    if let Err(err) = register_hooked(DriverRegistry::global(), name, driver, hooks) {
        panic!("sqlhook: {err} [{}] {}", err.code(), err.explain());
    }
}
