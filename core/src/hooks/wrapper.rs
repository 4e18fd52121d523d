use std::sync::Arc;

use super::{CallContext, Hooks, Invocation};
use crate::driver::{Driver, DriverConnection, DriverResult, Rows};
use crate::value::SqlValue;

/// A driver whose connections report every statement to a [`Hooks`] value.
pub struct HookedDriver {
    inner: Arc<dyn Driver>,
    hooks: Arc<dyn Hooks>,
}

impl HookedDriver {
    pub fn new(inner: Arc<dyn Driver>, hooks: Arc<dyn Hooks>) -> Self {
        Self { inner, hooks }
    }
}

impl Driver for HookedDriver {
    fn open(&self, dsn: &str) -> DriverResult<Box<dyn DriverConnection>> {
        let inner = self.inner.open(dsn)?;
        Ok(Box::new(HookedConnection {
            inner,
            hooks: Arc::clone(&self.hooks),
        }))
    }
}

pub struct HookedConnection {
    inner: Box<dyn DriverConnection>,
    hooks: Arc<dyn Hooks>,
}

impl HookedConnection {
    pub fn new(inner: Box<dyn DriverConnection>, hooks: Arc<dyn Hooks>) -> Self {
        Self { inner, hooks }
    }

    fn observe<T>(
        &mut self,
        query: &str,
        args: &[SqlValue],
        run: impl FnOnce(&mut dyn DriverConnection) -> DriverResult<T>,
    ) -> DriverResult<T> {
        let invocation = Invocation::new(query, args);
        let mut ctx = CallContext::new();
        self.hooks.before(&mut ctx, &invocation);
        match run(self.inner.as_mut()) {
            Ok(value) => {
                self.hooks.after(ctx, &invocation);
                Ok(value)
            }
            Err(err) => {
                self.hooks.on_error(ctx, &*err, &invocation);
                Err(err)
            }
        }
    }
}

impl DriverConnection for HookedConnection {
    fn execute(&mut self, query: &str, args: &[SqlValue]) -> DriverResult<u64> {
        self.observe(query, args, |conn| conn.execute(query, args))
    }

    fn query(&mut self, query: &str, args: &[SqlValue]) -> DriverResult<Rows> {
        self.observe(query, args, |conn| conn.query(query, args))
    }

    fn execute_batch(&mut self, sql: &str) -> DriverResult<()> {
        self.observe(sql, &[], |conn| conn.execute_batch(sql))
    }

    fn ping(&mut self) -> DriverResult<()> {
        self.inner.ping()
    }
}
