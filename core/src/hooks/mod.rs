//! Statement lifecycle hooks.
//!
//! Every statement run through a [`HookedConnection`] goes through
//! `before` and then exactly one of `after` or `on_error`. The
//! [`CallContext`] created for that statement travels with it between the
//! phases, so hooks never keep per-call state on `self`.

mod logging;
mod wrapper;

use std::error::Error;
use std::time::Instant;

use uuid::Uuid;

use crate::value::SqlValue;

pub use logging::LoggingHook;
pub use wrapper::{HookedConnection, HookedDriver};

/// One statement execution as seen by the hooks.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub query: &'a str,
    pub args: &'a [SqlValue],
}

impl<'a> Invocation<'a> {
    pub fn new(query: &'a str, args: &'a [SqlValue]) -> Self {
        Self { query, args }
    }
}

/// Per-execution carrier handed from `before` to the terminal phase.
#[derive(Debug)]
pub struct CallContext {
    call_id: Uuid,
    started_at: Option<Instant>,
}

impl CallContext {
    pub fn new() -> Self {
        Self {
            call_id: Uuid::new_v4(),
            started_at: None,
        }
    }

    pub fn call_id(&self) -> Uuid {
        self.call_id
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn mark_started(&mut self, at: Instant) {
        self.started_at = Some(at);
    }

    /// Time since `mark_started`, or `None` when no start was recorded.
    pub fn elapsed(&self) -> Option<std::time::Duration> {
        self.started_at.map(|start| start.elapsed())
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer invoked around every statement a hooked connection runs.
///
/// `after` and `on_error` take the context by value: it is consumed by
/// whichever terminal phase runs. `on_error` only borrows the driver error,
/// the caller always receives the original value.
pub trait Hooks: Send + Sync {
    fn before(&self, ctx: &mut CallContext, invocation: &Invocation<'_>);

    fn after(&self, ctx: CallContext, invocation: &Invocation<'_>);

    fn on_error(
        &self,
        ctx: CallContext,
        error: &(dyn Error + 'static),
        invocation: &Invocation<'_>,
    );
}
