use std::error::Error;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use log::Level;

use super::{CallContext, Hooks, Invocation};
use crate::fields::FieldSet;
use crate::logging::{FacadeSink, LogRecord, LogSink, Phase};

pub const BEFORE_MESSAGE: &str = "before sql exec";
pub const AFTER_MESSAGE: &str = "after sql exec";
pub const ERROR_MESSAGE: &str = "sql exec failed";

/// Hook that turns each statement phase into a structured log record.
///
/// With no sink configured every phase is a no-op. The sink is shared and
/// the duration flag is fixed at construction, so one instance serves any
/// number of concurrent statements.
#[derive(Clone)]
pub struct LoggingHook {
    sink: Option<Arc<dyn LogSink>>,
    measure_duration: bool,
}

impl LoggingHook {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink: Some(sink),
            measure_duration: true,
        }
    }

    /// Log through the `log` facade's global logger.
    pub fn from_facade() -> Self {
        Self::new(Arc::new(FacadeSink))
    }

    pub fn disabled() -> Self {
        Self {
            sink: None,
            measure_duration: false,
        }
    }

    pub fn with_duration(mut self, measure_duration: bool) -> Self {
        self.measure_duration = measure_duration;
        self
    }

    pub fn measures_duration(&self) -> bool {
        self.measure_duration
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    fn emit(sink: &dyn LogSink, level: Level, phase: Phase, message: &str, fields: FieldSet) {
        let record = LogRecord::new(level, phase, message, fields);
        let _ = panic::catch_unwind(AssertUnwindSafe(|| sink.log(record)));
    }
}

impl Hooks for LoggingHook {
    fn before(&self, ctx: &mut CallContext, invocation: &Invocation<'_>) {
        let Some(sink) = self.sink.as_deref() else {
            return;
        };
        let fields = FieldSet::for_invocation(invocation);
        Self::emit(sink, Level::Info, Phase::Before, BEFORE_MESSAGE, fields);
        if self.measure_duration {
            ctx.mark_started(Instant::now());
        }
    }

    fn after(&self, ctx: CallContext, invocation: &Invocation<'_>) {
        let Some(sink) = self.sink.as_deref() else {
            return;
        };
        let fields = FieldSet::for_invocation(invocation).with_duration(ctx.elapsed());
        Self::emit(sink, Level::Info, Phase::After, AFTER_MESSAGE, fields);
    }

    fn on_error(
        &self,
        _ctx: CallContext,
        error: &(dyn Error + 'static),
        invocation: &Invocation<'_>,
    ) {
        let Some(sink) = self.sink.as_deref() else {
            return;
        };
        let fields = FieldSet::for_invocation(invocation).with_error(Some(error));
        Self::emit(sink, Level::Error, Phase::Error, ERROR_MESSAGE, fields);
    }
}
