//! Runs in its own binary: `log` accepts one logger per process.

use std::sync::Mutex;

use log::kv::{self, Key, Value, VisitSource};
use log::{Level, LevelFilter, Log, Metadata, Record};
use sqlhook_core::fields::FieldSet;
use sqlhook_core::logging::{FacadeSink, LogSink, Phase, FACADE_TARGET};
use sqlhook_core::{sql_args, CallContext, Hooks, Invocation, LogRecord, LoggingHook};

static CAPTURED: Mutex<Vec<Vec<String>>> = Mutex::new(Vec::new());
static LOGGER: CapturingLogger = CapturingLogger;

struct CapturingLogger;

struct Pairs(Vec<String>);

impl<'kvs> VisitSource<'kvs> for Pairs {
    fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> Result<(), kv::Error> {
        self.0.push(format!("{key}={value}"));
        Ok(())
    }
}

impl Log for CapturingLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let mut pairs = Pairs(vec![format!(
            "{}|{}|{}",
            record.level(),
            record.target(),
            record.args()
        )]);
        record.key_values().visit(&mut pairs).unwrap();
        CAPTURED.lock().unwrap().push(pairs.0);
    }

    fn flush(&self) {}
}

fn take_sqlhook_records() -> Vec<Vec<String>> {
    let prefix = format!("|{FACADE_TARGET}|");
    let mut captured = CAPTURED.lock().unwrap();
    let records = captured
        .iter()
        .filter(|pairs| pairs[0].contains(&prefix))
        .cloned()
        .collect();
    captured.clear();
    records
}

#[test]
fn facade_sink_reaches_the_installed_logger_with_key_values() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Trace);

    let args = sql_args![42i64];
    let fields = FieldSet::for_invocation(&Invocation::new("INSERT INTO t (score) VALUES (?)", &args));
    FacadeSink
        .log(LogRecord::new(Level::Info, Phase::Before, "before sql exec", fields))
        .unwrap();

    assert_eq!(
        take_sqlhook_records(),
        vec![vec![
            "INFO|sqlhook|before sql exec".to_string(),
            "query=INSERT INTO t (score) VALUES (?)".to_string(),
            "args=[42]".to_string(),
        ]]
    );

    // The same path driven through the hook: the failure record carries the
    // driver error text under `error`.
    let hook = LoggingHook::from_facade().with_duration(false);
    let invocation = Invocation::new("SELECT * FROM missing", &[]);
    let mut ctx = CallContext::new();
    hook.before(&mut ctx, &invocation);
    let err = std::io::Error::other("no such table: missing");
    hook.on_error(ctx, &err, &invocation);

    let records = take_sqlhook_records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0][0], "INFO|sqlhook|before sql exec");
    assert_eq!(records[1][0], "ERROR|sqlhook|sql exec failed");
    assert_eq!(
        records[1][1..],
        [
            "query=SELECT * FROM missing".to_string(),
            "error=no such table: missing".to_string(),
        ]
    );
}
