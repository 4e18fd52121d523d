use log::kv::Value;
use log::Record;

use super::{LogRecord, LogSink};
use crate::errors::SinkError;
use crate::fields::FieldValue;

pub const FACADE_TARGET: &str = "sqlhook";

/// Forwards records to whatever logger the process installed behind the
/// `log` facade, with each field as a structured key/value pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct FacadeSink;

/// Flatten field values to the strings handed to `log`'s key/value API.
pub(crate) fn render_fields(record: &LogRecord) -> Vec<(&'static str, String)> {
    record
        .fields
        .iter()
        .map(|(key, value)| {
            let rendered = match value {
                FieldValue::Text(s) | FieldValue::Error(s) => s.clone(),
                FieldValue::Duration(d) => format!("{d:?}"),
                args @ FieldValue::Args(_) => args.to_json().to_string(),
            };
            (key, rendered)
        })
        .collect()
}

impl LogSink for FacadeSink {
    fn log(&self, record: LogRecord) -> Result<(), SinkError> {
        let logger = log::logger();
        let rendered = render_fields(&record);
        let kvs: Vec<(&str, Value<'_>)> = rendered
            .iter()
            .map(|(key, value)| (*key, Value::from(value.as_str())))
            .collect();
        let kvs = kvs.as_slice();
        logger.log(
            &Record::builder()
                .level(record.level)
                .target(FACADE_TARGET)
                .module_path(Some(module_path!()))
                .args(format_args!("{}", record.message))
                .key_values(&kvs)
                .build(),
        );
        Ok(())
    }
}
