//! Field sets attached to every hook log record.
//!
//! A record always starts with `query`. `args`, `duration` and `error` are
//! only present when there is something to report, so a missing duration
//! never reads as a zero-length one.

use std::error::Error;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::hooks::Invocation;
use crate::value::SqlValue;

pub const QUERY: &str = "query";
pub const ARGS: &str = "args";
pub const DURATION: &str = "duration";
pub const ERROR: &str = "error";

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Args(Vec<SqlValue>),
    Duration(Duration),
    Error(String),
}

impl FieldValue {
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) | Self::Error(s) => Value::String(s.clone()),
            Self::Args(args) => serde_json::to_value(args).unwrap_or(Value::Null),
            Self::Duration(d) => Value::String(format!("{d:?}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    fields: Vec<(&'static str, FieldValue)>,
}

impl FieldSet {
    pub fn for_invocation(invocation: &Invocation<'_>) -> Self {
        let mut fields = vec![(QUERY, FieldValue::Text(invocation.query.to_string()))];
        if !invocation.args.is_empty() {
            fields.push((ARGS, FieldValue::Args(invocation.args.to_vec())));
        }
        Self { fields }
    }

    pub fn with_duration(mut self, duration: Option<Duration>) -> Self {
        if let Some(d) = duration {
            self.fields.push((DURATION, FieldValue::Duration(d)));
        }
        self
    }

    pub fn with_error(mut self, error: Option<&(dyn Error + 'static)>) -> Self {
        if let Some(err) = error {
            self.fields.push((ERROR, FieldValue::Error(err.to_string())));
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.fields.iter().map(|(k, _)| *k).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_json()))
            .collect();
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql_args;
    use serde_json::json;

    #[test]
    fn empty_args_are_left_out() {
        let fields = FieldSet::for_invocation(&Invocation::new("SELECT * FROM t", &[]));
        assert_eq!(fields.keys(), vec![QUERY]);
    }

    #[test]
    fn args_keep_their_order() {
        let args = sql_args![3i64, "b", 1i64];
        let fields = FieldSet::for_invocation(&Invocation::new("q", &args));
        assert_eq!(fields.keys(), vec![QUERY, ARGS]);
        assert_eq!(fields.get(ARGS), Some(&FieldValue::Args(args.clone())));
    }

    #[test]
    fn duration_and_error_only_when_present() {
        let inv = Invocation::new("q", &[]);
        let none = FieldSet::for_invocation(&inv).with_duration(None).with_error(None);
        assert_eq!(none.len(), 1);

        let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let some = FieldSet::for_invocation(&inv)
            .with_duration(Some(Duration::ZERO))
            .with_error(Some(&err as &(dyn Error + 'static)));
        assert_eq!(some.keys(), vec![QUERY, DURATION, ERROR]);
        assert_eq!(some.get(DURATION), Some(&FieldValue::Duration(Duration::ZERO)));
    }

    #[test]
    fn renders_json_object() {
        let args = sql_args![42i64];
        let fields = FieldSet::for_invocation(&Invocation::new(
            "INSERT INTO t (score) VALUES (?)",
            &args,
        ))
        .with_duration(Some(Duration::from_millis(5)));
        assert_eq!(
            fields.to_json(),
            json!({
                "query": "INSERT INTO t (score) VALUES (?)",
                "args": [42],
                "duration": "5ms",
            })
        );
    }
}
