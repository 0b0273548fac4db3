//! Event-processing engines the harness can execute statements on.

pub mod command;

pub use command::CommandEngine;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Scalar field value carried by an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

/// Field name -> value. Ordered so serialization is deterministic.
pub type Event = BTreeMap<String, Value>;

/// Input stream name -> events in arrival order.
pub type EventStreams = BTreeMap<String, Vec<Event>>;

/// Runs an ordered list of statements over input streams and returns the
/// events produced by the last statement.
pub trait Engine {
    fn name(&self) -> &str {
        "engine"
    }

    fn run(&self, statements: &[String], inputs: &EventStreams) -> anyhow::Result<Vec<Event>>;
}

impl<F> Engine for F
where
    F: Fn(&[String], &EventStreams) -> anyhow::Result<Vec<Event>>,
{
    fn run(&self, statements: &[String], inputs: &EventStreams) -> anyhow::Result<Vec<Event>> {
        self(statements, inputs)
    }
}

/// Build an event from `(field, value)` pairs.
pub fn event<I, K, V>(fields: I) -> Event
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    fields
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
