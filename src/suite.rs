//! Fixed fixtures of the six atomic statement shapes.

use crate::ast::{PatternSource, SelectQuery, StreamSource};
use crate::config::SchemaConfig;
use crate::generator::to_text;
use serde::Serialize;

/// One atomic statement shape, rendered as deployable EPL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AtomicCase {
    pub name: String,
    pub statements: Vec<String>,
    pub input_streams: Vec<String>,
    pub notes: String,
}

impl AtomicCase {
    fn new(name: &str, statements: Vec<String>, input_streams: &[&str], notes: &str) -> Self {
        Self {
            name: name.to_string(),
            statements,
            input_streams: input_streams.iter().map(|s| s.to_string()).collect(),
            notes: notes.to_string(),
        }
    }
}

pub const HAVING_AGGREGATE_STREAM: &str = "AggregatedStream";

pub fn projection_case(stream: &str, field: &str) -> AtomicCase {
    let query = SelectQuery::new(field, vec![StreamSource::new(stream).into()]);
    AtomicCase::new("projection", vec![to_text(&query)], &[stream], "projection of one field")
}

pub fn selection_case(stream: &str, cond: &str) -> AtomicCase {
    let query = SelectQuery::new("*", vec![StreamSource::new(stream).into()]).with_where(cond);
    AtomicCase::new("selection", vec![to_text(&query)], &[stream], "WHERE selection")
}

pub fn window_join_case(left: &str, right: &str, window: &str) -> AtomicCase {
    let query = SelectQuery::new(
        "*",
        vec![
            StreamSource::new(left).with_window(window).into(),
            StreamSource::new(right).with_window(window).into(),
        ],
    );
    AtomicCase::new(
        "window_join",
        vec![to_text(&query)],
        &[left, right],
        "join of two inline windows",
    )
}

/// `pattern` defaults to `every` left followed by a hot, dry right event.
pub fn pattern_case(left: &str, right: &str, pattern: Option<&str>) -> AtomicCase {
    let pattern = match pattern {
        Some(p) => p.to_string(),
        None => format!("[EVERY x={} -> y={}(temp>40 AND humid<20)]", left, right),
    };
    let query = SelectQuery::new("*", vec![PatternSource::new(&pattern).into()]);
    AtomicCase::new("pattern", vec![to_text(&query)], &[left, right], "PATTERN source")
}

pub fn group_by_case(stream: &str) -> AtomicCase {
    let query = SelectQuery::new("therm, avg(temp)", vec![StreamSource::new(stream).into()])
        .with_group_by("therm");
    AtomicCase::new("group_by", vec![to_text(&query)], &[stream], "GROUP BY with an aggregate")
}

pub fn having_case(stream: &str) -> AtomicCase {
    let aggregate = SelectQuery::new("therm, avg(temp) as avgTemp", vec![StreamSource::new(stream).into()])
        .with_group_by("therm")
        .with_insert_into(HAVING_AGGREGATE_STREAM);
    let post_filter = SelectQuery::new("*", vec![StreamSource::new(HAVING_AGGREGATE_STREAM).into()])
        .with_where("avgTemp > 40");
    AtomicCase::new(
        "having",
        vec![to_text(&aggregate), to_text(&post_filter)],
        &[stream],
        "HAVING as a WHERE over the aggregate stream",
    )
}

/// One case per atomic shape over the schema's first three streams.
pub fn build_atomic_suite(schema: &SchemaConfig) -> Vec<AtomicCase> {
    let a = schema.streams.first().map(String::as_str).unwrap_or("S0");
    let b = schema.streams.get(1).map(String::as_str).unwrap_or(a);
    let c = schema.streams.get(2).map(String::as_str).unwrap_or(b);
    let field = schema.fields.first().map(String::as_str).unwrap_or("camera");

    vec![
        projection_case(a, field),
        selection_case(a, &format!("{} = 'R2'", field)),
        window_join_case(c, b, "time(20 seconds)"),
        pattern_case(a, b, None),
        group_by_case(b),
        having_case(b),
    ]
}
