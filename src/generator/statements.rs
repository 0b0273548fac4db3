//! Text templates for the atomic statements a decomposition emits.

use crate::config::WindowMode;

pub fn insert_select(out_stream: &str, select_body: &str) -> String {
    format!("INSERT INTO {}\n{}", out_stream, select_body)
}

pub fn create_window(window: &str, func: &str, mode: WindowMode, base_event_type: &str) -> String {
    match mode {
        WindowMode::Paper => format!("CREATE WINDOW {}#{}", window, func),
        WindowMode::Esper => format!("CREATE WINDOW {}.win:{} as {}", window, func, base_event_type),
    }
}

pub fn insert_all(out_stream: &str, in_stream: &str) -> String {
    insert_select(out_stream, &format!("SELECT *\nFROM {}", in_stream))
}

pub fn join(out_stream: &str, left: &str, right: &str) -> String {
    insert_select(out_stream, &format!("SELECT *\nFROM {}, {}", left, right))
}

pub fn filter(out_stream: &str, in_stream: &str, cond: &str) -> String {
    insert_select(
        out_stream,
        &format!("SELECT *\nFROM {}\nWHERE {}", in_stream, cond),
    )
}

pub fn project(out_stream: &str, in_stream: &str, select_list: &str, group_by: Option<&str>) -> String {
    let mut body = format!("SELECT {}\nFROM {}", select_list, in_stream);
    if let Some(group_by) = group_by {
        body.push_str("\nGROUP BY ");
        body.push_str(group_by);
    }
    insert_select(out_stream, &body)
}

pub fn pattern(out_stream: &str, pattern: &str) -> String {
    insert_select(out_stream, &format!("SELECT *\nFROM PATTERN {}", pattern))
}

/// Drop a leading `INSERT INTO <name>` line, leaving the bare `SELECT`.
pub fn strip_insert_into(statement: &str) -> Option<String> {
    let (first, rest) = statement.split_once('\n')?;
    if first.trim_start().to_ascii_uppercase().starts_with("INSERT INTO ") {
        Some(rest.to_string())
    } else {
        None
    }
}

/// Replace the target of a leading `INSERT INTO <name>` line.
pub fn retarget_insert_into(statement: &str, target: &str) -> Option<String> {
    let rest = strip_insert_into(statement)?;
    Some(insert_select(target, &rest))
}
