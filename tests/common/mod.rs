#![allow(dead_code)]

use epldecomp::{Decomposer, Program, WindowMode};
use std::collections::HashSet;
use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub fn decomposer(mode: WindowMode) -> Decomposer {
    init_test_env();
    Decomposer::builder()
        .with_window_mode(mode)
        .build()
        .expect("default configuration is valid")
}

/// Queries covering every source shape and clause the parser accepts.
pub const CORPUS: &[&str] = &[
    "SELECT camera FROM DetectMov",
    "SELECT * FROM DetectMov WHERE camera = 'R2'",
    "SELECT * FROM S(camera='a, b')",
    "SELECT * FROM A#time(20 seconds), B#time(20 seconds)",
    "SELECT * FROM A, B, C",
    "SELECT A.x, B.y FROM A(x > 1)#length(5), B WHERE A.x = B.y",
    "SELECT * FROM PATTERN [every x=DetectMov -> y=BaseThermRead(temp>40 AND humid<20)]",
    "SELECT * FROM PATTERN [every a=A], B#length(2) WHERE a.id = B.id",
    "SELECT therm, avg(temp) FROM BaseThermRead GROUP BY therm",
    "INSERT INTO Out SELECT therm, avg(temp) as avgTemp FROM S GROUP BY therm HAVING avgTemp > 40",
    "SELECT sensor, count(*) as n FROM ErrorEvt WHERE sensor != 'x' GROUP BY sensor HAVING n > 3",
    "INSERT INTO Hot SELECT * FROM BaseThermRead(temp > 40)#time(1 min) WHERE humid < 20",
];

/// Names every statement reads, taken from its FROM line.
pub fn read_streams(statement: &str) -> Vec<String> {
    statement
        .lines()
        .find_map(|line| line.strip_prefix("FROM "))
        .filter(|from| !from.starts_with("PATTERN"))
        .map(|from| {
            from.trim_end_matches(';')
                .split(", ")
                .map(|s| {
                    s.split(|c: char| c == '(' || c == ' ')
                        .next()
                        .unwrap_or_default()
                        .to_string()
                })
                .collect()
        })
        .unwrap_or_default()
}

/// No statement reads a generated stream before the statement producing it.
pub fn assert_topologically_valid(program: &Program) {
    let generated: HashSet<&str> = program.lineage().keys().map(String::as_str).collect();
    let mut produced: HashSet<String> = HashSet::new();

    for statement in program.statements() {
        for stream in read_streams(statement) {
            if generated.contains(stream.as_str()) {
                assert!(
                    produced.contains(&stream),
                    "{} is read before it is produced in:\n{}",
                    stream,
                    program.to_script()
                );
            }
        }
        if let Some(target) = written_stream(statement) {
            produced.insert(target);
        }
    }
}

pub fn written_stream(statement: &str) -> Option<String> {
    let first = statement.lines().next()?;
    if let Some(target) = first.strip_prefix("INSERT INTO ") {
        return Some(target.trim_end_matches(';').to_string());
    }
    first
        .strip_prefix("CREATE WINDOW ")
        .and_then(|rest| rest.split(|c: char| c == '#' || c == '.').next())
        .map(str::to_string)
}
