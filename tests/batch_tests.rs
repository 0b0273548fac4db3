mod common;

use common::decomposer;
use epldecomp::batch::{decompose_jsonl_file, DecompositionRecord};
use epldecomp::{DecompositionError, WindowMode};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_jsonl_file_round() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("queries.jsonl");
    let output = dir.path().join("nested").join("decomposed.jsonl");
    fs::write(
        &input,
        concat!(
            "{\"query\": \"SELECT camera FROM DetectMov\"}\n",
            "\n",
            "{\"query\": \"INSERT INTO Out SELECT therm, avg(temp) as avgTemp FROM S GROUP BY therm HAVING avgTemp > 40\"}\n",
            "{\"query\": \"SELECT * FROM A#time(20 seconds), B#time(20 seconds)\"}\n",
        ),
    )
    .unwrap();

    let count = decompose_jsonl_file(&input, &output, &decomposer(WindowMode::Esper)).unwrap();
    assert_eq!(count, 3);

    let records: Vec<DecompositionRecord> = fs::read_to_string(&output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].query, "SELECT camera FROM DetectMov");
    assert_eq!(records[1].decomposed.len(), 2);
    assert_eq!(records[1].decomposed[1], "SELECT *\nFROM Out\nWHERE avgTemp > 40;");
    assert!(records[1].lineage.contains_key("Out"));
    assert_eq!(records[2].decomposed.len(), 5);
    assert_eq!(
        records[2].decomposed[0],
        "CREATE WINDOW x_win_1.win:time(20 seconds) as BaseEvent;"
    );
}

#[test]
fn test_invalid_query_aborts_batch() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("queries.jsonl");
    fs::write(&input, "{\"query\": \"SELECT * FROM S#\"}\n").unwrap();

    let err = decompose_jsonl_file(&input, dir.path().join("out.jsonl"), &decomposer(WindowMode::Paper))
        .unwrap_err();
    assert!(matches!(err, DecompositionError::SourceError { .. }));
}

#[test]
fn test_missing_input_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = decompose_jsonl_file(
        dir.path().join("absent.jsonl"),
        dir.path().join("out.jsonl"),
        &decomposer(WindowMode::Paper),
    )
    .unwrap_err();
    assert!(matches!(err, DecompositionError::IoError(_)));
}
