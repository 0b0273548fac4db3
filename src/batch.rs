//! JSON-lines batch decomposition.

use crate::error::{DecompositionError, DecompositionResult};
use crate::utils::ensure_parent_dir;
use crate::Decomposer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompositionRecord {
    pub query: String,
    pub decomposed: Vec<String>,
    pub lineage: BTreeMap<String, String>,
}

/// Decompose every `{"query": ...}` line of `reader`, writing one record per
/// line to `writer`. Returns the number of records written.
pub fn decompose_jsonl<R: BufRead, W: Write>(
    reader: R,
    mut writer: W,
    decomposer: &Decomposer,
) -> DecompositionResult<usize> {
    let mut count = 0;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record: QueryRecord = serde_json::from_str(&line).map_err(|e| {
            DecompositionError::syntax(&format!("line {}: {}", index + 1, e), line.trim())
        })?;
        let (program, _) = decomposer.decompose(&record.query)?;
        let out = DecompositionRecord {
            query: record.query,
            lineage: program.lineage().clone(),
            decomposed: program.into_statements(),
        };

        serde_json::to_writer(&mut writer, &out)?;
        writer.write_all(b"\n")?;
        count += 1;
    }
    writer.flush()?;
    log::debug!("Wrote {} decomposition records", count);
    Ok(count)
}

pub fn decompose_jsonl_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    decomposer: &Decomposer,
) -> DecompositionResult<usize> {
    let reader = BufReader::new(File::open(input.as_ref())?);
    ensure_parent_dir(output.as_ref())?;
    let writer = BufWriter::new(File::create(output.as_ref())?);
    decompose_jsonl(reader, writer, decomposer)
}
