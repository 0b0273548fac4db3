//! Differential testing of a query against its decomposition.
//!
//! Outputs are compared as bags: multiplicities matter, arrival order does not,
//! and two events match only when they carry exactly the same fields.

use crate::config::WindowMode;
use crate::decompose::decompose;
use crate::engines::{Engine, Event, EventStreams};
use crate::error::{DecompositionError, DecompositionResult};
use crate::parser::parse_select_query;
use log::{info, warn};
use serde::Serialize;

/// Verdict of one differential run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarnessResult {
    pub ok: bool,
    pub name: String,
    /// Empty on success; both outputs and the statements on mismatch.
    pub details: String,
}

/// Sorted `(field, canonical value text)` pairs identifying an event.
pub fn canonical_key(event: &Event) -> DecompositionResult<Vec<(String, String)>> {
    let mut key = event
        .iter()
        .map(|(field, value)| Ok((field.clone(), serde_json::to_string(value)?)))
        .collect::<DecompositionResult<Vec<_>>>()?;
    key.sort();
    Ok(key)
}

/// Bag equality of two output sequences.
pub fn compare_outputs(a: &[Event], b: &[Event]) -> DecompositionResult<bool> {
    if a.len() != b.len() {
        return Ok(false);
    }
    Ok(sorted_keys(a)? == sorted_keys(b)?)
}

fn sorted_keys(events: &[Event]) -> DecompositionResult<Vec<Vec<(String, String)>>> {
    let mut keys = events
        .iter()
        .map(canonical_key)
        .collect::<DecompositionResult<Vec<_>>>()?;
    keys.sort();
    Ok(keys)
}

fn run_engine<E: Engine + ?Sized>(
    engine: &E,
    statements: &[String],
    events: &EventStreams,
) -> DecompositionResult<Vec<Event>> {
    engine
        .run(statements, events)
        .map_err(|e| DecompositionError::engine(engine.name(), e))
}

fn render(events: &[Event]) -> DecompositionResult<String> {
    Ok(serde_json::to_string(events)?)
}

/// Run `query` and its decomposition on the same engine and inputs.
pub fn run_original_vs_decomposed<E: Engine + ?Sized>(
    engine: &E,
    query: &str,
    events: &EventStreams,
    window_mode: WindowMode,
) -> DecompositionResult<HarnessResult> {
    let parsed = parse_select_query(query)?;
    let (program, _) = decompose(&parsed, window_mode)?;

    let original_out = run_engine(engine, &[query.to_string()], events)?;
    let decomposed_out = run_engine(engine, program.statements(), events)?;

    let ok = compare_outputs(&original_out, &decomposed_out)?;
    let details = if ok {
        info!("Decomposition of `{}` matches on {}", query, engine.name());
        String::new()
    } else {
        warn!(
            "Decomposition of `{}` diverges on {} ({} vs {} events)",
            query,
            engine.name(),
            original_out.len(),
            decomposed_out.len()
        );
        format!(
            "Mismatch\noriginal_out={}\ndecomposed_out={}\ndecomposed_program={:?}",
            render(&original_out)?,
            render(&decomposed_out)?,
            program.statements()
        )
    };

    Ok(HarnessResult {
        ok,
        name: "orig_vs_decomp".to_string(),
        details,
    })
}

/// Run the same statements on a reference engine and a semantics model.
pub fn run_semantics_vs_esper<E, S>(
    esper: &E,
    semantics: &S,
    statements: &[String],
    events: &EventStreams,
) -> DecompositionResult<HarnessResult>
where
    E: Engine + ?Sized,
    S: Engine + ?Sized,
{
    let esper_out = run_engine(esper, statements, events)?;
    let semantics_out = run_engine(semantics, statements, events)?;

    let ok = compare_outputs(&esper_out, &semantics_out)?;
    let details = if ok {
        info!("{} agrees with {} on {} statements", semantics.name(), esper.name(), statements.len());
        String::new()
    } else {
        warn!("{} disagrees with {}", semantics.name(), esper.name());
        format!(
            "Mismatch\nesper_out={}\nsemantics_out={}\nstatements={:?}",
            render(&esper_out)?,
            render(&semantics_out)?,
            statements
        )
    };

    Ok(HarnessResult {
        ok,
        name: "semantics_vs_esper".to_string(),
        details,
    })
}
