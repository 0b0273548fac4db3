//! Lowering of a parsed query into an ordered program of atomic statements.

mod passes;
pub mod program;

pub use program::{NameGen, Program, StatementKind};

use crate::ast::{SelectQuery, StreamSource};
use crate::config::{DecompositionConfig, WindowMode};
use crate::error::DecompositionResult;
use crate::normalize::to_operator_tree;
use log::debug;
use passes::Lowering;

/// Decompose `query` with default settings and the given window rendering.
///
/// Returns the program and the name of the stream holding the final result.
pub fn decompose(
    query: &SelectQuery,
    window_mode: WindowMode,
) -> DecompositionResult<(Program, String)> {
    decompose_with_config(query, &DecompositionConfig::with_window_mode(window_mode))
}

pub fn decompose_with_config(
    query: &SelectQuery,
    config: &DecompositionConfig,
) -> DecompositionResult<(Program, String)> {
    config.validate()?;

    let mut names = NameGen::new(&config.name_prefix);
    for name in query.referenced_names() {
        names.reserve(name);
    }
    if let Some(target) = &query.insert_into {
        names.reserve(target);
    }
    names.reserve(&config.aggregate_stream);

    let mut program = Program::new();
    let final_stream = lower_query(query, &mut program, &mut names, config)?;

    debug!(
        "Decomposed query into {} statements, final stream {}",
        program.len(),
        final_stream
    );
    Ok((program, final_stream))
}

fn lower_query(
    query: &SelectQuery,
    program: &mut Program,
    names: &mut NameGen,
    config: &DecompositionConfig,
) -> DecompositionResult<String> {
    if let Some(having) = &query.having {
        // Aggregate first, then filter the aggregate stream.
        let aggregate_stream = match &query.insert_into {
            Some(target) => target.clone(),
            None if query.stream_names().any(|s| s == config.aggregate_stream) => {
                names.fresh("agg")
            }
            None => config.aggregate_stream.clone(),
        };
        debug!("Rewriting HAVING {} over {}", having, aggregate_stream);

        let mut aggregate = query.clone();
        aggregate.having = None;
        aggregate.insert_into = Some(aggregate_stream.clone());
        lower_query(&aggregate, program, names, config)?;

        let post_filter = SelectQuery::new("*", vec![StreamSource::new(&aggregate_stream).into()])
            .with_where(having);
        return lower_query(&post_filter, program, names, config);
    }

    let tree = to_operator_tree(query)?;
    debug!("Lowering operator tree {}", tree);
    let out = Lowering {
        program: &mut *program,
        names: &mut *names,
        config,
    }
    .selection(&tree)?;

    match &query.insert_into {
        Some(target) => {
            program.retarget_last(target)?;
            Ok(target.clone())
        }
        None => {
            program.detach_last()?;
            Ok(out)
        }
    }
}
