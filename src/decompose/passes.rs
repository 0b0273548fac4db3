//! The three lowering passes: selection, windowing, and source/pattern.
//!
//! Each pass returns the name of the stream that holds its result. Statements
//! are appended to the shared [`Program`] in producer-before-consumer order.

use super::program::{NameGen, Program, StatementKind};
use crate::ast::OpNode;
use crate::config::DecompositionConfig;
use crate::error::{DecompositionError, DecompositionResult};
use crate::generator::statements;
use log::debug;

pub(crate) struct Lowering<'a> {
    pub program: &'a mut Program,
    pub names: &'a mut NameGen,
    pub config: &'a DecompositionConfig,
}

impl Lowering<'_> {
    pub fn selection(&mut self, node: &OpNode) -> DecompositionResult<String> {
        match node {
            OpNode::Select {
                select,
                group_by,
                child,
            } => {
                let input = self.selection(child)?;
                if group_by.is_none()
                    && select.trim() == "*"
                    && self.produced_by_last_operator(&input)
                {
                    debug!("Eliding identity projection over {}", input);
                    return Ok(input);
                }

                let out = self.names.fresh("proj");
                self.program.push(
                    statements::project(&out, &input, select, group_by.as_deref()),
                    StatementKind::Projection,
                    &out,
                    Some(format!("PROJ({}) from {}", select, input)),
                );
                Ok(out)
            }
            OpNode::Where { cond, child } => {
                let input = self.windowing(child)?;
                let out = self.names.fresh("filter");
                self.program.push(
                    statements::filter(&out, &input, cond),
                    StatementKind::Filter,
                    &out,
                    Some(format!("FILTER({}) from {}", cond, input)),
                );
                Ok(out)
            }
            OpNode::Join { .. }
            | OpNode::Window { .. }
            | OpNode::Stream(_)
            | OpNode::Pattern(_) => self.windowing(node),
        }
    }

    pub fn windowing(&mut self, node: &OpNode) -> DecompositionResult<String> {
        match node {
            OpNode::Join { left, right } => {
                let left = self.windowing(left)?;
                let right = self.windowing(right)?;
                let out = self.names.fresh("join");
                self.program.push(
                    statements::join(&out, &left, &right),
                    StatementKind::Join,
                    &out,
                    Some(format!("JOIN({},{})", left, right)),
                );
                Ok(out)
            }
            OpNode::Window { child, window } => {
                let base = self.source(child)?;
                let named = self.names.fresh("win");
                self.program.push(
                    statements::create_window(
                        &named,
                        &window.func,
                        self.config.window_mode,
                        &self.config.base_event_type,
                    ),
                    StatementKind::CreateWindow,
                    &named,
                    Some(format!("WINDOW({}) over {}", window.func, base)),
                );
                self.program.push(
                    statements::insert_all(&named, &base),
                    StatementKind::WindowFeed,
                    &named,
                    None,
                );
                Ok(named)
            }
            OpNode::Select { .. }
            | OpNode::Where { .. }
            | OpNode::Stream(_)
            | OpNode::Pattern(_) => self.source(node),
        }
    }

    pub fn source(&mut self, node: &OpNode) -> DecompositionResult<String> {
        match node {
            // Inline filters travel with the name into whichever statement reads it.
            OpNode::Stream(src) => Ok(match &src.filter_cond {
                Some(cond) => format!("{}({})", src.name, cond),
                None => src.name.clone(),
            }),
            OpNode::Pattern(src) => {
                let out = self.names.fresh("pattern");
                self.program.push(
                    statements::pattern(&out, &src.pattern),
                    StatementKind::Pattern,
                    &out,
                    Some(format!("PATTERN({})", src.pattern)),
                );
                Ok(out)
            }
            OpNode::Window { child, window } => {
                debug!("Nested window {} collapsed onto its child", window.func);
                self.source(child)
            }
            OpNode::Select { .. } | OpNode::Where { .. } | OpNode::Join { .. } => Err(
                DecompositionError::unsupported_node("source", &node.to_string()),
            ),
        }
    }

    /// True when `stream` is the output of the statement just emitted and that
    /// statement is a relational operator, so a `SELECT *` over it adds nothing.
    fn produced_by_last_operator(&self, stream: &str) -> bool {
        matches!(
            self.program.last_output(),
            Some((
                name,
                StatementKind::Join
                    | StatementKind::Filter
                    | StatementKind::Pattern
                    | StatementKind::Projection
            )) if name == stream
        )
    }
}
