use crate::error::{DecompositionError, DecompositionResult};
use crate::generator::statements;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Operator an emitted statement implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    Projection,
    Filter,
    Join,
    CreateWindow,
    WindowFeed,
    Pattern,
}

#[derive(Debug, Clone, PartialEq)]
struct Emitted {
    kind: StatementKind,
    output: Option<String>,
}

/// Ordered atomic statements plus the lineage of every generated stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    statements: Vec<String>,
    lineage: BTreeMap<String, String>,
    emitted: Vec<Emitted>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn into_statements(self) -> Vec<String> {
        self.statements
    }

    /// Generated stream name -> description of the operator producing it.
    pub fn lineage(&self) -> &BTreeMap<String, String> {
        &self.lineage
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn kinds(&self) -> impl Iterator<Item = StatementKind> + '_ {
        self.emitted.iter().map(|e| e.kind)
    }

    /// Streams written by the program, in the order they are first produced.
    pub fn produced_streams(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.emitted
            .iter()
            .filter_map(|e| e.output.as_deref())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Statements separated by blank lines, ready to deploy as one module.
    pub fn to_script(&self) -> String {
        self.statements.join("\n\n")
    }

    pub(crate) fn push(
        &mut self,
        statement: String,
        kind: StatementKind,
        output: &str,
        description: Option<String>,
    ) {
        let mut statement = statement.trim().to_string();
        if !statement.ends_with(';') {
            statement.push(';');
        }
        self.statements.push(statement);
        if let Some(description) = description {
            self.lineage.insert(output.to_string(), description);
        }
        self.emitted.push(Emitted {
            kind,
            output: Some(output.to_string()),
        });
    }

    /// Output stream and kind of the most recent statement.
    pub(crate) fn last_output(&self) -> Option<(&str, StatementKind)> {
        self.emitted
            .last()
            .and_then(|e| e.output.as_deref().map(|name| (name, e.kind)))
    }

    /// Point the final statement at `target` instead of its generated name.
    pub(crate) fn retarget_last(&mut self, target: &str) -> DecompositionResult<()> {
        let (statement, emitted) = self.last_insert_mut()?;
        match statements::retarget_insert_into(statement, target) {
            Some(rewritten) => *statement = rewritten,
            None => return Err(final_statement_error(statement.as_str())),
        }

        if let Some(previous) = emitted.output.replace(target.to_string()) {
            if let Some(description) = self.lineage.remove(&previous) {
                self.lineage.insert(target.to_string(), description);
            }
        }
        Ok(())
    }

    /// Turn the final statement into a bare `SELECT`.
    pub(crate) fn detach_last(&mut self) -> DecompositionResult<()> {
        let (statement, emitted) = self.last_insert_mut()?;
        match statements::strip_insert_into(statement) {
            Some(bare) => *statement = bare,
            None => return Err(final_statement_error(statement.as_str())),
        }
        emitted.output = None;
        Ok(())
    }

    fn last_insert_mut(&mut self) -> DecompositionResult<(&mut String, &mut Emitted)> {
        match (self.statements.last_mut(), self.emitted.last_mut()) {
            (Some(statement), Some(emitted)) => Ok((statement, emitted)),
            _ => Err(DecompositionError::unsupported_node(
                "selection",
                "empty program has no final statement",
            )),
        }
    }
}

fn final_statement_error(statement: &str) -> DecompositionError {
    DecompositionError::unsupported_node(
        "selection",
        &format!("final statement is not an INSERT INTO: {}", statement),
    )
}

/// Fresh intermediate stream names for one decomposition run.
#[derive(Debug, Clone)]
pub struct NameGen {
    prefix: String,
    counter: usize,
    taken: HashSet<String>,
}

impl NameGen {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            counter: 0,
            taken: HashSet::new(),
        }
    }

    /// Keep `name` out of the generated namespace.
    pub fn reserve(&mut self, name: &str) {
        self.taken.insert(name.to_string());
    }

    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    /// Next `<prefix>_<tag>_<n>`, skipping reserved names.
    pub fn fresh(&mut self, tag: &str) -> String {
        loop {
            self.counter += 1;
            let name = format!("{}_{}_{}", self.prefix, tag, self.counter);
            if self.taken.insert(name.clone()) {
                return name;
            }
        }
    }
}
