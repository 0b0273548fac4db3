use crate::ast::{FromSource, PatternSource, SelectQuery, StreamSource, WindowSpec};
use crate::error::{DecompositionError, DecompositionResult};
use crate::utils::{find_keyword, find_top_level_char, split_top_level};
use log::debug;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clause {
    Where,
    GroupBy,
    Having,
}

impl Clause {
    const ALL: [Clause; 3] = [Clause::Where, Clause::GroupBy, Clause::Having];

    fn keyword(self) -> &'static str {
        match self {
            Clause::Where => " where ",
            Clause::GroupBy => " group by ",
            Clause::Having => " having ",
        }
    }
}

/// Tolerant parser for single EPL `SELECT` statements
pub struct EplParser {
    insert_into: Regex,
    select_keyword: Regex,
    pattern_source: Regex,
    stream_source: Regex,
    whitespace: Regex,
}

impl EplParser {
    pub fn new() -> DecompositionResult<Self> {
        Ok(Self {
            insert_into: compile(r"(?i)^insert\s+into\s+([A-Za-z_][A-Za-z0-9_]*)\s+(select\s+.+)$")?,
            select_keyword: compile(r"(?i)^select\s")?,
            pattern_source: compile(r"(?i)^pattern\s*(\[.*\])\s*$")?,
            stream_source: compile(r"^([A-Za-z_][A-Za-z0-9_]*)\s*(\((.*)\))?\s*$")?,
            whitespace: compile(r"\s+")?,
        })
    }

    /// Parse one statement, optionally prefixed by `INSERT INTO <name>`.
    pub fn parse(&self, text: &str) -> DecompositionResult<SelectQuery> {
        let trimmed = text.trim().trim_end_matches(';').trim();
        let collapsed = self.whitespace.replace_all(trimmed, " ").into_owned();
        let mut body: &str = &collapsed;

        let mut insert_into = None;
        if let Some(caps) = self.insert_into.captures(body) {
            insert_into = caps.get(1).map(|m| m.as_str().to_string());
            if let Some(rest) = caps.get(2) {
                body = &collapsed[rest.start()..];
            }
        }

        let (select, rest) = self.split_select_from(body).ok_or_else(|| {
            DecompositionError::syntax("expected SELECT <list> FROM <sources>", body)
        })?;

        let (from_clause, clauses) = slice_clauses(rest);
        let from_sources = split_top_level(from_clause, ',')
            .into_iter()
            .map(|segment| self.parse_source(segment))
            .collect::<DecompositionResult<Vec<_>>>()?;

        if from_sources.is_empty() {
            return Err(DecompositionError::syntax("FROM clause names no source", body));
        }

        let mut query = SelectQuery::new(select, from_sources);
        query.insert_into = insert_into;
        for (clause, text) in clauses {
            let text = (!text.is_empty()).then(|| text.to_string());
            match clause {
                Clause::Where => query.where_cond = text,
                Clause::GroupBy => query.group_by = text,
                Clause::Having => query.having = text,
            }
        }

        debug!(
            "Parsed query: {} source(s), where={}, group_by={}, having={}, insert_into={:?}",
            query.from_sources.len(),
            query.where_cond.is_some(),
            query.group_by.is_some(),
            query.having.is_some(),
            query.insert_into
        );

        Ok(query)
    }

    /// Split `SELECT <list> FROM <rest>` at the first top-level `FROM`.
    fn split_select_from<'t>(&self, body: &'t str) -> Option<(&'t str, &'t str)> {
        let keyword = self.select_keyword.find(body)?;
        // Keep the whitespace after SELECT so an empty list still ends at " from ".
        let tail = &body[keyword.end() - 1..];
        let idx = find_keyword(tail, " from ")?;
        let select = tail[..idx].trim();
        let rest = tail[idx + " from ".len()..].trim();
        (!select.is_empty() && !rest.is_empty()).then_some((select, rest))
    }

    /// Validate query syntax without keeping the result
    pub fn validate_syntax(&self, text: &str) -> DecompositionResult<()> {
        self.parse(text)?;
        Ok(())
    }

    fn parse_source(&self, segment: &str) -> DecompositionResult<FromSource> {
        let src = segment.trim();

        if starts_with_pattern_keyword(src) {
            let caps = self
                .pattern_source
                .captures(src)
                .ok_or_else(|| DecompositionError::source(src, "PATTERN requires a [...] expression"))?;
            let pattern = caps.get(1).map_or("", |m| m.as_str()).trim();
            return Ok(PatternSource::new(pattern).into());
        }

        let (base, window) = match find_top_level_char(src, '#') {
            Some(idx) => {
                let func = src[idx + 1..].trim();
                if func.is_empty() {
                    return Err(DecompositionError::source(src, "empty window after '#'"));
                }
                (src[..idx].trim(), Some(WindowSpec::new(func)))
            }
            None => (src, None),
        };

        let caps = self.stream_source.captures(base).ok_or_else(|| {
            DecompositionError::source(src, "expected <stream>[(<filter>)][#<window>]")
        })?;
        let name = caps.get(1).map_or("", |m| m.as_str());
        let filter_cond = caps
            .get(3)
            .map(|m| m.as_str().trim())
            .filter(|cond| !cond.is_empty())
            .map(str::to_string);

        Ok(FromSource::Stream(StreamSource {
            name: name.to_string(),
            filter_cond,
            window,
        }))
    }
}

/// Split the text after `FROM` into the FROM list and the clauses that follow,
/// in the order they appear.
fn slice_clauses(rest: &str) -> (&str, Vec<(Clause, &str)>) {
    let mut cuts: Vec<(usize, Clause)> = Clause::ALL
        .iter()
        .filter_map(|&clause| find_keyword(rest, clause.keyword()).map(|idx| (idx, clause)))
        .collect();
    cuts.sort_by_key(|&(idx, _)| idx);

    let from_end = cuts.first().map_or(rest.len(), |&(idx, _)| idx);
    let from_clause = rest[..from_end].trim();

    let clauses = cuts
        .iter()
        .enumerate()
        .map(|(pos, &(idx, clause))| {
            let start = (idx + clause.keyword().len()).min(rest.len());
            let end = cuts.get(pos + 1).map_or(rest.len(), |&(next, _)| next).max(start);
            (clause, rest[start..end].trim())
        })
        .collect();

    (from_clause, clauses)
}

fn starts_with_pattern_keyword(src: &str) -> bool {
    let bytes = src.as_bytes();
    if bytes.len() < 7 || !bytes[..7].eq_ignore_ascii_case(b"pattern") {
        return false;
    }
    match bytes.get(7) {
        None => true,
        Some(&next) => next == b'[' || next.is_ascii_whitespace(),
    }
}

fn compile(pattern: &str) -> DecompositionResult<Regex> {
    Regex::new(pattern).map_err(|e| DecompositionError::config(&format!("Regex error: {}", e)))
}

/// Parse a single query with a one-off parser.
pub fn parse_select_query(text: &str) -> DecompositionResult<SelectQuery> {
    EplParser::new()?.parse(text)
}
