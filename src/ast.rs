//! Source-level query model and the operator tree the lowering passes walk.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Inline window descriptor, e.g. `time(20 seconds)` or `length(5)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowSpec {
    pub func: String,
}

impl WindowSpec {
    pub fn new(func: &str) -> Self {
        Self {
            func: func.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSource {
    pub name: String,
    pub filter_cond: Option<String>,
    pub window: Option<WindowSpec>,
}

impl StreamSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            filter_cond: None,
            window: None,
        }
    }

    pub fn with_filter(mut self, cond: &str) -> Self {
        self.filter_cond = Some(cond.to_string());
        self
    }

    pub fn with_window(mut self, func: &str) -> Self {
        self.window = Some(WindowSpec::new(func));
        self
    }
}

/// A `PATTERN [...]` source. The expression keeps its brackets and is never
/// parsed further.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSource {
    pub pattern: String,
}

impl PatternSource {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
        }
    }

    /// Every identifier-shaped token in the pattern: tags, stream names, fields.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.pattern
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .filter(|token| token.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_'))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FromSource {
    Stream(StreamSource),
    Pattern(PatternSource),
}

impl FromSource {
    /// Stream name for stream sources; patterns have none.
    pub fn stream_name(&self) -> Option<&str> {
        match self {
            FromSource::Stream(src) => Some(&src.name),
            FromSource::Pattern(_) => None,
        }
    }

    pub fn referenced_names(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            FromSource::Stream(src) => Box::new(std::iter::once(src.name.as_str())),
            FromSource::Pattern(src) => Box::new(src.identifiers()),
        }
    }
}

impl From<StreamSource> for FromSource {
    fn from(src: StreamSource) -> Self {
        FromSource::Stream(src)
    }
}

impl From<PatternSource> for FromSource {
    fn from(src: PatternSource) -> Self {
        FromSource::Pattern(src)
    }
}

/// A single `[INSERT INTO t] SELECT ... FROM ... [WHERE] [GROUP BY] [HAVING]`
/// statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectQuery {
    pub select: String,
    pub from_sources: Vec<FromSource>,
    pub where_cond: Option<String>,
    pub group_by: Option<String>,
    pub having: Option<String>,
    pub insert_into: Option<String>,
}

impl SelectQuery {
    pub fn new(select: &str, from_sources: Vec<FromSource>) -> Self {
        Self {
            select: select.to_string(),
            from_sources,
            where_cond: None,
            group_by: None,
            having: None,
            insert_into: None,
        }
    }

    pub fn with_where(mut self, cond: &str) -> Self {
        self.where_cond = Some(cond.to_string());
        self
    }

    pub fn with_group_by(mut self, group_by: &str) -> Self {
        self.group_by = Some(group_by.to_string());
        self
    }

    pub fn with_having(mut self, having: &str) -> Self {
        self.having = Some(having.to_string());
        self
    }

    pub fn with_insert_into(mut self, target: &str) -> Self {
        self.insert_into = Some(target.to_string());
        self
    }

    pub fn is_join(&self) -> bool {
        self.from_sources.len() >= 2
    }

    pub fn stream_names(&self) -> impl Iterator<Item = &str> {
        self.from_sources.iter().filter_map(FromSource::stream_name)
    }

    /// Stream names plus every identifier mentioned inside a pattern source.
    pub fn referenced_names(&self) -> impl Iterator<Item = &str> {
        self.from_sources.iter().flat_map(FromSource::referenced_names)
    }
}

/// Canonical operator tree. Built by [`crate::normalize::to_operator_tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpNode {
    Select {
        select: String,
        group_by: Option<String>,
        child: Box<OpNode>,
    },
    Where {
        cond: String,
        child: Box<OpNode>,
    },
    Join {
        left: Box<OpNode>,
        right: Box<OpNode>,
    },
    Window {
        child: Box<OpNode>,
        window: WindowSpec,
    },
    Stream(StreamSource),
    Pattern(PatternSource),
}

impl OpNode {
    pub fn kind(&self) -> &'static str {
        match self {
            OpNode::Select { .. } => "select",
            OpNode::Where { .. } => "where",
            OpNode::Join { .. } => "join",
            OpNode::Window { .. } => "window",
            OpNode::Stream(_) => "stream",
            OpNode::Pattern(_) => "pattern",
        }
    }
}

impl fmt::Display for OpNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpNode::Select {
                select,
                group_by,
                child,
            } => {
                write!(f, "select[{}", select)?;
                if let Some(group_by) = group_by {
                    write!(f, " by {}", group_by)?;
                }
                write!(f, "]({})", child)
            }
            OpNode::Where { cond, child } => write!(f, "where[{}]({})", cond, child),
            OpNode::Join { left, right } => write!(f, "join({}, {})", left, right),
            OpNode::Window { child, window } => write!(f, "window[{}]({})", window.func, child),
            OpNode::Stream(src) => match &src.filter_cond {
                Some(cond) => write!(f, "{}({})", src.name, cond),
                None => write!(f, "{}", src.name),
            },
            OpNode::Pattern(src) => write!(f, "pattern{}", src.pattern),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_join() {
        let single = SelectQuery::new("*", vec![StreamSource::new("A").into()]);
        assert!(!single.is_join());

        let join = SelectQuery::new(
            "*",
            vec![StreamSource::new("A").into(), PatternSource::new("[every a=A]").into()],
        );
        assert!(join.is_join());
        assert_eq!(join.stream_names().collect::<Vec<_>>(), vec!["A"]);
        assert_eq!(join.referenced_names().collect::<Vec<_>>(), vec!["A", "every", "a", "A"]);
    }

    #[test]
    fn test_pattern_identifiers() {
        let pattern =
            PatternSource::new("[every x=DetectMov -> y=BaseThermRead(temp>40 AND _h<2.5)]");
        assert_eq!(
            pattern.identifiers().collect::<Vec<_>>(),
            vec!["every", "x", "DetectMov", "y", "BaseThermRead", "temp", "AND", "_h"]
        );
    }

    #[test]
    fn test_op_node_display() {
        let tree = OpNode::Select {
            select: "*".to_string(),
            group_by: None,
            child: Box::new(OpNode::Join {
                left: Box::new(OpNode::Window {
                    child: Box::new(OpNode::Stream(StreamSource::new("A").with_filter("x > 1"))),
                    window: WindowSpec::new("length(5)"),
                }),
                right: Box::new(OpNode::Pattern(PatternSource::new("[every b=B]"))),
            }),
        };
        assert_eq!(
            tree.to_string(),
            "select[*](join(window[length(5)](A(x > 1)), pattern[every b=B]))"
        );
        assert_eq!(tree.kind(), "select");
    }
}
