pub mod statements;

use crate::ast::{FromSource, SelectQuery};
use std::fmt;

impl fmt::Display for FromSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FromSource::Pattern(src) => write!(f, "PATTERN {}", src.pattern),
            FromSource::Stream(src) => {
                write!(f, "{}", src.name)?;
                if let Some(cond) = &src.filter_cond {
                    write!(f, "({})", cond)?;
                }
                if let Some(window) = &src.window {
                    write!(f, "#{}", window.func)?;
                }
                Ok(())
            }
        }
    }
}

/// Render a query as canonical EPL text, one clause per line.
pub fn query_to_epl(query: &SelectQuery, trailing_semicolon: bool) -> String {
    let mut parts = Vec::with_capacity(6);
    if let Some(target) = &query.insert_into {
        parts.push(format!("INSERT INTO {}", target));
    }
    parts.push(format!("SELECT {}", query.select));
    parts.push(format!(
        "FROM {}",
        query
            .from_sources
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    ));
    if let Some(cond) = &query.where_cond {
        parts.push(format!("WHERE {}", cond));
    }
    if let Some(group_by) = &query.group_by {
        parts.push(format!("GROUP BY {}", group_by));
    }
    if let Some(having) = &query.having {
        parts.push(format!("HAVING {}", having));
    }

    let mut text = parts.join("\n");
    if trailing_semicolon {
        text.push(';');
    }
    text
}

/// Canonical text with a statement terminator.
pub fn to_text(query: &SelectQuery) -> String {
    query_to_epl(query, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{PatternSource, StreamSource};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_full_query() {
        let query = SelectQuery::new(
            "therm, avg(temp)",
            vec![
                StreamSource::new("BaseThermRead")
                    .with_filter("temp > 0")
                    .with_window("time(20 seconds)")
                    .into(),
                PatternSource::new("[every a=AlertSmoke]").into(),
            ],
        )
        .with_where("humid < 20")
        .with_group_by("therm")
        .with_having("avg(temp) > 40")
        .with_insert_into("Out");

        assert_eq!(
            to_text(&query),
            "INSERT INTO Out\n\
             SELECT therm, avg(temp)\n\
             FROM BaseThermRead(temp > 0)#time(20 seconds), PATTERN [every a=AlertSmoke]\n\
             WHERE humid < 20\n\
             GROUP BY therm\n\
             HAVING avg(temp) > 40;"
        );
    }

    #[test]
    fn test_render_without_terminator() {
        let query = SelectQuery::new("camera", vec![StreamSource::new("DetectMov").into()]);
        assert_eq!(query_to_epl(&query, false), "SELECT camera\nFROM DetectMov");
    }
}
