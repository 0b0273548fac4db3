use crate::ast::{FromSource, OpNode, SelectQuery, StreamSource};
use crate::error::{DecompositionError, DecompositionResult};

/// Fold a parsed query into its operator tree: sources become a left-deep
/// join chain, WHERE wraps the chain, SELECT wraps everything.
pub fn to_operator_tree(query: &SelectQuery) -> DecompositionResult<OpNode> {
    let mut sources = query.from_sources.iter();
    let first = sources.next().ok_or(DecompositionError::EmptyFrom)?;

    let mut node = source_to_op(first);
    for src in sources {
        node = OpNode::Join {
            left: Box::new(node),
            right: Box::new(source_to_op(src)),
        };
    }

    if let Some(cond) = &query.where_cond {
        node = OpNode::Where {
            cond: cond.clone(),
            child: Box::new(node),
        };
    }

    Ok(OpNode::Select {
        select: query.select.clone(),
        group_by: query.group_by.clone(),
        child: Box::new(node),
    })
}

fn source_to_op(src: &FromSource) -> OpNode {
    match src {
        FromSource::Stream(stream) => {
            let leaf = OpNode::Stream(StreamSource {
                name: stream.name.clone(),
                filter_cond: stream.filter_cond.clone(),
                window: None,
            });
            match &stream.window {
                Some(window) => OpNode::Window {
                    child: Box::new(leaf),
                    window: window.clone(),
                },
                None => leaf,
            }
        }
        FromSource::Pattern(pattern) => OpNode::Pattern(pattern.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{PatternSource, WindowSpec};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_stream() {
        let query = SelectQuery::new("camera", vec![StreamSource::new("DetectMov").into()]);
        assert_eq!(
            to_operator_tree(&query).unwrap(),
            OpNode::Select {
                select: "camera".to_string(),
                group_by: None,
                child: Box::new(OpNode::Stream(StreamSource::new("DetectMov"))),
            }
        );
    }

    #[test]
    fn test_window_is_stripped_onto_wrapper() {
        let query = SelectQuery::new(
            "*",
            vec![StreamSource::new("A").with_filter("x > 1").with_window("length(5)").into()],
        )
        .with_where("x < 9");

        let tree = to_operator_tree(&query).unwrap();
        assert_eq!(
            tree,
            OpNode::Select {
                select: "*".to_string(),
                group_by: None,
                child: Box::new(OpNode::Where {
                    cond: "x < 9".to_string(),
                    child: Box::new(OpNode::Window {
                        child: Box::new(OpNode::Stream(StreamSource::new("A").with_filter("x > 1"))),
                        window: WindowSpec::new("length(5)"),
                    }),
                }),
            }
        );
    }

    #[test]
    fn test_joins_fold_left() {
        let query = SelectQuery::new(
            "*",
            vec![
                StreamSource::new("A").into(),
                StreamSource::new("B").into(),
                PatternSource::new("[every c=C]").into(),
            ],
        )
        .with_group_by("a");

        let tree = to_operator_tree(&query).unwrap();
        assert_eq!(tree.to_string(), "select[* by a](join(join(A, B), pattern[every c=C]))");
    }

    #[test]
    fn test_empty_from_is_rejected() {
        let query = SelectQuery::new("*", vec![]);
        assert!(matches!(
            to_operator_tree(&query),
            Err(DecompositionError::EmptyFrom)
        ));
    }
}
