use std::sync::Arc;

use crate::ast::{DeleteQueryNode, JoinNode, OperationNode, SelectQueryNode, UpdateQueryNode};
use crate::error::QuarryResult;
use crate::query_id::QueryId;
use crate::transformer::{Transformer, transform};

use super::Plugin;

/// Drops joins that are structurally equal to an earlier join of the same
/// statement. Handy when helpers add the same join more than once.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeduplicateJoinsPlugin;

impl Plugin for DeduplicateJoinsPlugin {
    fn transform_query(&self, node: OperationNode, _: &QueryId) -> QuarryResult<OperationNode> {
        transform(&mut DeduplicateJoins, &node)
    }
}

struct DeduplicateJoins;

/// `None` when there was nothing to drop.
fn deduplicate(joins: &[Arc<JoinNode>]) -> Option<Vec<Arc<JoinNode>>> {
    let mut unique: Vec<Arc<JoinNode>> = Vec::with_capacity(joins.len());
    for join in joins {
        if !unique.iter().any(|seen| seen == join) {
            unique.push(join.clone());
        }
    }
    (unique.len() < joins.len()).then_some(unique)
}

impl Transformer for DeduplicateJoins {
    fn transform_node(&mut self, node: OperationNode, _: &[OperationNode]) -> OperationNode {
        match &node {
            OperationNode::SelectQuery(n) => match deduplicate(&n.joins) {
                Some(joins) => SelectQueryNode {
                    joins,
                    ..n.as_ref().clone()
                }
                .into(),
                None => node,
            },
            OperationNode::UpdateQuery(n) => match deduplicate(&n.joins) {
                Some(joins) => UpdateQueryNode {
                    joins,
                    ..n.as_ref().clone()
                }
                .into(),
                None => node,
            },
            OperationNode::DeleteQuery(n) => match deduplicate(&n.joins) {
                Some(joins) => DeleteQueryNode {
                    joins,
                    ..n.as_ref().clone()
                }
                .into(),
                None => node,
            },
            _ => node,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::{JoinType, JoinableNode, TableNode};
    use crate::expression::cmp_ref;
    use crate::transpiler::ToSql;

    #[test]
    fn test_repeated_join_is_dropped() {
        let join = JoinNode::new(JoinType::Inner, TableNode::new("pet").into())
            .with_on(cmp_ref("pet.owner_id", "=", "person.id").unwrap().into_node());
        let node: OperationNode = SelectQueryNode::create(vec![TableNode::new("person").into()])
            .with_join(join.clone())
            .with_join(join)
            .into();

        let out = DeduplicateJoinsPlugin
            .transform_query(node, &QueryId::new())
            .unwrap();
        assert_eq!(
            out.to_sql().unwrap(),
            r#"select from "person" inner join "pet" on "pet"."owner_id" = "person"."id""#
        );
    }

    #[test]
    fn test_distinct_joins_are_kept() {
        let node: OperationNode = SelectQueryNode::create(vec![TableNode::new("person").into()])
            .with_join(JoinNode::new(JoinType::Cross, TableNode::new("pet").into()))
            .with_join(JoinNode::new(JoinType::Cross, TableNode::new("toy").into()))
            .into();
        let out = DeduplicateJoinsPlugin
            .transform_query(node.clone(), &QueryId::new())
            .unwrap();
        assert!(out.ptr_eq(&node));
    }
}
