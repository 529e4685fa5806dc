use crate::ast::OperationNode;
use crate::error::QuarryResult;

use super::{ChildMapper, map_children};

/// Read-only, pre-order walk over a tree.
pub trait Visitor {
    /// Called for every node before its children. `ancestors` holds the
    /// parents, root first.
    fn visit_node(&mut self, node: &OperationNode, ancestors: &[OperationNode]);
}

/// Visit `node` and every node below it.
pub fn visit<V: Visitor + ?Sized>(visitor: &mut V, node: &OperationNode) {
    let mut ancestors = Vec::new();
    walk(visitor, node, &mut ancestors);
}

fn walk<V: Visitor + ?Sized>(
    visitor: &mut V,
    node: &OperationNode,
    ancestors: &mut Vec<OperationNode>,
) {
    visitor.visit_node(node, ancestors);
    ancestors.push(node.clone());
    for child in children(node) {
        walk(visitor, &child, ancestors);
    }
    ancestors.pop();
}

/// Direct children of `node`, in rendering order.
pub fn children(node: &OperationNode) -> Vec<OperationNode> {
    let mut collector = Collector(Vec::new());
    // collecting never fails
    let _ = map_children(&mut collector, node);
    collector.0
}

struct Collector(Vec<OperationNode>);

impl ChildMapper for Collector {
    fn node(&mut self, node: &OperationNode) -> QuarryResult<OperationNode> {
        self.0.push(node.clone());
        Ok(node.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        ColumnNode, FilterableNode, NodeKind, SelectQueryNode, SelectionNode, TableNode, ValueNode,
    };

    struct Kinds(Vec<NodeKind>);

    impl Visitor for Kinds {
        fn visit_node(&mut self, node: &OperationNode, _: &[OperationNode]) {
            self.0.push(node.kind());
        }
    }

    #[test]
    fn test_pre_order() {
        let node: OperationNode = SelectQueryNode::create(vec![TableNode::new("person").into()])
            .with_selections(vec![SelectionNode::new(ColumnNode::new("id").into())])
            .with_where(ValueNode::new(1).into())
            .into();

        let mut kinds = Kinds(Vec::new());
        visit(&mut kinds, &node);
        assert_eq!(
            kinds.0,
            vec![
                NodeKind::SelectQuery,
                NodeKind::Selection,
                NodeKind::Column,
                NodeKind::Identifier,
                NodeKind::From,
                NodeKind::Table,
                NodeKind::SchemableIdentifier,
                NodeKind::Identifier,
                NodeKind::Where,
                NodeKind::Value,
            ]
        );
    }

    #[test]
    fn test_leaf_has_no_children() {
        assert!(children(&ValueNode::new(1).into()).is_empty());
    }
}
