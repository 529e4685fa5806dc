//! Node transformation framework.
//!
//! A [`Transformer`] rewrites a tree bottom-up: the children of a node are
//! transformed first, then the node itself is handed to
//! [`Transformer::transform_node`] together with the stack of its original
//! ancestors. Subtrees in which nothing changed are returned as the very same
//! `Arc`s, so a no-op transformer reproduces the input tree exactly.
//!
//! A [`Visitor`] walks a tree read-only, top-down.

mod children;
mod visitor;

use std::sync::Arc;

use crate::ast::{Node, OperationNode};
use crate::error::{QuarryError, QuarryResult};

pub(crate) use children::map_children;
pub use visitor::{Visitor, children, visit};

/// Rewrites nodes of a tree.
pub trait Transformer {
    /// Called once per node, after its children were transformed.
    /// `ancestors` holds the original parents, root first.
    ///
    /// A node in a typed position (for example the `Where` of a select) must
    /// come back as the same kind; otherwise the walk fails with
    /// [`QuarryError::PluginContract`].
    fn transform_node(&mut self, node: OperationNode, ancestors: &[OperationNode]) -> OperationNode;
}

/// Transform `node` and every node below it.
pub fn transform<T: Transformer + ?Sized>(
    transformer: &mut T,
    node: &OperationNode,
) -> QuarryResult<OperationNode> {
    let mut walker = Walker {
        transformer,
        ancestors: Vec::new(),
        dirty: false,
    };
    walker.node(node)
}

/// Maps the children of one node; the per-kind table in `map_children`
/// drives it.
pub(crate) trait ChildMapper {
    fn node(&mut self, node: &OperationNode) -> QuarryResult<OperationNode>;

    fn typed<N: Node>(&mut self, node: &Arc<N>) -> QuarryResult<Arc<N>> {
        let mapped = self.node(&node.clone().into_operation())?;
        N::from_operation(mapped).map_err(|other| QuarryError::PluginContract {
            expected: N::KIND,
            actual: other.kind(),
        })
    }

    fn opt(&mut self, node: &Option<OperationNode>) -> QuarryResult<Option<OperationNode>> {
        node.as_ref().map(|n| self.node(n)).transpose()
    }

    fn opt_typed<N: Node>(&mut self, node: &Option<Arc<N>>) -> QuarryResult<Option<Arc<N>>> {
        node.as_ref().map(|n| self.typed(n)).transpose()
    }

    fn list(&mut self, nodes: &[OperationNode]) -> QuarryResult<Vec<OperationNode>> {
        nodes.iter().map(|n| self.node(n)).collect()
    }

    fn typed_list<N: Node>(&mut self, nodes: &[Arc<N>]) -> QuarryResult<Vec<Arc<N>>> {
        nodes.iter().map(|n| self.typed(n)).collect()
    }
}

struct Walker<'t, T: ?Sized> {
    transformer: &'t mut T,
    ancestors: Vec<OperationNode>,
    /// Set when a node below the current one was replaced.
    dirty: bool,
}

impl<T: Transformer + ?Sized> ChildMapper for Walker<'_, T> {
    fn node(&mut self, node: &OperationNode) -> QuarryResult<OperationNode> {
        let outer_dirty = std::mem::replace(&mut self.dirty, false);

        self.ancestors.push(node.clone());
        let rebuilt = map_children(self, node);
        self.ancestors.pop();
        let rebuilt = rebuilt?;

        let candidate = if self.dirty { rebuilt } else { node.clone() };
        let transformed = self.transformer.transform_node(candidate, &self.ancestors);

        self.dirty = outer_dirty || !transformed.ptr_eq(node);
        Ok(transformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        ColumnNode, FilterableNode, IdentifierNode, NodeKind, SelectQueryNode, SelectionNode,
        TableNode, ValueNode,
    };

    struct Noop;

    impl Transformer for Noop {
        fn transform_node(&mut self, node: OperationNode, _: &[OperationNode]) -> OperationNode {
            node
        }
    }

    struct Rename;

    impl Transformer for Rename {
        fn transform_node(&mut self, node: OperationNode, _: &[OperationNode]) -> OperationNode {
            match node.cast::<IdentifierNode>() {
                Some(id) if id.name == "old" => IdentifierNode::new("new").into(),
                _ => node,
            }
        }
    }

    struct BreakWhere;

    impl Transformer for BreakWhere {
        fn transform_node(&mut self, node: OperationNode, _: &[OperationNode]) -> OperationNode {
            if node.kind() == NodeKind::Where {
                return ColumnNode::new("oops").into();
            }
            node
        }
    }

    fn sample() -> OperationNode {
        SelectQueryNode::create(vec![TableNode::new("person").into()])
            .with_selections(vec![SelectionNode::new(ColumnNode::new("old").into())])
            .with_where(ValueNode::new(1).into())
            .into()
    }

    #[test]
    fn test_noop_returns_identical_tree() {
        let tree = sample();
        let out = transform(&mut Noop, &tree).unwrap();
        assert_eq!(out, tree);
        assert!(out.ptr_eq(&tree));
    }

    #[test]
    fn test_rewrite_shares_untouched_subtrees() {
        let tree = sample();
        let out = transform(&mut Rename, &tree).unwrap();
        assert_ne!(out, tree);

        let before = tree.cast::<SelectQueryNode>().unwrap();
        let after = out.cast::<SelectQueryNode>().unwrap();
        assert!(Arc::ptr_eq(
            before.from.as_ref().unwrap(),
            after.from.as_ref().unwrap()
        ));
        let column = after.selections[0].selection.cast::<ColumnNode>().unwrap();
        assert_eq!(column.name(), "new");
    }

    #[test]
    fn test_wrong_kind_in_typed_slot_fails() {
        let err = transform(&mut BreakWhere, &sample()).unwrap_err();
        match err {
            QuarryError::PluginContract { expected, actual } => {
                assert_eq!(expected, NodeKind::Where);
                assert_eq!(actual, NodeKind::Column);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_ancestors_are_original_parents() {
        struct Record(Vec<Vec<NodeKind>>);
        impl Transformer for Record {
            fn transform_node(&mut self, node: OperationNode, ancestors: &[OperationNode]) -> OperationNode {
                if node.kind() == NodeKind::Table {
                    self.0.push(ancestors.iter().map(OperationNode::kind).collect());
                }
                node
            }
        }

        let mut record = Record(Vec::new());
        transform(&mut record, &sample()).unwrap();
        assert_eq!(
            record.0,
            vec![vec![NodeKind::SelectQuery, NodeKind::From]]
        );
    }
}
