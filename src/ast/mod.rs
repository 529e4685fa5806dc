//! Immutable, persistent query AST.
//!
//! Every node is an `Arc`-wrapped record inside the closed [`OperationNode`]
//! enum. Nodes are never mutated: the `with_*` functions build a new record
//! that shares every untouched child with the original.

mod clause;
mod ddl;
mod expr;
mod operators;
mod query;
mod reference;
mod values;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use clause::*;
pub use ddl::*;
pub use expr::*;
pub use operators::*;
pub use query::*;
pub use reference::*;
pub use values::Value;

/// Implemented by every node record; links it to its [`OperationNode`] variant.
pub trait Node: Sized + 'static {
    const KIND: NodeKind;

    fn into_operation(self: Arc<Self>) -> OperationNode;

    /// Unwrap the variant, handing the node back if it is of another kind.
    fn from_operation(node: OperationNode) -> Result<Arc<Self>, OperationNode>;

    fn cast(node: &OperationNode) -> Option<&Arc<Self>>;
}

macro_rules! operation_nodes {
    ($($kind:ident => $node:ident),* $(,)?) => {
        /// A node of the query AST.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "kind", content = "node")]
        pub enum OperationNode {
            $($kind(Arc<$node>),)*
        }

        /// The kind of an [`OperationNode`], without its payload.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum NodeKind {
            $($kind,)*
        }

        impl OperationNode {
            pub fn kind(&self) -> NodeKind {
                match self {
                    $(OperationNode::$kind(_) => NodeKind::$kind,)*
                }
            }

            /// True when both handles point at the same node record.
            pub fn ptr_eq(&self, other: &OperationNode) -> bool {
                match (self, other) {
                    $((OperationNode::$kind(a), OperationNode::$kind(b)) => Arc::ptr_eq(a, b),)*
                    _ => false,
                }
            }
        }

        $(
            impl Node for $node {
                const KIND: NodeKind = NodeKind::$kind;

                fn into_operation(self: Arc<Self>) -> OperationNode {
                    OperationNode::$kind(self)
                }

                fn from_operation(node: OperationNode) -> Result<Arc<Self>, OperationNode> {
                    match node {
                        OperationNode::$kind(n) => Ok(n),
                        other => Err(other),
                    }
                }

                fn cast(node: &OperationNode) -> Option<&Arc<Self>> {
                    match node {
                        OperationNode::$kind(n) => Some(n),
                        _ => None,
                    }
                }
            }

            impl From<$node> for OperationNode {
                fn from(node: $node) -> Self {
                    OperationNode::$kind(Arc::new(node))
                }
            }

            impl From<Arc<$node>> for OperationNode {
                fn from(node: Arc<$node>) -> Self {
                    OperationNode::$kind(node)
                }
            }
        )*
    };
}

operation_nodes! {
    // references
    Identifier => IdentifierNode,
    SchemableIdentifier => SchemableIdentifierNode,
    Table => TableNode,
    Column => ColumnNode,
    SelectAll => SelectAllNode,
    Reference => ReferenceNode,
    Alias => AliasNode,
    // expressions
    Value => ValueNode,
    ValueList => ValueListNode,
    Values => ValuesNode,
    DefaultInsertValue => DefaultInsertValueNode,
    Operator => OperatorNode,
    BinaryOperation => BinaryOperationNode,
    UnaryOperation => UnaryOperationNode,
    And => AndNode,
    Or => OrNode,
    Parens => ParensNode,
    Raw => RawNode,
    Function => FunctionNode,
    AggregateFunction => AggregateFunctionNode,
    Case => CaseNode,
    When => WhenNode,
    Cast => CastNode,
    Over => OverNode,
    PartitionBy => PartitionByNode,
    PartitionByItem => PartitionByItemNode,
    Matched => MatchedNode,
    // clauses
    Selection => SelectionNode,
    From => FromNode,
    Join => JoinNode,
    On => OnNode,
    Where => WhereNode,
    Having => HavingNode,
    GroupBy => GroupByNode,
    GroupByItem => GroupByItemNode,
    OrderBy => OrderByNode,
    OrderByItem => OrderByItemNode,
    Limit => LimitNode,
    Offset => OffsetNode,
    Fetch => FetchNode,
    Top => TopNode,
    SelectModifier => SelectModifierNode,
    SetOperation => SetOperationNode,
    With => WithNode,
    CommonTableExpression => CommonTableExpressionNode,
    CommonTableExpressionName => CommonTableExpressionNameNode,
    Returning => ReturningNode,
    ColumnUpdate => ColumnUpdateNode,
    OnConflict => OnConflictNode,
    OnDuplicateKey => OnDuplicateKeyNode,
    Explain => ExplainNode,
    Using => UsingNode,
    // statements
    SelectQuery => SelectQueryNode,
    InsertQuery => InsertQueryNode,
    UpdateQuery => UpdateQueryNode,
    DeleteQuery => DeleteQueryNode,
    MergeQuery => MergeQueryNode,
    // schema
    CreateTable => CreateTableNode,
    ColumnDefinition => ColumnDefinitionNode,
    DataType => DataTypeNode,
    DefaultValue => DefaultValueNode,
    Generated => GeneratedNode,
    References => ReferencesNode,
    PrimaryKeyConstraint => PrimaryKeyConstraintNode,
    UniqueConstraint => UniqueConstraintNode,
    CheckConstraint => CheckConstraintNode,
    ForeignKeyConstraint => ForeignKeyConstraintNode,
    DropTable => DropTableNode,
    CreateIndex => CreateIndexNode,
    DropIndex => DropIndexNode,
    CreateSchema => CreateSchemaNode,
    DropSchema => DropSchemaNode,
    CreateView => CreateViewNode,
    DropView => DropViewNode,
    AlterTable => AlterTableNode,
    AddColumn => AddColumnNode,
    DropColumn => DropColumnNode,
    RenameColumn => RenameColumnNode,
    AlterColumn => AlterColumnNode,
    AddConstraint => AddConstraintNode,
    DropConstraint => DropConstraintNode,
}

impl OperationNode {
    pub fn cast<N: Node>(&self) -> Option<&Arc<N>> {
        N::cast(self)
    }

    pub fn is<N: Node>(&self) -> bool {
        N::cast(self).is_some()
    }
}

impl NodeKind {
    /// Data-manipulation statements, the kinds that can appear as sub-queries.
    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeKind::SelectQuery
                | NodeKind::InsertQuery
                | NodeKind::UpdateQuery
                | NodeKind::DeleteQuery
                | NodeKind::MergeQuery
        )
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_cast() {
        let node = OperationNode::from(TableNode::new("person"));
        assert_eq!(node.kind(), NodeKind::Table);
        assert!(node.is::<TableNode>());
        assert!(node.cast::<ColumnNode>().is_none());
    }

    #[test]
    fn test_ptr_eq_versus_structural_eq() {
        let a = OperationNode::from(ColumnNode::new("id"));
        let b = a.clone();
        let c = OperationNode::from(ColumnNode::new("id"));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
        assert_eq!(a, c);
    }

    #[test]
    fn test_serde_roundtrip_of_select() {
        let node: OperationNode = SelectQueryNode::create(vec![TableNode::new("person").into()])
            .with_selections(vec![SelectionNode::new(SelectAllNode.into())])
            .into();
        let json = serde_json::to_string(&node).unwrap();
        let back: OperationNode = serde_json::from_str(&json).unwrap();
        assert_eq!(node, back);
    }
}
