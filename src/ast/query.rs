use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    ColumnNode, ColumnUpdateNode, ExplainNode, FetchNode, FromNode, GroupByNode, HavingNode,
    JoinNode, LimitNode, OffsetNode, OnConflictNode, OnDuplicateKeyNode, OperationNode,
    OrderByNode, ReturningNode, SelectModifierNode, SelectionNode, SetOperationNode, TableNode,
    TopNode, UsingNode, WhenNode, WhereNode, WithNode,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectQueryNode {
    pub from: Option<Arc<FromNode>>,
    pub selections: Vec<Arc<SelectionNode>>,
    pub distinct_on: Vec<OperationNode>,
    pub joins: Vec<Arc<JoinNode>>,
    pub group_by: Option<Arc<GroupByNode>>,
    pub order_by: Option<Arc<OrderByNode>>,
    #[serde(rename = "where")]
    pub where_: Option<Arc<WhereNode>>,
    pub front_modifiers: Vec<Arc<SelectModifierNode>>,
    pub end_modifiers: Vec<Arc<SelectModifierNode>>,
    pub limit: Option<Arc<LimitNode>>,
    pub offset: Option<Arc<OffsetNode>>,
    pub fetch: Option<Arc<FetchNode>>,
    pub top: Option<Arc<TopNode>>,
    pub with: Option<Arc<WithNode>>,
    pub having: Option<Arc<HavingNode>>,
    pub set_operations: Vec<Arc<SetOperationNode>>,
    pub explain: Option<Arc<ExplainNode>>,
}

impl SelectQueryNode {
    pub fn create(froms: Vec<OperationNode>) -> Self {
        Self {
            from: Some(Arc::new(FromNode { froms })),
            ..Self::default()
        }
    }

    pub fn with_selections(&self, selections: Vec<SelectionNode>) -> Self {
        let mut all = self.selections.clone();
        all.extend(selections.into_iter().map(Arc::new));
        Self {
            selections: all,
            ..self.clone()
        }
    }

    pub fn with_froms(&self, froms: Vec<OperationNode>) -> Self {
        let from = match &self.from {
            Some(from) => from.with_froms(froms),
            None => FromNode { froms },
        };
        Self {
            from: Some(Arc::new(from)),
            ..self.clone()
        }
    }

    pub fn with_distinct_on(&self, expressions: Vec<OperationNode>) -> Self {
        let mut all = self.distinct_on.clone();
        all.extend(expressions);
        Self {
            distinct_on: all,
            ..self.clone()
        }
    }

    pub fn with_front_modifier(&self, modifier: SelectModifierNode) -> Self {
        let mut all = self.front_modifiers.clone();
        all.push(Arc::new(modifier));
        Self {
            front_modifiers: all,
            ..self.clone()
        }
    }

    pub fn with_end_modifier(&self, modifier: SelectModifierNode) -> Self {
        let mut all = self.end_modifiers.clone();
        all.push(Arc::new(modifier));
        Self {
            end_modifiers: all,
            ..self.clone()
        }
    }

    pub fn with_group_by(&self, group_by: GroupByNode) -> Self {
        let mut items = self
            .group_by
            .as_ref()
            .map(|g| g.items.clone())
            .unwrap_or_default();
        items.extend(group_by.items);
        Self {
            group_by: Some(Arc::new(GroupByNode { items })),
            ..self.clone()
        }
    }

    pub fn with_having(&self, having: HavingNode) -> Self {
        Self {
            having: Some(Arc::new(having)),
            ..self.clone()
        }
    }

    pub fn with_limit(&self, limit: LimitNode) -> Self {
        Self {
            limit: Some(Arc::new(limit)),
            ..self.clone()
        }
    }

    pub fn with_offset(&self, offset: OffsetNode) -> Self {
        Self {
            offset: Some(Arc::new(offset)),
            ..self.clone()
        }
    }

    pub fn with_fetch(&self, fetch: FetchNode) -> Self {
        Self {
            fetch: Some(Arc::new(fetch)),
            ..self.clone()
        }
    }

    pub fn with_top(&self, top: TopNode) -> Self {
        Self {
            top: Some(Arc::new(top)),
            ..self.clone()
        }
    }

    pub fn with_set_operation(&self, operation: SetOperationNode) -> Self {
        let mut all = self.set_operations.clone();
        all.push(Arc::new(operation));
        Self {
            set_operations: all,
            ..self.clone()
        }
    }

    pub fn with_explain(&self, explain: ExplainNode) -> Self {
        Self {
            explain: Some(Arc::new(explain)),
            ..self.clone()
        }
    }

    pub fn without_selections(&self) -> Self {
        Self {
            selections: Vec::new(),
            ..self.clone()
        }
    }

    pub fn without_limit(&self) -> Self {
        Self {
            limit: None,
            ..self.clone()
        }
    }

    pub fn without_offset(&self) -> Self {
        Self {
            offset: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsertQueryNode {
    /// `None` inside a merge branch (`then insert ...`).
    pub into: Option<Arc<TableNode>>,
    pub columns: Vec<Arc<ColumnNode>>,
    /// A `Values` node or a sub-select.
    pub values: Option<OperationNode>,
    pub returning: Option<Arc<ReturningNode>>,
    pub on_conflict: Option<Arc<OnConflictNode>>,
    pub on_duplicate_key: Option<Arc<OnDuplicateKeyNode>>,
    pub with: Option<Arc<WithNode>>,
    pub ignore: bool,
    pub replace: bool,
    pub default_values: bool,
    pub explain: Option<Arc<ExplainNode>>,
}

impl InsertQueryNode {
    pub fn create(into: TableNode) -> Self {
        Self {
            into: Some(Arc::new(into)),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateQueryNode {
    /// `None` inside a merge branch (`then update set ...`).
    pub table: Option<OperationNode>,
    pub from: Option<Arc<FromNode>>,
    pub joins: Vec<Arc<JoinNode>>,
    #[serde(rename = "where")]
    pub where_: Option<Arc<WhereNode>>,
    pub updates: Vec<Arc<ColumnUpdateNode>>,
    pub returning: Option<Arc<ReturningNode>>,
    pub with: Option<Arc<WithNode>>,
    pub limit: Option<Arc<LimitNode>>,
    pub explain: Option<Arc<ExplainNode>>,
}

impl UpdateQueryNode {
    pub fn create(table: OperationNode) -> Self {
        Self {
            table: Some(table),
            ..Self::default()
        }
    }

    pub fn with_updates(&self, updates: Vec<ColumnUpdateNode>) -> Self {
        let mut all = self.updates.clone();
        all.extend(updates.into_iter().map(Arc::new));
        Self {
            updates: all,
            ..self.clone()
        }
    }

    pub fn with_froms(&self, froms: Vec<OperationNode>) -> Self {
        let from = match &self.from {
            Some(from) => from.with_froms(froms),
            None => FromNode { froms },
        };
        Self {
            from: Some(Arc::new(from)),
            ..self.clone()
        }
    }

    pub fn with_limit(&self, limit: LimitNode) -> Self {
        Self {
            limit: Some(Arc::new(limit)),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteQueryNode {
    pub from: Arc<FromNode>,
    pub using: Option<Arc<UsingNode>>,
    pub joins: Vec<Arc<JoinNode>>,
    #[serde(rename = "where")]
    pub where_: Option<Arc<WhereNode>>,
    pub returning: Option<Arc<ReturningNode>>,
    pub with: Option<Arc<WithNode>>,
    pub order_by: Option<Arc<OrderByNode>>,
    pub limit: Option<Arc<LimitNode>>,
    pub explain: Option<Arc<ExplainNode>>,
}

impl DeleteQueryNode {
    pub fn create(froms: Vec<OperationNode>) -> Self {
        Self {
            from: Arc::new(FromNode { froms }),
            ..Self::default()
        }
    }

    pub fn with_using(&self, tables: Vec<OperationNode>) -> Self {
        let mut all = self
            .using
            .as_ref()
            .map(|u| u.tables.clone())
            .unwrap_or_default();
        all.extend(tables);
        Self {
            using: Some(Arc::new(UsingNode { tables: all })),
            ..self.clone()
        }
    }

    pub fn with_order_by(&self, order_by: OrderByNode) -> Self {
        Self {
            order_by: Some(Arc::new(order_by)),
            ..self.clone()
        }
    }

    pub fn with_limit(&self, limit: LimitNode) -> Self {
        Self {
            limit: Some(Arc::new(limit)),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeQueryNode {
    /// A `Table` or an aliased table.
    pub into: OperationNode,
    pub using: Option<Arc<JoinNode>>,
    pub whens: Vec<Arc<WhenNode>>,
    pub with: Option<Arc<WithNode>>,
}

impl MergeQueryNode {
    pub fn create(into: OperationNode) -> Self {
        Self {
            into,
            using: None,
            whens: Vec::new(),
            with: None,
        }
    }

    pub fn with_using(&self, using: JoinNode) -> Self {
        Self {
            using: Some(Arc::new(using)),
            ..self.clone()
        }
    }

    pub fn with_when(&self, when: WhenNode) -> Self {
        let mut whens = self.whens.clone();
        whens.push(Arc::new(when));
        Self {
            whens,
            ..self.clone()
        }
    }
}

/// Statements that carry a `where` clause.
pub trait FilterableNode: Clone {
    fn where_node(&self) -> Option<&Arc<WhereNode>>;

    fn set_where_node(&self, where_: Option<Arc<WhereNode>>) -> Self;

    fn with_where(&self, filter: OperationNode) -> Self {
        self.set_where_node(Some(Arc::new(WhereNode::and(self.where_node(), filter))))
    }

    fn with_or_where(&self, filter: OperationNode) -> Self {
        self.set_where_node(Some(Arc::new(WhereNode::or(self.where_node(), filter))))
    }

    fn without_where(&self) -> Self {
        self.set_where_node(None)
    }
}

/// Statements that carry joins.
pub trait JoinableNode: Clone {
    fn with_join(&self, join: JoinNode) -> Self;
}

/// Statements that carry a `returning` clause.
pub trait ReturningCapableNode: Clone {
    fn returning_node(&self) -> Option<&Arc<ReturningNode>>;

    fn set_returning_node(&self, returning: Option<Arc<ReturningNode>>) -> Self;

    fn with_returning(&self, selections: Vec<SelectionNode>) -> Self {
        self.set_returning_node(Some(Arc::new(ReturningNode::with_selections(
            self.returning_node(),
            selections,
        ))))
    }
}

/// Statements that can be prefixed by a `with` clause.
pub trait WithCapableNode: Clone {
    fn set_with_node(&self, with: Option<Arc<WithNode>>) -> Self;
}

macro_rules! filterable {
    ($($node:ty),*) => {
        $(
            impl FilterableNode for $node {
                fn where_node(&self) -> Option<&Arc<WhereNode>> {
                    self.where_.as_ref()
                }

                fn set_where_node(&self, where_: Option<Arc<WhereNode>>) -> Self {
                    Self { where_, ..self.clone() }
                }
            }

            impl JoinableNode for $node {
                fn with_join(&self, join: JoinNode) -> Self {
                    let mut joins = self.joins.clone();
                    joins.push(Arc::new(join));
                    Self { joins, ..self.clone() }
                }
            }
        )*
    };
}

filterable!(SelectQueryNode, UpdateQueryNode, DeleteQueryNode);

macro_rules! returning_capable {
    ($($node:ty),*) => {
        $(
            impl ReturningCapableNode for $node {
                fn returning_node(&self) -> Option<&Arc<ReturningNode>> {
                    self.returning.as_ref()
                }

                fn set_returning_node(&self, returning: Option<Arc<ReturningNode>>) -> Self {
                    Self { returning, ..self.clone() }
                }
            }
        )*
    };
}

returning_capable!(InsertQueryNode, UpdateQueryNode, DeleteQueryNode);

macro_rules! with_capable {
    ($($node:ty),*) => {
        $(
            impl WithCapableNode for $node {
                fn set_with_node(&self, with: Option<Arc<WithNode>>) -> Self {
                    Self { with, ..self.clone() }
                }
            }
        )*
    };
}

with_capable!(
    SelectQueryNode,
    InsertQueryNode,
    UpdateQueryNode,
    DeleteQueryNode,
    MergeQueryNode
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ColumnNode, SelectAllNode, Value, ValueNode};

    #[test]
    fn test_clone_with_leaves_original_untouched() {
        let base = SelectQueryNode::create(vec![TableNode::new("person").into()]);
        let filtered = base.with_where(ValueNode::new(Value::Bool(true)).into());
        assert!(base.where_.is_none());
        assert!(filtered.where_.is_some());
        // untouched children are shared
        assert!(Arc::ptr_eq(
            base.from.as_ref().unwrap(),
            filtered.from.as_ref().unwrap()
        ));
    }

    #[test]
    fn test_second_where_is_anded() {
        let node = SelectQueryNode::default()
            .with_where(ColumnNode::new("a").into())
            .with_where(ColumnNode::new("b").into());
        let filter = &node.where_.as_ref().unwrap().where_;
        assert_eq!(filter.kind(), crate::ast::NodeKind::And);
    }

    #[test]
    fn test_selections_accumulate() {
        let node = SelectQueryNode::default()
            .with_selections(vec![SelectionNode::new(SelectAllNode.into())])
            .with_selections(vec![SelectionNode::new(ColumnNode::new("id").into())]);
        assert_eq!(node.selections.len(), 2);
    }
}
