use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    AndNode, ColumnNode, FetchModifier, IdentifierNode, JoinType, NullsOrder, OperationNode,
    OrNode, OrderDirection, SelectModifier, SetOperator, TableNode, TopModifier,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionNode {
    pub selection: OperationNode,
}

impl SelectionNode {
    pub fn new(selection: OperationNode) -> Self {
        Self { selection }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FromNode {
    pub froms: Vec<OperationNode>,
}

impl FromNode {
    pub fn with_froms(&self, froms: Vec<OperationNode>) -> Self {
        let mut all = self.froms.clone();
        all.extend(froms);
        Self { froms: all }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinNode {
    pub join_type: JoinType,
    pub table: OperationNode,
    pub on: Option<Arc<OnNode>>,
}

impl JoinNode {
    pub fn new(join_type: JoinType, table: OperationNode) -> Self {
        Self {
            join_type,
            table,
            on: None,
        }
    }

    /// Adds `filter` to the `on` clause with `and`.
    pub fn with_on(&self, filter: OperationNode) -> Self {
        let on = match &self.on {
            Some(on) => AndNode {
                left: on.on.clone(),
                right: filter,
            }
            .into(),
            None => filter,
        };
        Self {
            on: Some(Arc::new(OnNode { on })),
            ..self.clone()
        }
    }

    /// Adds `filter` to the `on` clause with `or`.
    pub fn with_or_on(&self, filter: OperationNode) -> Self {
        let on = match &self.on {
            Some(on) => OrNode {
                left: on.on.clone(),
                right: filter,
            }
            .into(),
            None => filter,
        };
        Self {
            on: Some(Arc::new(OnNode { on })),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnNode {
    pub on: OperationNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereNode {
    #[serde(rename = "where")]
    pub where_: OperationNode,
}

impl WhereNode {
    pub fn new(filter: OperationNode) -> Self {
        Self { where_: filter }
    }

    /// `existing and filter`, or just `filter`.
    pub fn and(existing: Option<&Arc<WhereNode>>, filter: OperationNode) -> Self {
        match existing {
            Some(w) => Self::new(
                AndNode {
                    left: w.where_.clone(),
                    right: filter,
                }
                .into(),
            ),
            None => Self::new(filter),
        }
    }

    /// `existing or filter`, or just `filter`.
    pub fn or(existing: Option<&Arc<WhereNode>>, filter: OperationNode) -> Self {
        match existing {
            Some(w) => Self::new(
                OrNode {
                    left: w.where_.clone(),
                    right: filter,
                }
                .into(),
            ),
            None => Self::new(filter),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HavingNode {
    pub having: OperationNode,
}

impl HavingNode {
    pub fn and(existing: Option<&Arc<HavingNode>>, filter: OperationNode) -> Self {
        match existing {
            Some(h) => Self {
                having: AndNode {
                    left: h.having.clone(),
                    right: filter,
                }
                .into(),
            },
            None => Self { having: filter },
        }
    }

    pub fn or(existing: Option<&Arc<HavingNode>>, filter: OperationNode) -> Self {
        match existing {
            Some(h) => Self {
                having: OrNode {
                    left: h.having.clone(),
                    right: filter,
                }
                .into(),
            },
            None => Self { having: filter },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupByNode {
    pub items: Vec<Arc<GroupByItemNode>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupByItemNode {
    pub group_by: OperationNode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderByNode {
    pub items: Vec<Arc<OrderByItemNode>>,
}

impl OrderByNode {
    pub fn with_items(existing: Option<&Arc<OrderByNode>>, items: Vec<OrderByItemNode>) -> Self {
        let mut all = existing.map(|o| o.items.clone()).unwrap_or_default();
        all.extend(items.into_iter().map(Arc::new));
        Self { items: all }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByItemNode {
    pub order_by: OperationNode,
    pub direction: Option<OrderDirection>,
    pub nulls: Option<NullsOrder>,
}

impl OrderByItemNode {
    pub fn new(order_by: OperationNode, direction: Option<OrderDirection>) -> Self {
        Self {
            order_by,
            direction,
            nulls: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitNode {
    pub limit: OperationNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetNode {
    pub offset: OperationNode,
}

/// `fetch next <n> rows only|with ties`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchNode {
    pub row_count: OperationNode,
    pub modifier: FetchModifier,
}

/// `top(<n>) [percent] [with ties]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopNode {
    pub expression: OperationNode,
    pub modifier: Option<TopModifier>,
}

/// A known modifier, or raw SQL when `modifier` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectModifierNode {
    pub modifier: Option<SelectModifier>,
    pub raw: Option<OperationNode>,
    /// Tables named by `for update of ...`.
    pub of: Vec<OperationNode>,
}

impl SelectModifierNode {
    pub fn new(modifier: SelectModifier) -> Self {
        Self {
            modifier: Some(modifier),
            raw: None,
            of: Vec::new(),
        }
    }

    pub fn raw(raw: OperationNode) -> Self {
        Self {
            modifier: None,
            raw: Some(raw),
            of: Vec::new(),
        }
    }

    /// Raw modifiers sort after every known one.
    pub fn priority(&self) -> u8 {
        self.modifier.map(|m| m.priority()).unwrap_or(3)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetOperationNode {
    pub operator: SetOperator,
    pub expression: OperationNode,
    pub all: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WithNode {
    pub expressions: Vec<Arc<CommonTableExpressionNode>>,
    pub recursive: bool,
}

impl WithNode {
    pub fn with_expression(&self, expression: CommonTableExpressionNode) -> Self {
        let mut expressions = self.expressions.clone();
        expressions.push(Arc::new(expression));
        Self {
            expressions,
            recursive: self.recursive,
        }
    }

    /// Names of the tables this clause defines.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.expressions.iter().map(|cte| cte.name.table.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonTableExpressionNode {
    pub name: Arc<CommonTableExpressionNameNode>,
    /// `as materialized` / `as not materialized`
    pub materialized: Option<bool>,
    pub expression: OperationNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonTableExpressionNameNode {
    pub table: Arc<TableNode>,
    pub columns: Vec<Arc<ColumnNode>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturningNode {
    pub selections: Vec<Arc<SelectionNode>>,
}

impl ReturningNode {
    pub fn with_selections(existing: Option<&Arc<ReturningNode>>, selections: Vec<SelectionNode>) -> Self {
        let mut all = existing.map(|r| r.selections.clone()).unwrap_or_default();
        all.extend(selections.into_iter().map(Arc::new));
        Self { selections: all }
    }
}

/// `column = value` inside `set` lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnUpdateNode {
    pub column: OperationNode,
    pub value: OperationNode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnConflictNode {
    pub columns: Vec<Arc<ColumnNode>>,
    pub constraint: Option<Arc<IdentifierNode>>,
    pub index_expression: Option<OperationNode>,
    pub index_where: Option<Arc<WhereNode>>,
    pub updates: Vec<Arc<ColumnUpdateNode>>,
    pub update_where: Option<Arc<WhereNode>>,
    pub do_nothing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnDuplicateKeyNode {
    pub updates: Vec<Arc<ColumnUpdateNode>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplainNode {
    pub options: Option<OperationNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsingNode {
    pub tables: Vec<OperationNode>,
}
