use std::sync::Arc;

use crate::ast::{
    AggregateFunctionNode, AliasNode, OperationNode, OrderByItemNode, OrderByNode, OverNode,
    PartitionByItemNode, PartitionByNode, WhereNode,
};
use crate::builder::ToOperationNode;
use crate::error::QuarryResult;
use crate::parser::{ReferenceExpression, parse_order_by};

use super::Expr;

/// Aggregate and window function calls.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateBuilder {
    node: AggregateFunctionNode,
}

impl AggregateBuilder {
    pub(crate) fn new(func: impl Into<String>, aggregated: Vec<OperationNode>) -> Self {
        Self {
            node: AggregateFunctionNode::new(func, aggregated),
        }
    }

    /// `count(distinct x)`
    pub fn distinct(&self) -> Self {
        Self {
            node: AggregateFunctionNode {
                distinct: true,
                ..self.node.clone()
            },
        }
    }

    /// `... filter (where <expr>)`
    pub fn filter_where(&self, filter: Expr) -> Self {
        Self {
            node: AggregateFunctionNode {
                filter: Some(Arc::new(WhereNode::and(
                    self.node.filter.as_ref(),
                    filter.into_node(),
                ))),
                ..self.node.clone()
            },
        }
    }

    /// Ordering inside the aggregate, e.g. `string_agg(x, ',' order by x)`.
    pub fn order_by(&self, order_by: &str) -> QuarryResult<Self> {
        let item = parse_order_by(order_by)?;
        Ok(Self {
            node: AggregateFunctionNode {
                order_by: Some(Arc::new(OrderByNode::with_items(
                    self.node.order_by.as_ref(),
                    vec![item],
                ))),
                ..self.node.clone()
            },
        })
    }

    /// `... over (...)`; the closure configures partitioning and ordering.
    pub fn over<F>(&self, f: F) -> QuarryResult<Self>
    where
        F: FnOnce(OverBuilder) -> QuarryResult<OverBuilder>,
    {
        let over = f(OverBuilder::default())?;
        Ok(Self {
            node: AggregateFunctionNode {
                over: Some(Arc::new(over.node)),
                ..self.node.clone()
            },
        })
    }

    pub fn as_(&self, alias: &str) -> Expr {
        Expr::new(AliasNode::new(self.to_operation_node(), alias))
    }

    pub fn to_expr(&self) -> Expr {
        Expr::new(self.node.clone())
    }
}

impl ToOperationNode for AggregateBuilder {
    fn to_operation_node(&self) -> OperationNode {
        self.node.clone().into()
    }
}

impl From<AggregateBuilder> for Expr {
    fn from(builder: AggregateBuilder) -> Self {
        Expr::new(builder.node)
    }
}

/// Window specification: `over (partition by ... order by ...)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverBuilder {
    node: OverNode,
}

impl OverBuilder {
    pub fn partition_by<I, R>(self, references: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = R>,
        R: ReferenceExpression,
    {
        let mut items = self
            .node
            .partition_by
            .as_ref()
            .map(|p| p.items.clone())
            .unwrap_or_default();
        for reference in references {
            items.push(Arc::new(PartitionByItemNode {
                partition_by: reference.into_reference()?,
            }));
        }
        Ok(Self {
            node: OverNode {
                partition_by: Some(Arc::new(PartitionByNode { items })),
                ..self.node
            },
        })
    }

    pub fn order_by(self, order_by: &str) -> QuarryResult<Self> {
        let item: OrderByItemNode = parse_order_by(order_by)?;
        Ok(Self {
            node: OverNode {
                order_by: Some(Arc::new(OrderByNode::with_items(
                    self.node.order_by.as_ref(),
                    vec![item],
                ))),
                ..self.node
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{agg, count};

    #[test]
    fn test_over_accumulates() {
        let rank = agg("rank", vec![])
            .over(|o| o.partition_by(["department"])?.order_by("salary desc"))
            .unwrap();
        let over = rank.node.over.as_ref().unwrap();
        assert_eq!(over.partition_by.as_ref().unwrap().items.len(), 1);
        assert_eq!(over.order_by.as_ref().unwrap().items.len(), 1);
    }

    #[test]
    fn test_distinct_does_not_touch_original() {
        let plain = count("id").unwrap();
        let distinct = plain.distinct();
        assert!(!plain.node.distinct);
        assert!(distinct.node.distinct);
    }
}
