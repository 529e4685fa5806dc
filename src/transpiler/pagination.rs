//! Rewrites `limit` into the pagination shape of dialects without it.

use std::sync::Arc;

use crate::ast::{
    BinaryOperationNode, FetchModifier, FetchNode, Operator, OperationNode, OrderByItemNode,
    OrderByNode, RawNode, SelectQueryNode, TopNode, Value, ValueNode,
};
use crate::error::QuarryResult;
use crate::transformer::{Transformer, transform};

use super::traits::PaginationStyle;

pub(crate) struct PaginationRewriter {
    style: PaginationStyle,
    bit_comparisons: bool,
}

impl PaginationRewriter {
    pub(crate) fn new(style: PaginationStyle) -> Self {
        Self {
            style,
            bit_comparisons: false,
        }
    }

    /// Also turn `is true` / `is not false` into `= 1` / `<> 0`.
    pub(crate) fn with_bit_comparisons(self) -> Self {
        Self {
            bit_comparisons: true,
            ..self
        }
    }

    pub(crate) fn rewrite(mut self, node: &OperationNode) -> QuarryResult<OperationNode> {
        transform(&mut self, node)
    }

    fn paginate(&self, select: &SelectQueryNode) -> Option<OperationNode> {
        match self.style {
            PaginationStyle::LimitOffset => None,
            PaginationStyle::FetchNext => {
                let limit = select.limit.as_ref()?;
                if select.fetch.is_some() {
                    return None;
                }
                Some(
                    SelectQueryNode {
                        fetch: Some(Arc::new(FetchNode {
                            row_count: limit.limit.clone(),
                            modifier: FetchModifier::Only,
                        })),
                        limit: None,
                        ..select.clone()
                    }
                    .into(),
                )
            }
            PaginationStyle::TopOrFetch => {
                if select.limit.is_none() && select.offset.is_none() {
                    return None;
                }
                let mut rewritten = select.clone();
                if select.offset.is_none() {
                    if let (Some(limit), None) = (&select.limit, &select.top) {
                        rewritten.top = Some(Arc::new(TopNode {
                            expression: limit.limit.clone(),
                            modifier: None,
                        }));
                        rewritten.limit = None;
                    }
                } else {
                    if let (Some(limit), None) = (&select.limit, &select.fetch) {
                        rewritten.fetch = Some(Arc::new(FetchNode {
                            row_count: limit.limit.clone(),
                            modifier: FetchModifier::Only,
                        }));
                        rewritten.limit = None;
                    }
                    // offset requires an order by
                    if rewritten.order_by.is_none() {
                        rewritten.order_by = Some(Arc::new(OrderByNode::with_items(
                            None,
                            vec![OrderByItemNode::new(RawNode::sql("(select null)").into(), None)],
                        )));
                    }
                }
                Some(rewritten.into())
            }
        }
    }
}

fn bit_comparison(op: &BinaryOperationNode) -> Option<OperationNode> {
    let operator = match op.operator.operator {
        Operator::Is => Operator::Eq,
        Operator::IsNot => Operator::NotEqual,
        _ => return None,
    };
    let value = op.right.cast::<ValueNode>()?;
    let Value::Bool(b) = value.value else {
        return None;
    };
    Some(
        BinaryOperationNode::new(
            op.left.clone(),
            operator,
            ValueNode::immediate(i32::from(b)).into(),
        )
        .into(),
    )
}

impl Transformer for PaginationRewriter {
    fn transform_node(&mut self, node: OperationNode, _: &[OperationNode]) -> OperationNode {
        let rewritten = match &node {
            OperationNode::SelectQuery(select) => self.paginate(select),
            OperationNode::BinaryOperation(op) if self.bit_comparisons => bit_comparison(op),
            _ => None,
        };
        rewritten.unwrap_or(node)
    }
}
