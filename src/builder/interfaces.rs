//! Clauses shared by several statement builders.

use std::sync::Arc;

use crate::ast::{
    HavingNode, JoinNode, JoinType, ReturningNode, SelectAllNode, SelectionNode, WhereNode,
};
use crate::error::QuarryResult;
use crate::expression::Expr;
use crate::parser::{
    Operand, ReferenceExpression, SelectExpression, TableExpression, ValueExpression,
    parse_binary_operation,
};

use super::join::JoinBuilder;

/// `where` for select, update and delete.
pub trait WhereInterface: Sized {
    fn where_node(&self) -> Option<&Arc<WhereNode>>;

    fn set_where_node(&self, where_: Option<Arc<WhereNode>>) -> Self;

    /// `where <lhs> <op> <rhs>`; a second call is and-ed with the first.
    ///
    /// `rhs` is a value, a list (for `in`), an expression or a sub-query.
    /// `= null` and `!= true` style comparisons become `is` / `is not`.
    fn where_(
        &self,
        lhs: impl ReferenceExpression,
        operator: &str,
        rhs: impl ValueExpression,
    ) -> QuarryResult<Self> {
        let filter = parse_binary_operation(lhs.into_reference()?, operator, rhs.into_operand()?)?;
        Ok(self.set_where_node(Some(Arc::new(WhereNode::and(self.where_node(), filter)))))
    }

    /// Both sides are references: `where "pet"."owner_id" = "person"."id"`.
    fn where_ref(
        &self,
        lhs: impl ReferenceExpression,
        operator: &str,
        rhs: impl ReferenceExpression,
    ) -> QuarryResult<Self> {
        let filter = parse_binary_operation(
            lhs.into_reference()?,
            operator,
            Operand::Node(rhs.into_reference()?),
        )?;
        Ok(self.set_where_node(Some(Arc::new(WhereNode::and(self.where_node(), filter)))))
    }

    /// Any boolean expression, e.g. built with [`or`](crate::expression::or).
    fn where_expr(&self, filter: Expr) -> Self {
        self.set_where_node(Some(Arc::new(WhereNode::and(
            self.where_node(),
            filter.into_node(),
        ))))
    }

    /// Like `where_expr`, or-ed with the filters so far.
    fn or_where_expr(&self, filter: Expr) -> Self {
        self.set_where_node(Some(Arc::new(WhereNode::or(
            self.where_node(),
            filter.into_node(),
        ))))
    }

    fn clear_where(&self) -> Self {
        self.set_where_node(None)
    }
}

/// `having` for selects.
pub trait HavingInterface: Sized {
    fn having_node(&self) -> Option<&Arc<HavingNode>>;

    fn set_having_node(&self, having: Option<Arc<HavingNode>>) -> Self;

    fn having(
        &self,
        lhs: impl ReferenceExpression,
        operator: &str,
        rhs: impl ValueExpression,
    ) -> QuarryResult<Self> {
        let filter = parse_binary_operation(lhs.into_reference()?, operator, rhs.into_operand()?)?;
        Ok(self.set_having_node(Some(Arc::new(HavingNode::and(self.having_node(), filter)))))
    }

    fn having_ref(
        &self,
        lhs: impl ReferenceExpression,
        operator: &str,
        rhs: impl ReferenceExpression,
    ) -> QuarryResult<Self> {
        let filter = parse_binary_operation(
            lhs.into_reference()?,
            operator,
            Operand::Node(rhs.into_reference()?),
        )?;
        Ok(self.set_having_node(Some(Arc::new(HavingNode::and(self.having_node(), filter)))))
    }

    fn having_expr(&self, filter: Expr) -> Self {
        self.set_having_node(Some(Arc::new(HavingNode::and(
            self.having_node(),
            filter.into_node(),
        ))))
    }

    fn clear_having(&self) -> Self {
        self.set_having_node(None)
    }
}

/// Joins for select, update and delete.
///
/// The simple forms join on `k1 = k2`; the `_with` forms hand a
/// [`JoinBuilder`] to a callback for arbitrary `on` clauses.
pub trait JoinInterface: Sized {
    fn with_join_node(&self, join: JoinNode) -> Self;

    fn inner_join(&self, table: impl TableExpression, k1: &str, k2: &str) -> QuarryResult<Self> {
        join_on_keys(self, JoinType::Inner, table, k1, k2)
    }

    fn left_join(&self, table: impl TableExpression, k1: &str, k2: &str) -> QuarryResult<Self> {
        join_on_keys(self, JoinType::Left, table, k1, k2)
    }

    fn right_join(&self, table: impl TableExpression, k1: &str, k2: &str) -> QuarryResult<Self> {
        join_on_keys(self, JoinType::Right, table, k1, k2)
    }

    fn full_join(&self, table: impl TableExpression, k1: &str, k2: &str) -> QuarryResult<Self> {
        join_on_keys(self, JoinType::Full, table, k1, k2)
    }

    fn cross_join(&self, table: impl TableExpression) -> QuarryResult<Self> {
        Ok(self.with_join_node(JoinNode::new(
            JoinType::Cross,
            table.into_table_expression()?,
        )))
    }

    fn inner_join_with<F>(&self, table: impl TableExpression, f: F) -> QuarryResult<Self>
    where
        F: FnOnce(JoinBuilder) -> QuarryResult<JoinBuilder>,
    {
        join_with(self, JoinType::Inner, table, f)
    }

    fn left_join_with<F>(&self, table: impl TableExpression, f: F) -> QuarryResult<Self>
    where
        F: FnOnce(JoinBuilder) -> QuarryResult<JoinBuilder>,
    {
        join_with(self, JoinType::Left, table, f)
    }

    fn right_join_with<F>(&self, table: impl TableExpression, f: F) -> QuarryResult<Self>
    where
        F: FnOnce(JoinBuilder) -> QuarryResult<JoinBuilder>,
    {
        join_with(self, JoinType::Right, table, f)
    }

    fn full_join_with<F>(&self, table: impl TableExpression, f: F) -> QuarryResult<Self>
    where
        F: FnOnce(JoinBuilder) -> QuarryResult<JoinBuilder>,
    {
        join_with(self, JoinType::Full, table, f)
    }

    /// `inner join lateral (<sub-query>) as alias on ...`
    fn inner_join_lateral_with<F>(&self, table: impl TableExpression, f: F) -> QuarryResult<Self>
    where
        F: FnOnce(JoinBuilder) -> QuarryResult<JoinBuilder>,
    {
        join_with(self, JoinType::LateralInner, table, f)
    }

    fn left_join_lateral_with<F>(&self, table: impl TableExpression, f: F) -> QuarryResult<Self>
    where
        F: FnOnce(JoinBuilder) -> QuarryResult<JoinBuilder>,
    {
        join_with(self, JoinType::LateralLeft, table, f)
    }
}

fn join_on_keys<B: JoinInterface>(
    builder: &B,
    join_type: JoinType,
    table: impl TableExpression,
    k1: &str,
    k2: &str,
) -> QuarryResult<B> {
    join_with(builder, join_type, table, |join| join.on_ref(k1, "=", k2))
}

fn join_with<B, F>(
    builder: &B,
    join_type: JoinType,
    table: impl TableExpression,
    f: F,
) -> QuarryResult<B>
where
    B: JoinInterface,
    F: FnOnce(JoinBuilder) -> QuarryResult<JoinBuilder>,
{
    let join = f(JoinBuilder::new(join_type, table.into_table_expression()?))?;
    Ok(builder.with_join_node(join.into_node()))
}

/// `returning` for insert, update and delete (`output` is not supported).
pub trait ReturningInterface: Sized {
    fn returning_node(&self) -> Option<&Arc<ReturningNode>>;

    fn set_returning_node(&self, returning: Option<Arc<ReturningNode>>) -> Self;

    fn returning<I, S>(&self, selections: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: SelectExpression,
    {
        let selections = selections
            .into_iter()
            .map(|s| Ok(SelectionNode::new(s.into_selection()?)))
            .collect::<QuarryResult<Vec<_>>>()?;
        Ok(self.set_returning_node(Some(Arc::new(ReturningNode::with_selections(
            self.returning_node(),
            selections,
        )))))
    }

    fn returning_all(&self) -> Self {
        self.set_returning_node(Some(Arc::new(ReturningNode::with_selections(
            self.returning_node(),
            vec![SelectionNode::new(SelectAllNode.into())],
        ))))
    }

    fn clear_returning(&self) -> Self {
        self.set_returning_node(None)
    }
}

/// Implements the clause interfaces of a builder over the node traits of
/// its AST record. The builder needs a `node: Arc<Node>` field.
macro_rules! node_interfaces {
    (where: $($builder:ty),*) => {
        $(
            impl $crate::builder::WhereInterface for $builder {
                fn where_node(&self) -> Option<&std::sync::Arc<$crate::ast::WhereNode>> {
                    $crate::ast::FilterableNode::where_node(self.node.as_ref())
                }

                fn set_where_node(&self, where_: Option<std::sync::Arc<$crate::ast::WhereNode>>) -> Self {
                    self.with_node($crate::ast::FilterableNode::set_where_node(self.node.as_ref(), where_))
                }
            }

            impl $crate::builder::JoinInterface for $builder {
                fn with_join_node(&self, join: $crate::ast::JoinNode) -> Self {
                    self.with_node($crate::ast::JoinableNode::with_join(self.node.as_ref(), join))
                }
            }
        )*
    };
    (returning: $($builder:ty),*) => {
        $(
            impl $crate::builder::ReturningInterface for $builder {
                fn returning_node(&self) -> Option<&std::sync::Arc<$crate::ast::ReturningNode>> {
                    $crate::ast::ReturningCapableNode::returning_node(self.node.as_ref())
                }

                fn set_returning_node(
                    &self,
                    returning: Option<std::sync::Arc<$crate::ast::ReturningNode>>,
                ) -> Self {
                    self.with_node($crate::ast::ReturningCapableNode::set_returning_node(
                        self.node.as_ref(),
                        returning,
                    ))
                }
            }
        )*
    };
}

pub(crate) use node_interfaces;
