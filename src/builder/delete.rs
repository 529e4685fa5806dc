use std::sync::Arc;

use crate::ast::{
    DeleteQueryNode, ExplainNode, LimitNode, OperationNode, OrderByItemNode, OrderByNode,
    OrderDirection, WithNode,
};
use crate::error::QuarryResult;
use crate::expression::Expr;
use crate::parser::{TableExpression, ValueExpression, parse_order_by};

use super::interfaces::node_interfaces;
use super::{DeleteResult, QueryBuilderProps, ToOperationNode};

/// `delete` statements.
///
/// ```rust,ignore
/// let result = db
///     .delete_from("pet")?
///     .where_("species", "=", "dog")?
///     .execute()
///     .await?;
/// ```
#[derive(Clone)]
pub struct DeleteQueryBuilder {
    pub(crate) props: QueryBuilderProps,
    node: Arc<DeleteQueryNode>,
}

impl DeleteQueryBuilder {
    pub(crate) fn create(
        props: QueryBuilderProps,
        froms: Vec<OperationNode>,
        with: Option<Arc<WithNode>>,
    ) -> Self {
        Self {
            props,
            node: Arc::new(DeleteQueryNode {
                with,
                ..DeleteQueryNode::create(froms)
            }),
        }
    }

    fn with_node(&self, node: DeleteQueryNode) -> Self {
        Self {
            props: self.props.clone(),
            node: Arc::new(node),
        }
    }

    pub fn node(&self) -> &Arc<DeleteQueryNode> {
        &self.node
    }

    /// PostgreSQL and MySQL `delete from a using b, c`.
    pub fn using<I, T>(&self, tables: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: TableExpression,
    {
        let tables = tables
            .into_iter()
            .map(TableExpression::into_table_expression)
            .collect::<QuarryResult<Vec<_>>>()?;
        Ok(self.with_node(self.node.with_using(tables)))
    }

    /// MySQL single-table `delete ... order by`.
    pub fn order_by(&self, order_by: &str) -> QuarryResult<Self> {
        Ok(self.with_order_by_item(parse_order_by(order_by)?))
    }

    pub fn order_by_expr(&self, expr: Expr, direction: Option<OrderDirection>) -> Self {
        self.with_order_by_item(OrderByItemNode::new(expr.into_node(), direction))
    }

    fn with_order_by_item(&self, item: OrderByItemNode) -> Self {
        self.with_node(
            self.node
                .with_order_by(OrderByNode::with_items(self.node.order_by.as_ref(), vec![item])),
        )
    }

    pub fn limit(&self, limit: impl ValueExpression) -> QuarryResult<Self> {
        Ok(self.with_node(self.node.with_limit(LimitNode {
            limit: limit.into_value_node()?,
        })))
    }

    pub fn explain(&self) -> Self {
        self.with_node(DeleteQueryNode {
            explain: Some(Arc::new(ExplainNode { options: None })),
            ..self.node.as_ref().clone()
        })
    }

    pub async fn execute(&self) -> QuarryResult<DeleteResult> {
        Ok(self.execute_raw().await?.into())
    }
}

node_interfaces!(where: DeleteQueryBuilder);
node_interfaces!(returning: DeleteQueryBuilder);

impl ToOperationNode for DeleteQueryBuilder {
    fn to_operation_node(&self) -> OperationNode {
        self.node.clone().into()
    }
}
