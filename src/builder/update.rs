use std::sync::Arc;

use serde::Serialize;

use crate::ast::{
    ColumnUpdateNode, ExplainNode, LimitNode, OperationNode, UpdateQueryNode, Value, ValueNode,
    WithNode,
};
use crate::error::{QuarryError, QuarryResult};
use crate::expression::Expr;
use crate::parser::{TableExpression, ValueExpression, parse_reference};

use super::interfaces::node_interfaces;
use super::{QueryBuilderProps, ToOperationNode, UpdateResult};

/// `update` statements.
///
/// ```rust,ignore
/// let result = db
///     .update_table("person")?
///     .set("first_name", "Jennifer")?
///     .where_("id", "=", 1)?
///     .execute()
///     .await?;
/// ```
#[derive(Clone)]
pub struct UpdateQueryBuilder {
    pub(crate) props: QueryBuilderProps,
    node: Arc<UpdateQueryNode>,
}

impl UpdateQueryBuilder {
    pub(crate) fn create(
        props: QueryBuilderProps,
        table: OperationNode,
        with: Option<Arc<WithNode>>,
    ) -> Self {
        Self {
            props,
            node: Arc::new(UpdateQueryNode {
                with,
                ..UpdateQueryNode::create(table)
            }),
        }
    }

    fn with_node(&self, node: UpdateQueryNode) -> Self {
        Self {
            props: self.props.clone(),
            node: Arc::new(node),
        }
    }

    pub fn node(&self) -> &Arc<UpdateQueryNode> {
        &self.node
    }

    /// `set <column> = <value>`. The column may be table-qualified for
    /// MySQL multi-table updates.
    pub fn set(&self, column: &str, value: impl ValueExpression) -> QuarryResult<Self> {
        Ok(self.with_node(self.node.with_updates(vec![ColumnUpdateNode {
            column: parse_reference(column)?,
            value: value.into_value_node()?,
        }])))
    }

    pub fn set_all<K: AsRef<str>>(&self, updates: Vec<(K, Expr)>) -> QuarryResult<Self> {
        let updates = updates
            .into_iter()
            .map(|(column, value)| {
                Ok(ColumnUpdateNode {
                    column: parse_reference(column.as_ref())?,
                    value: value.into_node(),
                })
            })
            .collect::<QuarryResult<Vec<_>>>()?;
        Ok(self.with_node(self.node.with_updates(updates)))
    }

    /// Every field of a value that serializes to a JSON object.
    pub fn set_from<T: Serialize>(&self, row: &T) -> QuarryResult<Self> {
        let object = match serde_json::to_value(row)? {
            serde_json::Value::Object(object) => object,
            other => {
                return Err(QuarryError::Validation(format!(
                    "update values must serialize to an object, got {}",
                    other
                )));
            }
        };
        let updates = object
            .into_iter()
            .map(|(column, value)| {
                Ok(ColumnUpdateNode {
                    column: parse_reference(&column)?,
                    value: ValueNode::new(Value::from_json(value)).into(),
                })
            })
            .collect::<QuarryResult<Vec<_>>>()?;
        Ok(self.with_node(self.node.with_updates(updates)))
    }

    /// PostgreSQL `update ... set ... from <tables>`.
    pub fn from<I, T>(&self, froms: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: TableExpression,
    {
        let froms = froms
            .into_iter()
            .map(TableExpression::into_table_expression)
            .collect::<QuarryResult<Vec<_>>>()?;
        Ok(self.with_node(self.node.with_froms(froms)))
    }

    /// MySQL `update ... limit n`.
    pub fn limit(&self, limit: impl ValueExpression) -> QuarryResult<Self> {
        Ok(self.with_node(self.node.with_limit(LimitNode {
            limit: limit.into_value_node()?,
        })))
    }

    pub fn explain(&self) -> Self {
        self.with_node(UpdateQueryNode {
            explain: Some(Arc::new(ExplainNode { options: None })),
            ..self.node.as_ref().clone()
        })
    }

    pub async fn execute(&self) -> QuarryResult<UpdateResult> {
        Ok(self.execute_raw().await?.into())
    }
}

node_interfaces!(where: UpdateQueryBuilder);
node_interfaces!(returning: UpdateQueryBuilder);

impl ToOperationNode for UpdateQueryBuilder {
    fn to_operation_node(&self) -> OperationNode {
        self.node.clone().into()
    }
}
