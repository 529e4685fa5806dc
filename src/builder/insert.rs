use std::sync::Arc;

use serde::Serialize;

use crate::ast::{
    ColumnNode, ColumnUpdateNode, DefaultInsertValueNode, ExplainNode, InsertQueryNode,
    OnConflictNode, OnDuplicateKeyNode, OperationNode, ReferenceNode, TableNode, Value,
    ValueListNode, ValueNode, ValuesNode, WhereNode, WithNode,
};
use crate::error::{QuarryError, QuarryResult};
use crate::expression::Expr;
use crate::parser::{
    ReferenceExpression, ValueExpression, parse_binary_operation, parse_column, parse_identifier,
};

use super::interfaces::node_interfaces;
use super::{InsertResult, QueryBuilderProps, ToOperationNode};

/// `insert` and `replace` statements.
///
/// ```rust,ignore
/// let result = db
///     .insert_into("person")?
///     .values(vec![
///         vec![("first_name", val("Jennifer")), ("age", val(30))],
///         vec![("first_name", val("Arnold"))],
///     ])?
///     .execute()
///     .await?;
/// ```
#[derive(Clone)]
pub struct InsertQueryBuilder {
    pub(crate) props: QueryBuilderProps,
    node: Arc<InsertQueryNode>,
}

impl InsertQueryBuilder {
    pub(crate) fn create(
        props: QueryBuilderProps,
        into: TableNode,
        replace: bool,
        with: Option<Arc<WithNode>>,
    ) -> Self {
        Self {
            props,
            node: Arc::new(InsertQueryNode {
                replace,
                with,
                ..InsertQueryNode::create(into)
            }),
        }
    }

    fn with_node(&self, node: InsertQueryNode) -> Self {
        Self {
            props: self.props.clone(),
            node: Arc::new(node),
        }
    }

    pub fn node(&self) -> &Arc<InsertQueryNode> {
        &self.node
    }

    /// One or more rows of `(column, value)` pairs.
    ///
    /// The column list is the union of every row's columns, in order of
    /// first appearance; a row missing a column gets `default` there.
    pub fn values<K: AsRef<str>>(&self, rows: Vec<Vec<(K, Expr)>>) -> QuarryResult<Self> {
        let rows: Vec<Vec<(String, OperationNode)>> = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(column, value)| (column.as_ref().to_string(), value.into_node()))
                    .collect()
            })
            .collect();
        self.with_rows(rows)
    }

    /// Rows serialized with serde. Each must serialize to a JSON object.
    pub fn values_from<T: Serialize>(&self, rows: &[T]) -> QuarryResult<Self> {
        let rows: Vec<Vec<(String, OperationNode)>> = rows
            .iter()
            .map(|row| match serde_json::to_value(row)? {
                serde_json::Value::Object(object) => Ok(object
                    .into_iter()
                    .map(|(column, value)| {
                        (column, ValueNode::new(Value::from_json(value)).into())
                    })
                    .collect::<Vec<_>>()),
                other => Err(QuarryError::Validation(format!(
                    "insert rows must serialize to objects, got {}",
                    other
                ))),
            })
            .collect::<QuarryResult<Vec<_>>>()?;
        self.with_rows(rows)
    }

    fn with_rows(&self, rows: Vec<Vec<(String, OperationNode)>>) -> QuarryResult<Self> {
        if rows.is_empty() {
            return Err(QuarryError::Validation(
                "insert needs at least one row of values".to_string(),
            ));
        }
        let (columns, values) = parse_insert_rows(rows);
        Ok(self.with_node(InsertQueryNode {
            columns,
            values: Some(values.into()),
            default_values: false,
            ..self.node.as_ref().clone()
        }))
    }

    /// Explicit column list, used with [`expression`](Self::expression).
    pub fn columns<I, S>(&self, columns: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns = columns
            .into_iter()
            .map(|c| Ok(Arc::new(parse_column(c.as_ref())?)))
            .collect::<QuarryResult<Vec<_>>>()?;
        Ok(self.with_node(InsertQueryNode {
            columns,
            ..self.node.as_ref().clone()
        }))
    }

    /// `insert into t (cols) <select ...>`
    pub fn expression(&self, expression: &impl ToOperationNode) -> Self {
        self.with_node(InsertQueryNode {
            values: Some(expression.to_operation_node()),
            default_values: false,
            ..self.node.as_ref().clone()
        })
    }

    /// `insert into t default values`
    pub fn default_values(&self) -> Self {
        self.with_node(InsertQueryNode {
            values: None,
            default_values: true,
            ..self.node.as_ref().clone()
        })
    }

    /// `insert ignore`, spelled per dialect.
    pub fn ignore(&self) -> Self {
        self.with_node(InsertQueryNode {
            ignore: true,
            ..self.node.as_ref().clone()
        })
    }

    /// PostgreSQL and SQLite `on conflict`.
    ///
    /// ```rust,ignore
    /// db.insert_into("pet")?
    ///     .values(rows)?
    ///     .on_conflict(|oc| oc.column("name")?.do_update_set(vec![("species", val("hamster"))]))?;
    /// ```
    pub fn on_conflict<F>(&self, f: F) -> QuarryResult<Self>
    where
        F: FnOnce(OnConflictBuilder) -> QuarryResult<OnConflictBuilder>,
    {
        let on_conflict = f(OnConflictBuilder::default())?;
        Ok(self.with_node(InsertQueryNode {
            on_conflict: Some(Arc::new(on_conflict.node)),
            ..self.node.as_ref().clone()
        }))
    }

    /// MySQL `on duplicate key update`.
    pub fn on_duplicate_key_update<K: AsRef<str>>(
        &self,
        updates: Vec<(K, Expr)>,
    ) -> QuarryResult<Self> {
        Ok(self.with_node(InsertQueryNode {
            on_duplicate_key: Some(Arc::new(OnDuplicateKeyNode {
                updates: parse_updates(updates)?,
            })),
            ..self.node.as_ref().clone()
        }))
    }

    pub fn explain(&self) -> Self {
        self.with_node(InsertQueryNode {
            explain: Some(Arc::new(ExplainNode { options: None })),
            ..self.node.as_ref().clone()
        })
    }

    pub async fn execute(&self) -> QuarryResult<InsertResult> {
        Ok(self.execute_raw().await?.into())
    }
}

node_interfaces!(returning: InsertQueryBuilder);

impl ToOperationNode for InsertQueryBuilder {
    fn to_operation_node(&self) -> OperationNode {
        self.node.clone().into()
    }
}

/// Columns in order of first appearance, and one value list per row.
///
/// Rows that bind every column to a plain parameter stay primitive lists;
/// others become expression lists with `default` for missing columns.
pub(crate) fn parse_insert_rows(rows: Vec<Vec<(String, OperationNode)>>) -> (Vec<Arc<ColumnNode>>, ValuesNode) {
    let mut names: Vec<String> = Vec::new();
    for row in &rows {
        for (column, _) in row {
            if !names.contains(column) {
                names.push(column.clone());
            }
        }
    }

    let values = rows
        .into_iter()
        .map(|row| {
            let mut slots: Vec<Option<OperationNode>> = vec![None; names.len()];
            for (column, value) in row {
                if let Some(index) = names.iter().position(|n| *n == column) {
                    slots[index] = Some(value);
                }
            }
            Arc::new(value_list(slots))
        })
        .collect();

    let columns = names
        .into_iter()
        .map(|name| Arc::new(ColumnNode::new(name)))
        .collect();
    (columns, ValuesNode { values })
}

fn value_list(slots: Vec<Option<OperationNode>>) -> ValueListNode {
    let primitive: Option<Vec<Value>> = slots
        .iter()
        .map(|slot| match slot {
            Some(OperationNode::Value(v)) if !v.immediate => Some(v.value.clone()),
            _ => None,
        })
        .collect();

    match primitive {
        Some(values) => ValueListNode::primitive(values),
        None => ValueListNode::expressions(
            slots
                .into_iter()
                .map(|slot| slot.unwrap_or_else(|| DefaultInsertValueNode.into()))
                .collect(),
        ),
    }
}

pub(crate) fn parse_updates<K: AsRef<str>>(
    updates: Vec<(K, Expr)>,
) -> QuarryResult<Vec<Arc<ColumnUpdateNode>>> {
    updates
        .into_iter()
        .map(|(column, value)| {
            Ok(Arc::new(ColumnUpdateNode {
                column: parse_column(column.as_ref())?.into(),
                value: value.into_node(),
            }))
        })
        .collect()
}

/// The `on conflict` clause of an insert.
#[derive(Debug, Clone, Default)]
pub struct OnConflictBuilder {
    node: OnConflictNode,
}

impl OnConflictBuilder {
    pub fn column(&self, column: &str) -> QuarryResult<Self> {
        self.columns([column])
    }

    pub fn columns<I, S>(&self, columns: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut all = self.node.columns.clone();
        for column in columns {
            all.push(Arc::new(parse_column(column.as_ref())?));
        }
        Ok(Self {
            node: OnConflictNode {
                columns: all,
                ..self.node.clone()
            },
        })
    }

    /// `on conflict on constraint <name>`
    pub fn constraint(&self, name: &str) -> QuarryResult<Self> {
        Ok(Self {
            node: OnConflictNode {
                constraint: Some(Arc::new(parse_identifier(name)?)),
                ..self.node.clone()
            },
        })
    }

    /// `on conflict (<expression>)`
    pub fn expression(&self, expression: Expr) -> Self {
        Self {
            node: OnConflictNode {
                index_expression: Some(expression.into_node()),
                ..self.node.clone()
            },
        }
    }

    /// `where` of a partial unique index.
    pub fn where_(
        &self,
        lhs: impl ReferenceExpression,
        operator: &str,
        rhs: impl ValueExpression,
    ) -> QuarryResult<Self> {
        let filter = parse_binary_operation(lhs.into_reference()?, operator, rhs.into_operand()?)?;
        Ok(Self {
            node: OnConflictNode {
                index_where: Some(Arc::new(WhereNode::and(self.node.index_where.as_ref(), filter))),
                ..self.node.clone()
            },
        })
    }

    pub fn do_nothing(&self) -> Self {
        Self {
            node: OnConflictNode {
                do_nothing: true,
                ..self.node.clone()
            },
        }
    }

    /// `do update set ...`. Use [`excluded`] for the proposed row.
    pub fn do_update_set<K: AsRef<str>>(&self, updates: Vec<(K, Expr)>) -> QuarryResult<Self> {
        let mut all = self.node.updates.clone();
        all.extend(parse_updates(updates)?);
        Ok(Self {
            node: OnConflictNode {
                updates: all,
                do_nothing: false,
                ..self.node.clone()
            },
        })
    }

    /// `where` of the `do update` branch.
    pub fn update_where(
        &self,
        lhs: impl ReferenceExpression,
        operator: &str,
        rhs: impl ValueExpression,
    ) -> QuarryResult<Self> {
        let filter = parse_binary_operation(lhs.into_reference()?, operator, rhs.into_operand()?)?;
        Ok(Self {
            node: OnConflictNode {
                update_where: Some(Arc::new(WhereNode::and(
                    self.node.update_where.as_ref(),
                    filter,
                ))),
                ..self.node.clone()
            },
        })
    }
}

/// `excluded.<column>`, the row proposed for insertion.
pub fn excluded(column: &str) -> QuarryResult<Expr> {
    let column = parse_column(column)?;
    Ok(Expr::new(ReferenceNode::column(
        Some(TableNode::new("excluded")),
        column.name(),
    )))
}
