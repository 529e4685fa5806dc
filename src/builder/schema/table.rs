use std::sync::Arc;

use crate::ast::{
    CheckConstraintNode, CreateTableNode, DropTableNode, ForeignKeyConstraintNode, OnCommitAction,
    OperationNode, PrimaryKeyConstraintNode, ReferencesNode, ReferentialAction, TableNode,
    UniqueConstraintNode,
};
use crate::builder::{QueryBuilderProps, ToOperationNode};
use crate::error::{QuarryError, QuarryResult};
use crate::expression::Expr;
use crate::parser::{parse_identifier, parse_table};

use super::column::{ColumnDefinitionBuilder, parse_columns};

#[derive(Clone)]
pub struct CreateTableBuilder {
    pub(crate) props: QueryBuilderProps,
    node: Arc<CreateTableNode>,
}

impl CreateTableBuilder {
    pub(crate) fn create(props: QueryBuilderProps, table: TableNode) -> Self {
        Self {
            props,
            node: Arc::new(CreateTableNode::create(table)),
        }
    }

    fn with_node(&self, node: CreateTableNode) -> Self {
        Self {
            props: self.props.clone(),
            node: Arc::new(node),
        }
    }

    pub fn node(&self) -> &Arc<CreateTableNode> {
        &self.node
    }

    pub fn add_column(&self, name: &str, data_type: &str) -> QuarryResult<Self> {
        self.add_column_with(name, data_type, Ok)
    }

    pub fn add_column_with<F>(&self, name: &str, data_type: &str, f: F) -> QuarryResult<Self>
    where
        F: FnOnce(ColumnDefinitionBuilder) -> QuarryResult<ColumnDefinitionBuilder>,
    {
        let column = f(ColumnDefinitionBuilder::create(name, data_type)?)?;
        Ok(self.with_node(self.node.with_column(column.into_node())))
    }

    pub fn add_primary_key_constraint<I, S>(&self, name: &str, columns: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(self.with_constraint(primary_key_constraint(name, columns)?))
    }

    pub fn add_unique_constraint<I, S>(&self, name: &str, columns: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(self.with_constraint(unique_constraint(name, columns)?))
    }

    pub fn add_check_constraint(&self, name: &str, expression: Expr) -> QuarryResult<Self> {
        Ok(self.with_constraint(check_constraint(name, expression)?))
    }

    pub fn add_foreign_key_constraint<I, S, J, T>(
        &self,
        name: &str,
        columns: I,
        target_table: &str,
        target_columns: J,
    ) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        J: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.add_foreign_key_constraint_with(name, columns, target_table, target_columns, Ok)
    }

    /// Like `add_foreign_key_constraint`, with `on delete` / `on update`
    /// set in the callback.
    pub fn add_foreign_key_constraint_with<I, S, J, T, F>(
        &self,
        name: &str,
        columns: I,
        target_table: &str,
        target_columns: J,
        f: F,
    ) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        J: IntoIterator<Item = T>,
        T: AsRef<str>,
        F: FnOnce(ForeignKeyConstraintBuilder) -> QuarryResult<ForeignKeyConstraintBuilder>,
    {
        let constraint = f(ForeignKeyConstraintBuilder::create(
            name,
            columns,
            target_table,
            target_columns,
        )?)?;
        Ok(self.with_constraint(constraint.into_node().into()))
    }

    fn with_constraint(&self, constraint: OperationNode) -> Self {
        self.with_node(self.node.with_constraint(constraint))
    }

    pub fn temporary(&self) -> Self {
        self.with_node(CreateTableNode {
            temporary: true,
            ..self.node.as_ref().clone()
        })
    }

    pub fn if_not_exists(&self) -> Self {
        self.with_node(CreateTableNode {
            if_not_exists: true,
            ..self.node.as_ref().clone()
        })
    }

    /// `on commit preserve rows | delete rows | drop` of a temporary table.
    pub fn on_commit(&self, action: &str) -> QuarryResult<Self> {
        let action = match action.trim().to_lowercase().as_str() {
            "preserve rows" => OnCommitAction::PreserveRows,
            "delete rows" => OnCommitAction::DeleteRows,
            "drop" => OnCommitAction::Drop,
            _ => {
                return Err(QuarryError::Validation(format!(
                    "invalid on commit action '{}'",
                    action
                )));
            }
        };
        Ok(self.with_node(CreateTableNode {
            on_commit: Some(action),
            ..self.node.as_ref().clone()
        }))
    }
}

impl ToOperationNode for CreateTableBuilder {
    fn to_operation_node(&self) -> OperationNode {
        self.node.clone().into()
    }
}

#[derive(Clone)]
pub struct DropTableBuilder {
    pub(crate) props: QueryBuilderProps,
    node: Arc<DropTableNode>,
}

impl DropTableBuilder {
    pub(crate) fn create(props: QueryBuilderProps, table: TableNode) -> Self {
        Self {
            props,
            node: Arc::new(DropTableNode {
                table: Arc::new(table),
                if_exists: false,
                cascade: false,
            }),
        }
    }

    pub fn if_exists(&self) -> Self {
        Self {
            props: self.props.clone(),
            node: Arc::new(DropTableNode {
                if_exists: true,
                ..self.node.as_ref().clone()
            }),
        }
    }

    pub fn cascade(&self) -> Self {
        Self {
            props: self.props.clone(),
            node: Arc::new(DropTableNode {
                cascade: true,
                ..self.node.as_ref().clone()
            }),
        }
    }
}

impl ToOperationNode for DropTableBuilder {
    fn to_operation_node(&self) -> OperationNode {
        self.node.clone().into()
    }
}

/// A named `foreign key (...) references ...` table constraint.
#[derive(Debug, Clone)]
pub struct ForeignKeyConstraintBuilder {
    node: ForeignKeyConstraintNode,
}

impl ForeignKeyConstraintBuilder {
    pub(crate) fn create<I, S, J, T>(
        name: &str,
        columns: I,
        target_table: &str,
        target_columns: J,
    ) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        J: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Ok(Self {
            node: ForeignKeyConstraintNode {
                columns: parse_columns(columns)?,
                references: Arc::new(ReferencesNode {
                    table: Arc::new(parse_table(target_table)?),
                    columns: parse_columns(target_columns)?,
                    on_delete: None,
                    on_update: None,
                }),
                name: Some(Arc::new(parse_identifier(name)?)),
            },
        })
    }

    pub fn on_delete(&self, action: &str) -> QuarryResult<Self> {
        let action = ReferentialAction::parse(action)?;
        Ok(self.with_references(ReferencesNode {
            on_delete: Some(action),
            ..self.node.references.as_ref().clone()
        }))
    }

    pub fn on_update(&self, action: &str) -> QuarryResult<Self> {
        let action = ReferentialAction::parse(action)?;
        Ok(self.with_references(ReferencesNode {
            on_update: Some(action),
            ..self.node.references.as_ref().clone()
        }))
    }

    fn with_references(&self, references: ReferencesNode) -> Self {
        Self {
            node: ForeignKeyConstraintNode {
                references: Arc::new(references),
                ..self.node.clone()
            },
        }
    }

    pub(crate) fn into_node(self) -> ForeignKeyConstraintNode {
        self.node
    }
}

pub(super) fn primary_key_constraint<I, S>(name: &str, columns: I) -> QuarryResult<OperationNode>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Ok(PrimaryKeyConstraintNode {
        columns: parse_columns(columns)?,
        name: Some(Arc::new(parse_identifier(name)?)),
    }
    .into())
}

pub(super) fn unique_constraint<I, S>(name: &str, columns: I) -> QuarryResult<OperationNode>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Ok(UniqueConstraintNode {
        columns: parse_columns(columns)?,
        name: Some(Arc::new(parse_identifier(name)?)),
        nulls_not_distinct: false,
    }
    .into())
}

pub(super) fn check_constraint(name: &str, expression: Expr) -> QuarryResult<OperationNode> {
    Ok(CheckConstraintNode {
        expression: expression.into_node(),
        name: Some(Arc::new(parse_identifier(name)?)),
    }
    .into())
}
