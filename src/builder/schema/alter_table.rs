use std::sync::Arc;

use crate::ast::{
    AddColumnNode, AddConstraintNode, AlterColumnNode, AlterTableNode, DropColumnNode,
    DropConstraintNode, OperationNode, RenameColumnNode, TableNode,
};
use crate::builder::{QueryBuilderProps, ToOperationNode};
use crate::error::QuarryResult;
use crate::expression::Expr;
use crate::parser::{ValueExpression, parse_column, parse_data_type, parse_identifier, parse_table};

use super::column::ColumnDefinitionBuilder;
use super::table::{
    ForeignKeyConstraintBuilder, check_constraint, primary_key_constraint, unique_constraint,
};

/// `alter table`. Column alterations can be chained and render comma
/// separated (`add column a ..., drop column b`); MySQL and PostgreSQL
/// accept that, SQLite takes one per statement.
#[derive(Clone)]
pub struct AlterTableBuilder {
    pub(crate) props: QueryBuilderProps,
    node: Arc<AlterTableNode>,
}

impl AlterTableBuilder {
    pub(crate) fn create(props: QueryBuilderProps, table: TableNode) -> Self {
        Self {
            props,
            node: Arc::new(AlterTableNode::create(table)),
        }
    }

    fn with_node(&self, node: AlterTableNode) -> Self {
        Self {
            props: self.props.clone(),
            node: Arc::new(node),
        }
    }

    pub fn node(&self) -> &Arc<AlterTableNode> {
        &self.node
    }

    pub fn rename_to(&self, table: &str) -> QuarryResult<Self> {
        Ok(self.with_node(AlterTableNode {
            rename_to: Some(Arc::new(parse_table(table)?)),
            ..self.node.as_ref().clone()
        }))
    }

    pub fn set_schema(&self, schema: &str) -> QuarryResult<Self> {
        Ok(self.with_node(AlterTableNode {
            set_schema: Some(Arc::new(parse_identifier(schema)?)),
            ..self.node.as_ref().clone()
        }))
    }

    pub fn add_column(&self, name: &str, data_type: &str) -> QuarryResult<Self> {
        self.add_column_with(name, data_type, Ok)
    }

    pub fn add_column_with<F>(&self, name: &str, data_type: &str, f: F) -> QuarryResult<Self>
    where
        F: FnOnce(ColumnDefinitionBuilder) -> QuarryResult<ColumnDefinitionBuilder>,
    {
        let column = f(ColumnDefinitionBuilder::create(name, data_type)?)?;
        Ok(self.with_alteration(
            AddColumnNode {
                column: Arc::new(column.into_node()),
            }
            .into(),
        ))
    }

    pub fn drop_column(&self, name: &str) -> QuarryResult<Self> {
        Ok(self.with_alteration(
            DropColumnNode {
                column: Arc::new(parse_column(name)?),
            }
            .into(),
        ))
    }

    pub fn rename_column(&self, from: &str, to: &str) -> QuarryResult<Self> {
        Ok(self.with_alteration(
            RenameColumnNode {
                column: Arc::new(parse_column(from)?),
                rename_to: Arc::new(parse_column(to)?),
            }
            .into(),
        ))
    }

    /// `alter column <name> <change>`, one change per call.
    ///
    /// ```rust,ignore
    /// db.schema()
    ///     .alter_table("person")?
    ///     .alter_column("age", |col| col.set_data_type("bigint"))?;
    /// ```
    pub fn alter_column<F>(&self, name: &str, f: F) -> QuarryResult<Self>
    where
        F: FnOnce(AlterColumnBuilder) -> QuarryResult<AlteredColumn>,
    {
        let column = parse_column(name)?;
        let altered = f(AlterColumnBuilder {
            node: AlterColumnNode::create(column.name()),
        })?;
        Ok(self.with_alteration(altered.node.into()))
    }

    fn with_alteration(&self, alteration: OperationNode) -> Self {
        self.with_node(self.node.with_column_alteration(alteration))
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
        self.with_node(AlterTableNode {
            add_constraint: Some(Arc::new(AddConstraintNode { constraint })),
            ..self.node.as_ref().clone()
        })
    }

    pub fn drop_constraint(&self, name: &str) -> QuarryResult<Self> {
        self.drop_constraint_node(name, false)
    }

    pub fn drop_constraint_if_exists(&self, name: &str) -> QuarryResult<Self> {
        self.drop_constraint_node(name, true)
    }

    fn drop_constraint_node(&self, name: &str, if_exists: bool) -> QuarryResult<Self> {
        Ok(self.with_node(AlterTableNode {
            drop_constraint: Some(Arc::new(DropConstraintNode {
                constraint_name: Arc::new(parse_identifier(name)?),
                if_exists,
                cascade: false,
            })),
            ..self.node.as_ref().clone()
        }))
    }

    /// `cascade` on the constraint dropped before; no effect otherwise.
    pub fn cascade(&self) -> Self {
        match &self.node.drop_constraint {
            Some(drop) => self.with_node(AlterTableNode {
                drop_constraint: Some(Arc::new(DropConstraintNode {
                    cascade: true,
                    ..drop.as_ref().clone()
                })),
                ..self.node.as_ref().clone()
            }),
            None => self.clone(),
        }
    }
}

impl ToOperationNode for AlterTableBuilder {
    fn to_operation_node(&self) -> OperationNode {
        self.node.clone().into()
    }
}

/// Picks the single change of an `alter column`.
#[derive(Debug)]
pub struct AlterColumnBuilder {
    node: AlterColumnNode,
}

/// An `alter column` with its change chosen.
#[derive(Debug)]
pub struct AlteredColumn {
    node: AlterColumnNode,
}

impl AlterColumnBuilder {
    pub fn set_data_type(self, data_type: &str) -> QuarryResult<AlteredColumn> {
        let data_type = parse_data_type(data_type)?;
        Ok(AlteredColumn {
            node: AlterColumnNode {
                data_type: Some(data_type.into()),
                ..self.node
            },
        })
    }

    pub fn set_default(self, value: impl ValueExpression) -> QuarryResult<AlteredColumn> {
        Ok(AlteredColumn {
            node: AlterColumnNode {
                set_default: Some(value.into_operand()?.into_immediate_node()),
                ..self.node
            },
        })
    }

    pub fn drop_default(self) -> QuarryResult<AlteredColumn> {
        Ok(AlteredColumn {
            node: AlterColumnNode {
                drop_default: true,
                ..self.node
            },
        })
    }

    pub fn set_not_null(self) -> QuarryResult<AlteredColumn> {
        Ok(AlteredColumn {
            node: AlterColumnNode {
                set_not_null: true,
                ..self.node
            },
        })
    }

    pub fn drop_not_null(self) -> QuarryResult<AlteredColumn> {
        Ok(AlteredColumn {
            node: AlterColumnNode {
                drop_not_null: true,
                ..self.node
            },
        })
    }
}
