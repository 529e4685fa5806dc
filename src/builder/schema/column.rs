use std::sync::Arc;

use crate::ast::{
    CheckConstraintNode, ColumnDefinitionNode, ColumnNode, DefaultValueNode, GeneratedNode,
    OperationNode, ReferencesNode, ReferentialAction,
};
use crate::error::{QuarryError, QuarryResult};
use crate::expression::Expr;
use crate::parser::{ValueExpression, parse_column, parse_data_type, parse_table};

/// One column of `create table` or `alter table ... add column`.
#[derive(Debug, Clone)]
pub struct ColumnDefinitionBuilder {
    node: ColumnDefinitionNode,
}

impl ColumnDefinitionBuilder {
    pub(crate) fn create(name: &str, data_type: &str) -> QuarryResult<Self> {
        let column = parse_column(name)?;
        let data_type: OperationNode = parse_data_type(data_type)?.into();
        Ok(Self {
            node: ColumnDefinitionNode::create(column.name(), data_type),
        })
    }

    fn with_node(&self, node: ColumnDefinitionNode) -> Self {
        Self { node }
    }

    pub fn primary_key(&self) -> Self {
        self.with_node(ColumnDefinitionNode {
            primary_key: true,
            ..self.node.clone()
        })
    }

    /// Spelled per dialect: `auto_increment`, `autoincrement`, `identity`...
    pub fn auto_increment(&self) -> Self {
        self.with_node(ColumnDefinitionNode {
            auto_increment: true,
            ..self.node.clone()
        })
    }

    pub fn unique(&self) -> Self {
        self.with_node(ColumnDefinitionNode {
            unique: true,
            ..self.node.clone()
        })
    }

    pub fn nulls_not_distinct(&self) -> Self {
        self.with_node(ColumnDefinitionNode {
            nulls_not_distinct: true,
            ..self.node.clone()
        })
    }

    pub fn not_null(&self) -> Self {
        self.with_node(ColumnDefinitionNode {
            not_null: true,
            ..self.node.clone()
        })
    }

    /// MySQL `unsigned`.
    pub fn unsigned(&self) -> Self {
        self.with_node(ColumnDefinitionNode {
            unsigned: true,
            ..self.node.clone()
        })
    }

    /// `default <value>`. Plain values are inlined, DDL takes no parameters.
    pub fn default_to(&self, value: impl ValueExpression) -> QuarryResult<Self> {
        Ok(self.with_node(ColumnDefinitionNode {
            default_to: Some(Arc::new(DefaultValueNode {
                default_value: value.into_operand()?.into_immediate_node(),
            })),
            ..self.node.clone()
        }))
    }

    pub fn check(&self, expression: Expr) -> Self {
        self.with_node(ColumnDefinitionNode {
            check: Some(Arc::new(CheckConstraintNode {
                expression: expression.into_node(),
                name: None,
            })),
            ..self.node.clone()
        })
    }

    /// `references <table> (<column>)` from `"table.column"` or
    /// `"schema.table.column"`.
    pub fn references(&self, reference: &str) -> QuarryResult<Self> {
        let (table, column) = reference.rsplit_once('.').ok_or_else(|| {
            QuarryError::reference(reference, "expected <table>.<column>")
        })?;
        Ok(self.with_node(ColumnDefinitionNode {
            references: Some(Arc::new(ReferencesNode {
                table: Arc::new(parse_table(table)?),
                columns: vec![Arc::new(parse_column(column)?)],
                on_delete: None,
                on_update: None,
            })),
            ..self.node.clone()
        }))
    }

    /// `on delete <action>` of the `references` clause set before.
    pub fn on_delete(&self, action: &str) -> QuarryResult<Self> {
        let action = ReferentialAction::parse(action)?;
        self.with_references(|references| ReferencesNode {
            on_delete: Some(action),
            ..references.clone()
        })
    }

    pub fn on_update(&self, action: &str) -> QuarryResult<Self> {
        let action = ReferentialAction::parse(action)?;
        self.with_references(|references| ReferencesNode {
            on_update: Some(action),
            ..references.clone()
        })
    }

    fn with_references<F>(&self, f: F) -> QuarryResult<Self>
    where
        F: FnOnce(&ReferencesNode) -> ReferencesNode,
    {
        let references = self.node.references.as_ref().ok_or_else(|| {
            QuarryError::Validation(format!(
                "column '{}' has no references clause",
                self.node.column.name()
            ))
        })?;
        Ok(self.with_node(ColumnDefinitionNode {
            references: Some(Arc::new(f(references))),
            ..self.node.clone()
        }))
    }

    /// `generated always as (<expression>)`; add [`stored`](Self::stored)
    /// for a stored column.
    pub fn generated_always_as(&self, expression: Expr) -> Self {
        self.with_generated(GeneratedNode {
            always: true,
            expression: Some(expression.into_node()),
            ..GeneratedNode::default()
        })
    }

    pub fn generated_always_as_identity(&self) -> Self {
        self.with_generated(GeneratedNode {
            always: true,
            identity: true,
            ..GeneratedNode::default()
        })
    }

    pub fn generated_by_default_as_identity(&self) -> Self {
        self.with_generated(GeneratedNode {
            by_default: true,
            identity: true,
            ..GeneratedNode::default()
        })
    }

    pub fn stored(&self) -> Self {
        let generated = self
            .node
            .generated
            .as_ref()
            .map(|g| g.as_ref().clone())
            .unwrap_or_default();
        self.with_generated(GeneratedNode {
            stored: true,
            ..generated
        })
    }

    fn with_generated(&self, generated: GeneratedNode) -> Self {
        self.with_node(ColumnDefinitionNode {
            generated: Some(Arc::new(generated)),
            ..self.node.clone()
        })
    }

    pub(crate) fn into_node(self) -> ColumnDefinitionNode {
        self.node
    }
}

/// Column names of a constraint or index.
pub(crate) fn parse_columns<I, S>(columns: I) -> QuarryResult<Vec<Arc<ColumnNode>>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    columns
        .into_iter()
        .map(|c| Ok(Arc::new(parse_column(c.as_ref())?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_references_needs_table_and_column() {
        let column = ColumnDefinitionBuilder::create("owner_id", "integer").unwrap();
        assert!(column.references("person").is_err());

        let column = column.references("person.id").unwrap();
        let references = column.node.references.clone().unwrap();
        assert_eq!(references.columns[0].name(), "id");
    }

    #[test]
    fn test_on_delete_without_references_fails() {
        let column = ColumnDefinitionBuilder::create("owner_id", "integer").unwrap();
        assert!(column.on_delete("cascade").is_err());
        assert!(
            column
                .references("person.id")
                .unwrap()
                .on_delete("explode")
                .is_err()
        );
    }

    #[test]
    fn test_invalid_data_type() {
        assert!(matches!(
            ColumnDefinitionBuilder::create("id", "integer(("),
            Err(QuarryError::InvalidDataType(_))
        ));
    }
}
