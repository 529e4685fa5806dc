use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    ColumnNode, IdentifierNode, OnCommitAction, OperationNode, ReferentialAction,
    SchemableIdentifierNode, TableNode, WhereNode,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTableNode {
    pub table: Arc<TableNode>,
    pub columns: Vec<Arc<ColumnDefinitionNode>>,
    /// Table-level constraints (primary key, unique, check, foreign key).
    pub constraints: Vec<OperationNode>,
    pub temporary: bool,
    pub if_not_exists: bool,
    pub on_commit: Option<OnCommitAction>,
}

impl CreateTableNode {
    pub fn create(table: TableNode) -> Self {
        Self {
            table: Arc::new(table),
            columns: Vec::new(),
            constraints: Vec::new(),
            temporary: false,
            if_not_exists: false,
            on_commit: None,
        }
    }

    pub fn with_column(&self, column: ColumnDefinitionNode) -> Self {
        let mut columns = self.columns.clone();
        columns.push(Arc::new(column));
        Self {
            columns,
            ..self.clone()
        }
    }

    pub fn with_constraint(&self, constraint: OperationNode) -> Self {
        let mut constraints = self.constraints.clone();
        constraints.push(constraint);
        Self {
            constraints,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinitionNode {
    pub column: Arc<ColumnNode>,
    /// A `DataType` or `Raw` node.
    pub data_type: OperationNode,
    pub references: Option<Arc<ReferencesNode>>,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub unique: bool,
    pub not_null: bool,
    pub unsigned: bool,
    pub nulls_not_distinct: bool,
    pub default_to: Option<Arc<DefaultValueNode>>,
    pub check: Option<Arc<CheckConstraintNode>>,
    pub generated: Option<Arc<GeneratedNode>>,
}

impl ColumnDefinitionNode {
    pub fn create(column: impl Into<String>, data_type: OperationNode) -> Self {
        Self {
            column: Arc::new(ColumnNode::new(column)),
            data_type,
            references: None,
            primary_key: false,
            auto_increment: false,
            unique: false,
            not_null: false,
            unsigned: false,
            nulls_not_distinct: false,
            default_to: None,
            check: None,
            generated: None,
        }
    }
}

/// A validated data type name such as `varchar(255)` or `double precision`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTypeNode {
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultValueNode {
    pub default_value: OperationNode,
}

/// `generated always as (expr) stored` or `generated by default as identity`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedNode {
    pub by_default: bool,
    pub always: bool,
    pub identity: bool,
    pub stored: bool,
    pub expression: Option<OperationNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencesNode {
    pub table: Arc<TableNode>,
    pub columns: Vec<Arc<ColumnNode>>,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryKeyConstraintNode {
    pub columns: Vec<Arc<ColumnNode>>,
    pub name: Option<Arc<IdentifierNode>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniqueConstraintNode {
    pub columns: Vec<Arc<ColumnNode>>,
    pub name: Option<Arc<IdentifierNode>>,
    pub nulls_not_distinct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckConstraintNode {
    pub expression: OperationNode,
    pub name: Option<Arc<IdentifierNode>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyConstraintNode {
    pub columns: Vec<Arc<ColumnNode>>,
    pub references: Arc<ReferencesNode>,
    pub name: Option<Arc<IdentifierNode>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropTableNode {
    pub table: Arc<TableNode>,
    pub if_exists: bool,
    pub cascade: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIndexNode {
    pub name: Arc<IdentifierNode>,
    pub table: Option<Arc<TableNode>>,
    pub columns: Vec<OperationNode>,
    pub unique: bool,
    pub if_not_exists: bool,
    /// Index method, e.g. `btree` or `gin`.
    pub using: Option<String>,
    #[serde(rename = "where")]
    pub where_: Option<Arc<WhereNode>>,
    pub nulls_not_distinct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropIndexNode {
    pub name: Arc<SchemableIdentifierNode>,
    pub table: Option<Arc<TableNode>>,
    pub if_exists: bool,
    pub cascade: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSchemaNode {
    pub schema: Arc<IdentifierNode>,
    pub if_not_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropSchemaNode {
    pub schema: Arc<IdentifierNode>,
    pub if_exists: bool,
    pub cascade: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateViewNode {
    pub name: Arc<SchemableIdentifierNode>,
    pub columns: Vec<Arc<ColumnNode>>,
    #[serde(rename = "as")]
    pub as_: Option<OperationNode>,
    pub or_replace: bool,
    pub temporary: bool,
    pub materialized: bool,
    pub if_not_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropViewNode {
    pub name: Arc<SchemableIdentifierNode>,
    pub if_exists: bool,
    pub cascade: bool,
    pub materialized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterTableNode {
    pub table: Arc<TableNode>,
    pub rename_to: Option<Arc<TableNode>>,
    pub set_schema: Option<Arc<IdentifierNode>>,
    /// Add/drop/rename/alter column nodes, rendered comma separated.
    pub column_alterations: Vec<OperationNode>,
    pub add_constraint: Option<Arc<AddConstraintNode>>,
    pub drop_constraint: Option<Arc<DropConstraintNode>>,
}

impl AlterTableNode {
    pub fn create(table: TableNode) -> Self {
        Self {
            table: Arc::new(table),
            rename_to: None,
            set_schema: None,
            column_alterations: Vec::new(),
            add_constraint: None,
            drop_constraint: None,
        }
    }

    pub fn with_column_alteration(&self, alteration: OperationNode) -> Self {
        let mut column_alterations = self.column_alterations.clone();
        column_alterations.push(alteration);
        Self {
            column_alterations,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddColumnNode {
    pub column: Arc<ColumnDefinitionNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropColumnNode {
    pub column: Arc<ColumnNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameColumnNode {
    pub column: Arc<ColumnNode>,
    pub rename_to: Arc<ColumnNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterColumnNode {
    pub column: Arc<ColumnNode>,
    pub data_type: Option<OperationNode>,
    pub set_default: Option<OperationNode>,
    pub drop_default: bool,
    pub set_not_null: bool,
    pub drop_not_null: bool,
}

impl AlterColumnNode {
    pub fn create(column: impl Into<String>) -> Self {
        Self {
            column: Arc::new(ColumnNode::new(column)),
            data_type: None,
            set_default: None,
            drop_default: false,
            set_not_null: false,
            drop_not_null: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddConstraintNode {
    pub constraint: OperationNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropConstraintNode {
    pub constraint_name: Arc<IdentifierNode>,
    pub if_exists: bool,
    pub cascade: bool,
}
