use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::OperationNode;

/// A single SQL identifier, always rendered quoted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentifierNode {
    pub name: String,
}

impl IdentifierNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// An identifier that may be qualified with a schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemableIdentifierNode {
    pub schema: Option<Arc<IdentifierNode>>,
    pub identifier: Arc<IdentifierNode>,
}

impl SchemableIdentifierNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            identifier: Arc::new(IdentifierNode::new(name)),
        }
    }

    pub fn with_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(Arc::new(IdentifierNode::new(schema))),
            identifier: Arc::new(IdentifierNode::new(name)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableNode {
    pub table: Arc<SchemableIdentifierNode>,
}

impl TableNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table: Arc::new(SchemableIdentifierNode::new(name)),
        }
    }

    pub fn with_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: Arc::new(SchemableIdentifierNode::with_schema(schema, name)),
        }
    }

    pub fn name(&self) -> &str {
        &self.table.identifier.name
    }

    pub fn schema(&self) -> Option<&str> {
        self.table.schema.as_ref().map(|s| s.name.as_str())
    }

    /// Same table, qualified with `schema`.
    pub fn clone_with_schema(&self, schema: impl Into<String>) -> Self {
        Self {
            table: Arc::new(SchemableIdentifierNode {
                schema: Some(Arc::new(IdentifierNode::new(schema))),
                identifier: self.table.identifier.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnNode {
    pub column: Arc<IdentifierNode>,
}

impl ColumnNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            column: Arc::new(IdentifierNode::new(name)),
        }
    }

    pub fn name(&self) -> &str {
        &self.column.name
    }
}

/// `*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectAllNode;

/// A column (or `*`) optionally qualified by a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceNode {
    pub table: Option<Arc<TableNode>>,
    /// A `Column` or `SelectAll` node.
    pub column: OperationNode,
}

impl ReferenceNode {
    pub fn column(table: Option<TableNode>, column: impl Into<String>) -> Self {
        Self {
            table: table.map(Arc::new),
            column: ColumnNode::new(column).into(),
        }
    }

    pub fn select_all(table: TableNode) -> Self {
        Self {
            table: Some(Arc::new(table)),
            column: SelectAllNode.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasNode {
    pub node: OperationNode,
    /// Usually an `Identifier`; a `Raw` node for aliases with a column list.
    pub alias: OperationNode,
}

impl AliasNode {
    pub fn new(node: OperationNode, alias: impl Into<String>) -> Self {
        Self {
            node,
            alias: IdentifierNode::new(alias).into(),
        }
    }

    /// The alias name when it is a plain identifier.
    pub fn alias_name(&self) -> Option<&str> {
        self.alias.cast::<IdentifierNode>().map(|i| i.name.as_str())
    }
}
