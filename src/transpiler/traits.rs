//! Dialect hooks used by the query compiler.

use crate::ast::{NodeKind, OperationNode, Value};
use crate::error::QuarryResult;

/// Wrap `name` in `open`/`close`, doubling every embedded `close`.
pub fn quote_with(name: &str, open: char, close: char) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push(open);
    for c in name.chars() {
        if c == close {
            quoted.push(close);
        }
        quoted.push(c);
    }
    quoted.push(close);
    quoted
}

/// How a dialect spells `insert ignore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreSpelling {
    /// A statement prefix such as `insert ignore` or `insert or ignore`.
    Prefix(&'static str),
    /// `on conflict do nothing` appended to the statement.
    OnConflictDoNothing,
    Unsupported,
}

/// How a dialect paginates a select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationStyle {
    /// `limit n offset m`
    LimitOffset,
    /// `offset m rows fetch next n rows only`
    FetchNext,
    /// `top(n)` without an offset, `offset ... fetch next ...` with one.
    TopOrFetch,
}

/// Trait for dialect-specific SQL generation.
///
/// Everything not covered here is rendered the same way for every dialect
/// by [`QueryCompiler`](super::QueryCompiler).
pub trait SqlGenerator: Send + Sync {
    /// Name used in errors and the CLI.
    fn name(&self) -> &'static str;

    /// Quote an identifier (table, column, schema, alias). Never skipped.
    fn quote_identifier(&self, name: &str) -> String {
        quote_with(name, '"', '"')
    }

    /// Generate the parameter placeholder for a 1-based index.
    fn placeholder(&self, index: usize) -> String;

    /// DDL keyword for auto increment columns.
    fn auto_increment(&self) -> &'static str;

    fn insert_ignore(&self) -> IgnoreSpelling {
        IgnoreSpelling::Unsupported
    }

    /// `default` inside an insert row.
    fn default_insert_value(&self) -> &'static str {
        "default"
    }

    fn bool_literal(&self, val: bool) -> &'static str {
        if val { "true" } else { "false" }
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn pagination(&self) -> PaginationStyle {
        PaginationStyle::LimitOffset
    }

    /// Render an immediate value.
    fn literal(&self, value: &Value) -> String {
        match value {
            Value::Bool(b) => self.bool_literal(*b).to_string(),
            other => other.to_string(),
        }
    }

    /// Whether a statement nested under `parent` is wrapped in parentheses.
    fn parenthesize_sub_statement(&self, statement: NodeKind, parent: Option<NodeKind>) -> bool {
        let Some(parent) = parent else {
            return false;
        };
        if matches!(parent, NodeKind::Parens | NodeKind::Raw | NodeKind::When) {
            return false;
        }
        if statement == NodeKind::SelectQuery {
            return !matches!(
                parent,
                NodeKind::InsertQuery
                    | NodeKind::CreateTable
                    | NodeKind::CreateView
                    | NodeKind::SetOperation
            );
        }
        true
    }

    /// Dialect rewrites applied to the final tree before rendering.
    fn rewrite(&self, node: &OperationNode) -> QuarryResult<OperationNode> {
        Ok(node.clone())
    }
}
