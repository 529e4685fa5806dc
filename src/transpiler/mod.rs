//! SQL transpiler for the quarry AST.
//!
//! Converts a tree into SQL text plus an ordered parameter list for one
//! dialect. Compilation is pure: the same tree compiled twice yields
//! byte-identical SQL and equal parameters.

mod compiler;
pub mod dialect;
mod pagination;
pub mod sql;
pub mod traits;

#[cfg(test)]
mod tests;

use serde::Serialize;

use crate::ast::{OperationNode, Value};
use crate::error::QuarryResult;
use crate::query_id::QueryId;

pub use compiler::QueryCompiler;
pub use dialect::Dialect;
pub use traits::{IgnoreSpelling, PaginationStyle, SqlGenerator, quote_with};

/// A tree rendered for one dialect.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledQuery {
    /// The tree that was rendered, after plugins and dialect rewrites.
    pub query: OperationNode,
    pub sql: String,
    pub parameters: Vec<Value>,
    #[serde(skip)]
    pub query_id: QueryId,
}

/// Compile `node` with a fresh query id.
pub fn compile(node: &OperationNode, dialect: Dialect) -> QuarryResult<CompiledQuery> {
    compile_with_id(node, dialect, QueryId::new())
}

pub fn compile_with_id(
    node: &OperationNode,
    dialect: Dialect,
    query_id: QueryId,
) -> QuarryResult<CompiledQuery> {
    let generator = dialect.generator();
    let query = generator.rewrite(node)?;
    let (sql, parameters) = QueryCompiler::new(generator).compile(&query)?;
    Ok(CompiledQuery {
        query,
        sql,
        parameters,
        query_id,
    })
}

/// Trait for things that render to SQL.
pub trait ToSql {
    fn to_sql_with_dialect(&self, dialect: Dialect) -> QuarryResult<String>;

    /// Render for PostgreSQL.
    fn to_sql(&self) -> QuarryResult<String> {
        self.to_sql_with_dialect(Dialect::default())
    }
}

impl ToSql for OperationNode {
    fn to_sql_with_dialect(&self, dialect: Dialect) -> QuarryResult<String> {
        Ok(compile(self, dialect)?.sql)
    }
}
