//! Plugins: rewrites applied to every outgoing tree and incoming result.

mod camel_case;
mod deduplicate_joins;
mod with_schema;

use async_trait::async_trait;

use crate::ast::OperationNode;
use crate::driver::QueryResult;
use crate::error::QuarryResult;
use crate::query_id::QueryId;

pub use camel_case::{CamelCaseOptions, CamelCasePlugin};
pub use deduplicate_joins::DeduplicateJoinsPlugin;
pub use with_schema::WithSchemaPlugin;

/// A rewrite hooked into the executor.
///
/// `transform_query` receives the whole statement and must return a node of
/// the same kind. Both hooks see the same [`QueryId`] for one statement.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn transform_query(&self, node: OperationNode, query_id: &QueryId)
    -> QuarryResult<OperationNode>;

    async fn transform_result(
        &self,
        result: QueryResult,
        _query_id: &QueryId,
    ) -> QuarryResult<QueryResult> {
        Ok(result)
    }
}
