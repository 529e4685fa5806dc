//! Fluent, immutable statement builders.
//!
//! Every chain method returns a new builder and leaves the receiver
//! untouched. Methods that parse caller strings return
//! [`QuarryResult`](crate::error::QuarryResult) and fail before any I/O.
//!
//! Builders are plain values. Running one is always an explicit
//! `.execute().await`; a builder itself cannot be awaited:
//!
//! ```compile_fail
//! async fn run(db: quarry::Quarry) {
//!     let rows = db.select_from("person").unwrap().await;
//! }
//! ```

mod delete;
mod insert;
mod interfaces;
mod join;
mod merge;
mod results;
mod select;
mod update;

pub mod schema;


use crate::ast::OperationNode;
use crate::driver::QueryResult;
use crate::engine::QueryExecutor;
use crate::error::QuarryResult;
use crate::query_id::QueryId;
use crate::transpiler::CompiledQuery;

pub use delete::DeleteQueryBuilder;
pub use insert::{InsertQueryBuilder, OnConflictBuilder, excluded};
pub use interfaces::{HavingInterface, JoinInterface, ReturningInterface, WhereInterface};
pub use join::JoinBuilder;
pub use merge::{MatchedThen, MergeQueryBuilder, NotMatchedThen};
pub use results::{DeleteResult, InsertResult, MergeResult, UpdateResult};
pub use select::SelectQueryBuilder;
pub use update::UpdateQueryBuilder;

/// Anything that is, or builds, an AST node.
pub trait ToOperationNode {
    fn to_operation_node(&self) -> OperationNode;
}

impl ToOperationNode for OperationNode {
    fn to_operation_node(&self) -> OperationNode {
        self.clone()
    }
}

/// The executor and query id every builder of one chain shares.
#[derive(Clone)]
pub struct QueryBuilderProps {
    executor: QueryExecutor,
    query_id: QueryId,
}

impl QueryBuilderProps {
    pub(crate) fn new(executor: QueryExecutor) -> Self {
        Self {
            executor,
            query_id: QueryId::new(),
        }
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    pub fn query_id(&self) -> &QueryId {
        &self.query_id
    }

    pub(crate) fn compile(&self, node: &OperationNode) -> QuarryResult<CompiledQuery> {
        self.executor.compile_query(node, &self.query_id)
    }

    pub(crate) async fn execute(&self, node: &OperationNode) -> QuarryResult<QueryResult> {
        let compiled = self.compile(node)?;
        self.executor.execute_query(&compiled).await
    }
}

/// Rows as JSON objects, for typed deserialization.
pub(crate) fn rows_as<T: serde::de::DeserializeOwned>(
    rows: Vec<crate::driver::Row>,
) -> QuarryResult<Vec<T>> {
    rows.into_iter()
        .map(|row| {
            let object: serde_json::Map<String, serde_json::Value> = row.into_iter().collect();
            Ok(serde_json::from_value(serde_json::Value::Object(object))?)
        })
        .collect()
}

/// Terminal methods shared by the data-manipulation builders.
///
/// The builder needs a `props: QueryBuilderProps` field and a
/// [`ToOperationNode`] impl.
macro_rules! executable {
    ($($builder:ty),* $(,)?) => {
        $(
            impl $builder {
                /// Apply plugins and compile for the executor's dialect. No I/O.
                pub fn compile(&self) -> $crate::error::QuarryResult<$crate::transpiler::CompiledQuery> {
                    self.props.compile(&self.to_operation_node())
                }

                /// Execute and return the driver result untouched.
                pub async fn execute_raw(&self) -> $crate::error::QuarryResult<$crate::driver::QueryResult> {
                    self.props.execute(&self.to_operation_node()).await
                }

                pub async fn execute_take_first(
                    &self,
                ) -> $crate::error::QuarryResult<Option<$crate::driver::Row>> {
                    Ok(self.execute_raw().await?.rows.into_iter().next())
                }

                /// Like `execute_take_first`, failing with
                /// [`NoResultError`](crate::error::NoResultError) when there is no row.
                pub async fn execute_take_first_or_throw(
                    &self,
                ) -> $crate::error::QuarryResult<$crate::driver::Row> {
                    self.execute_take_first_or_else(|query| {
                        $crate::error::NoResultError { query: query.clone() }.into()
                    })
                    .await
                }

                /// Like `execute_take_first`, building the error from the
                /// compiled tree when there is no row.
                pub async fn execute_take_first_or_else<F>(
                    &self,
                    error: F,
                ) -> $crate::error::QuarryResult<$crate::driver::Row>
                where
                    F: FnOnce(&$crate::ast::OperationNode) -> $crate::error::QuarryError,
                {
                    let compiled = self.compile()?;
                    let result = self.props.executor().execute_query(&compiled).await?;
                    result
                        .rows
                        .into_iter()
                        .next()
                        .ok_or_else(|| error(&compiled.query))
                }

                /// Rows deserialized into `T`.
                pub async fn execute_as<T: serde::de::DeserializeOwned>(
                    &self,
                ) -> $crate::error::QuarryResult<Vec<T>> {
                    $crate::builder::rows_as(self.execute_raw().await?.rows)
                }
            }
        )*
    };
}

executable!(
    SelectQueryBuilder,
    InsertQueryBuilder,
    UpdateQueryBuilder,
    DeleteQueryBuilder,
    MergeQueryBuilder,
);
