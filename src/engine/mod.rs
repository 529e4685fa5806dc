//! The database handle.
//!
//! [`Quarry`] owns the runtime driver and the plugin list; every builder it
//! creates shares one [`QueryExecutor`]. It derefs to [`QueryCreator`], the
//! entry points of the builder chains.
//!
//! ```rust,ignore
//! let db = Quarry::new(Arc::new(SqlxDriver::new("sqlite://app.db")?));
//!
//! let adults = db
//!     .select_from("person")?
//!     .select(["first_name", "age"])?
//!     .where_("age", ">", 18)?
//!     .order_by("first_name")?
//!     .limit(10)?
//!     .execute()
//!     .await?;
//! ```

mod executor;
mod provider;
mod transaction;

use std::ops::Deref;
use std::sync::Arc;

use crate::ast::{CommonTableExpressionNode, OperationNode, WithNode};
use crate::builder::{
    DeleteQueryBuilder, InsertQueryBuilder, MergeQueryBuilder, QueryBuilderProps,
    SelectQueryBuilder, ToOperationNode, UpdateQueryBuilder,
};
use crate::builder::schema::SchemaModule;
use crate::config::QuarryConfig;
use crate::driver::{Driver, QueryResult, RuntimeDriver, SqlxDriver};
use crate::error::{QuarryError, QuarryResult};
use crate::expression::Expr;
use crate::log::{Log, LogConfig};
use crate::parser::{TableExpression, parse_common_table_expression_name, parse_table};
use crate::plugin::{CamelCasePlugin, Plugin, WithSchemaPlugin};
use crate::query_id::QueryId;
use crate::transpiler::{CompiledQuery, Dialect};

pub use executor::QueryExecutor;
pub use provider::{ConnectionLease, ConnectionProvider, DefaultConnectionProvider};
pub use transaction::{
    ConnectionBuilder, ControlledTransaction, ControlledTransactionBuilder, Transaction,
    TransactionBuilder,
};

use provider::{PinnedSlot, SingleConnectionProvider};

/// Which connections the statements of a [`Quarry`] run on.
#[derive(Clone)]
enum Scope {
    Pool,
    Connection(PinnedSlot),
    Transaction(PinnedSlot),
}

/// Database handle. Cheap to clone.
#[derive(Clone)]
pub struct Quarry {
    creator: QueryCreator,
    driver: Option<Arc<dyn Driver>>,
    scope: Scope,
}

impl Deref for Quarry {
    type Target = QueryCreator;

    fn deref(&self) -> &QueryCreator {
        &self.creator
    }
}

impl Quarry {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self::with_runtime(RuntimeDriver::new(driver, None))
    }

    /// Like [`Quarry::new`], reporting every statement to `log`.
    pub fn new_with_log(driver: Arc<dyn Driver>, log: LogConfig) -> Self {
        Self::with_runtime(RuntimeDriver::new(driver, Log::new(log)))
    }

    fn with_runtime(runtime: RuntimeDriver) -> Self {
        let dialect = runtime.dialect();
        let driver: Arc<dyn Driver> = Arc::new(runtime);
        let provider = Arc::new(DefaultConnectionProvider::new(driver.clone()));
        Self {
            creator: QueryCreator::new(QueryExecutor::new(dialect, provider)),
            driver: Some(driver),
            scope: Scope::Pool,
        }
    }

    /// An instance that only compiles. Executing anything fails with
    /// [`QuarryError::Connection`].
    pub fn offline(dialect: Dialect) -> Self {
        Self {
            creator: QueryCreator::new(QueryExecutor::offline(dialect)),
            driver: None,
            scope: Scope::Pool,
        }
    }

    /// A pooled sqlx instance with the plugins and log levels of `config`.
    pub fn from_config(config: &QuarryConfig) -> QuarryResult<Self> {
        let url = config.database_url()?;
        let driver = SqlxDriver::with_settings(url, config.pool_settings())?;
        if let Some(dialect) = config.dialect {
            if dialect != driver.dialect() {
                return Err(QuarryError::Config(format!(
                    "dialect {} does not match the database url",
                    dialect
                )));
            }
        }

        let driver: Arc<dyn Driver> = Arc::new(driver);
        let mut db = match &config.log {
            Some(levels) if !levels.is_empty() => {
                Self::new_with_log(driver, LogConfig::Levels(levels.clone()))
            }
            _ => Self::new(driver),
        };
        if config.camel_case {
            db = db.with_plugin(CamelCasePlugin::new());
        }
        if let Some(schema) = &config.schema {
            db = db.with_schema(schema);
        }
        Ok(db)
    }

    pub fn dialect(&self) -> Dialect {
        self.creator.executor.dialect()
    }

    /// A copy that also runs `plugin`, after the ones already installed.
    pub fn with_plugin(&self, plugin: impl Plugin + 'static) -> Self {
        self.with_executor(self.creator.executor.with_plugin(Arc::new(plugin)))
    }

    /// A copy whose unqualified tables live in `schema`.
    pub fn with_schema(&self, schema: &str) -> Self {
        self.with_executor(
            self.creator
                .executor
                .with_plugin_at_front(Arc::new(WithSchemaPlugin::new(schema))),
        )
    }

    pub fn without_plugins(&self) -> Self {
        self.with_executor(self.creator.executor.without_plugins())
    }

    fn with_executor(&self, executor: QueryExecutor) -> Self {
        Self {
            creator: QueryCreator {
                executor,
                ..self.creator.clone()
            },
            ..self.clone()
        }
    }

    pub fn transaction(&self) -> TransactionBuilder {
        TransactionBuilder::new(self.clone())
    }

    pub fn start_transaction(&self) -> ControlledTransactionBuilder {
        ControlledTransactionBuilder::new(self.clone())
    }

    pub fn connection(&self) -> ConnectionBuilder {
        ConnectionBuilder::new(self.clone())
    }

    pub fn is_transaction(&self) -> bool {
        matches!(self.scope, Scope::Transaction(_))
    }

    /// Close the pool. Builders created afterwards fail to execute.
    pub async fn destroy(&self) -> QuarryResult<()> {
        match &self.driver {
            Some(driver) => driver.destroy().await,
            None => Ok(()),
        }
    }

    pub(crate) fn require_driver(&self) -> QuarryResult<Arc<dyn Driver>> {
        self.driver.clone().ok_or_else(|| {
            QuarryError::Connection(
                "no driver configured, this instance can only compile queries".to_string(),
            )
        })
    }

    pub(crate) fn pinned_slot(&self) -> Option<&PinnedSlot> {
        match &self.scope {
            Scope::Pool => None,
            Scope::Connection(slot) | Scope::Transaction(slot) => Some(slot),
        }
    }

    fn pinned_to(&self, slot: PinnedSlot, scope: Scope) -> Self {
        let provider = Arc::new(SingleConnectionProvider::new(slot));
        Self {
            scope,
            ..self.with_executor(self.creator.executor.with_provider(provider))
        }
    }

    pub(crate) fn in_transaction(&self, slot: PinnedSlot) -> Self {
        self.pinned_to(slot.clone(), Scope::Transaction(slot))
    }

    pub(crate) fn on_connection(&self, slot: PinnedSlot) -> Self {
        self.pinned_to(slot.clone(), Scope::Connection(slot))
    }
}

/// Entry points of the builder chains.
#[derive(Clone)]
pub struct QueryCreator {
    executor: QueryExecutor,
    with: Option<Arc<WithNode>>,
}

impl QueryCreator {
    pub(crate) fn new(executor: QueryExecutor) -> Self {
        Self {
            executor,
            with: None,
        }
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    fn props(&self) -> QueryBuilderProps {
        QueryBuilderProps::new(self.executor.clone())
    }

    /// `select ... from <table>`. Accepts `table`, `schema.table`,
    /// `table as alias` or an aliased sub-query.
    pub fn select_from(&self, from: impl TableExpression) -> QuarryResult<SelectQueryBuilder> {
        self.select_from_tables([from])
    }

    pub fn select_from_tables<I, T>(&self, froms: I) -> QuarryResult<SelectQueryBuilder>
    where
        I: IntoIterator<Item = T>,
        T: TableExpression,
    {
        let froms = froms
            .into_iter()
            .map(TableExpression::into_table_expression)
            .collect::<QuarryResult<Vec<_>>>()?;
        Ok(SelectQueryBuilder::create(self.props(), Some(froms), self.with.clone()))
    }

    /// A select without a `from` clause, e.g. `select now()`.
    pub fn select_no_from(&self) -> SelectQueryBuilder {
        SelectQueryBuilder::create(self.props(), None, self.with.clone())
    }

    pub fn insert_into(&self, table: &str) -> QuarryResult<InsertQueryBuilder> {
        Ok(InsertQueryBuilder::create(
            self.props(),
            parse_table(table)?,
            false,
            self.with.clone(),
        ))
    }

    /// MySQL and SQLite `replace into`.
    pub fn replace_into(&self, table: &str) -> QuarryResult<InsertQueryBuilder> {
        Ok(InsertQueryBuilder::create(
            self.props(),
            parse_table(table)?,
            true,
            self.with.clone(),
        ))
    }

    pub fn update_table(&self, table: impl TableExpression) -> QuarryResult<UpdateQueryBuilder> {
        Ok(UpdateQueryBuilder::create(
            self.props(),
            table.into_table_expression()?,
            self.with.clone(),
        ))
    }

    pub fn delete_from(&self, table: impl TableExpression) -> QuarryResult<DeleteQueryBuilder> {
        self.delete_from_tables([table])
    }

    pub fn delete_from_tables<I, T>(&self, tables: I) -> QuarryResult<DeleteQueryBuilder>
    where
        I: IntoIterator<Item = T>,
        T: TableExpression,
    {
        let froms = tables
            .into_iter()
            .map(TableExpression::into_table_expression)
            .collect::<QuarryResult<Vec<_>>>()?;
        Ok(DeleteQueryBuilder::create(self.props(), froms, self.with.clone()))
    }

    pub fn merge_into(&self, table: impl TableExpression) -> QuarryResult<MergeQueryBuilder> {
        Ok(MergeQueryBuilder::create(
            self.props(),
            table.into_table_expression()?,
            self.with.clone(),
        ))
    }

    /// Adds a common table expression to every statement started from the
    /// returned creator. `name` is `name` or `name(col_a, col_b)`.
    pub fn with(&self, name: &str, query: &impl ToOperationNode) -> QuarryResult<QueryCreator> {
        self.with_cte(name, query, None, false)
    }

    pub fn with_recursive(
        &self,
        name: &str,
        query: &impl ToOperationNode,
    ) -> QuarryResult<QueryCreator> {
        self.with_cte(name, query, None, true)
    }

    /// `with name as [not] materialized (...)`, PostgreSQL only.
    pub fn with_materialized(
        &self,
        name: &str,
        query: &impl ToOperationNode,
        materialized: bool,
    ) -> QuarryResult<QueryCreator> {
        self.with_cte(name, query, Some(materialized), false)
    }

    fn with_cte(
        &self,
        name: &str,
        query: &impl ToOperationNode,
        materialized: Option<bool>,
        recursive: bool,
    ) -> QuarryResult<QueryCreator> {
        let cte = CommonTableExpressionNode {
            name: Arc::new(parse_common_table_expression_name(name)?),
            materialized,
            expression: query.to_operation_node(),
        };
        let with = match &self.with {
            Some(with) => with.with_expression(cte),
            None => WithNode::default().with_expression(cte),
        };
        Ok(QueryCreator {
            with: Some(Arc::new(WithNode {
                recursive: with.recursive || recursive,
                ..with
            })),
            ..self.clone()
        })
    }

    /// Builders for DDL statements.
    pub fn schema(&self) -> SchemaModule {
        SchemaModule::new(self.executor.clone())
    }

    /// Plugins and the dialect compiler over any node, without I/O.
    pub fn compile_node(&self, node: &OperationNode) -> QuarryResult<CompiledQuery> {
        self.executor.compile_query(node, &QueryId::new())
    }

    pub async fn execute_node(&self, node: &OperationNode) -> QuarryResult<QueryResult> {
        let compiled = self.compile_node(node)?;
        self.executor.execute_query(&compiled).await
    }

    /// Runs a raw statement built with [`raw`](crate::expression::raw) or
    /// [`raw_with`](crate::expression::raw_with).
    pub async fn execute_raw(&self, sql: &Expr) -> QuarryResult<QueryResult> {
        self.execute_node(sql.node()).await
    }
}

#[cfg(test)]
mod tests;
