//! Driver SPI.
//!
//! A [`Driver`] owns the pool and hands out [`DatabaseConnection`]s; the
//! connection executes compiled queries. [`SqlxDriver`] covers SQLite,
//! PostgreSQL and MySQL.

mod lock;
mod runtime;
mod sqlx_driver;

#[cfg(test)]
pub(crate) mod mock;

use std::collections::HashMap;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::ast::RawNode;
use crate::error::QuarryResult;
use crate::query_id::QueryId;
use crate::transpiler::{CompiledQuery, Dialect};

pub use sqlx_driver::{PoolSettings, SqlxConnection, SqlxDriver};
pub use lock::{MigrationLock, lock_for};
pub use runtime::RuntimeDriver;

/// One result row, keyed by column name.
pub type Row = HashMap<String, serde_json::Value>;

/// What a connection returns for one statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    /// Id of the last inserted row, where the database reports one.
    pub insert_id: Option<i64>,
    pub num_affected_rows: Option<u64>,
    /// Rows actually changed by an update, as opposed to matched. Only
    /// drivers that report it fill it in; `SqlxDriver` leaves it `None`.
    pub num_changed_rows: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
    Snapshot,
}

impl IsolationLevel {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "read uncommitted",
            IsolationLevel::ReadCommitted => "read committed",
            IsolationLevel::RepeatableRead => "repeatable read",
            IsolationLevel::Serializable => "serializable",
            IsolationLevel::Snapshot => "snapshot",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

impl AccessMode {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            AccessMode::ReadOnly => "read only",
            AccessMode::ReadWrite => "read write",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionSettings {
    pub isolation_level: Option<IsolationLevel>,
    pub access_mode: Option<AccessMode>,
}

/// Statements that open a transaction with `settings`.
pub fn begin_statements(dialect: Dialect, settings: &TransactionSettings) -> Vec<String> {
    let modes: Vec<String> = settings
        .isolation_level
        .map(|level| format!("isolation level {}", level.sql_keyword()))
        .into_iter()
        .chain(settings.access_mode.map(|mode| mode.sql_keyword().to_string()))
        .collect();

    match dialect {
        Dialect::Postgres if !modes.is_empty() => {
            vec![format!("start transaction {}", modes.join(", "))]
        }
        Dialect::MySql if !modes.is_empty() => vec![
            format!("set transaction {}", modes.join(", ")),
            "begin".to_string(),
        ],
        Dialect::MsSql => {
            let mut statements = Vec::new();
            if let Some(level) = settings.isolation_level {
                statements.push(format!("set transaction isolation level {}", level.sql_keyword()));
            }
            statements.push("begin transaction".to_string());
            statements
        }
        Dialect::Oracle => vec!["set transaction read write".to_string()],
        _ => vec!["begin".to_string()],
    }
}

/// A parameterless statement that bypasses the compiler.
pub fn raw_query(sql: impl Into<String>) -> CompiledQuery {
    let sql = sql.into();
    CompiledQuery {
        query: RawNode::sql(sql.clone()).into(),
        sql,
        parameters: Vec::new(),
        query_id: QueryId::new(),
    }
}

/// A single database connection.
#[async_trait]
pub trait DatabaseConnection: Send {
    async fn execute_query(&mut self, query: &CompiledQuery) -> QuarryResult<QueryResult>;

    /// Rows of `query` in chunks of at most `chunk_size`.
    fn stream_query<'a>(
        &'a mut self,
        query: &'a CompiledQuery,
        chunk_size: usize,
    ) -> BoxStream<'a, QuarryResult<QueryResult>>;

    /// The connection the driver handed out, with adapters stripped.
    fn into_inner(self: Box<Self>) -> Box<dyn DatabaseConnection>;
}

/// Pool owner and transaction control.
///
/// Transaction and savepoint methods default to plain SQL statements
/// executed on the connection.
#[async_trait]
pub trait Driver: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Open the pool. Called once before the first connection is acquired.
    async fn init(&self) -> QuarryResult<()>;

    async fn acquire_connection(&self) -> QuarryResult<Box<dyn DatabaseConnection>>;

    /// Hand a connection back to the pool.
    fn release_connection(&self, connection: Box<dyn DatabaseConnection>);

    async fn begin_transaction(
        &self,
        connection: &mut dyn DatabaseConnection,
        settings: &TransactionSettings,
    ) -> QuarryResult<()> {
        for statement in begin_statements(self.dialect(), settings) {
            connection.execute_query(&raw_query(statement)).await?;
        }
        Ok(())
    }

    async fn commit_transaction(&self, connection: &mut dyn DatabaseConnection) -> QuarryResult<()> {
        connection.execute_query(&raw_query("commit")).await?;
        Ok(())
    }

    async fn rollback_transaction(
        &self,
        connection: &mut dyn DatabaseConnection,
    ) -> QuarryResult<()> {
        connection.execute_query(&raw_query("rollback")).await?;
        Ok(())
    }

    async fn savepoint(&self, connection: &mut dyn DatabaseConnection, name: &str) -> QuarryResult<()> {
        let name = self.dialect().generator().quote_identifier(name);
        connection
            .execute_query(&raw_query(format!("savepoint {}", name)))
            .await?;
        Ok(())
    }

    async fn rollback_to_savepoint(
        &self,
        connection: &mut dyn DatabaseConnection,
        name: &str,
    ) -> QuarryResult<()> {
        let name = self.dialect().generator().quote_identifier(name);
        connection
            .execute_query(&raw_query(format!("rollback to savepoint {}", name)))
            .await?;
        Ok(())
    }

    async fn release_savepoint(
        &self,
        connection: &mut dyn DatabaseConnection,
        name: &str,
    ) -> QuarryResult<()> {
        let name = self.dialect().generator().quote_identifier(name);
        connection
            .execute_query(&raw_query(format!("release savepoint {}", name)))
            .await?;
        Ok(())
    }

    /// Close the pool.
    async fn destroy(&self) -> QuarryResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_statements() {
        let settings = TransactionSettings {
            isolation_level: Some(IsolationLevel::Serializable),
            access_mode: Some(AccessMode::ReadOnly),
        };
        assert_eq!(
            begin_statements(Dialect::Postgres, &settings),
            vec!["start transaction isolation level serializable, read only"]
        );
        assert_eq!(
            begin_statements(Dialect::MySql, &settings),
            vec![
                "set transaction isolation level serializable, read only",
                "begin"
            ]
        );
        assert_eq!(begin_statements(Dialect::Sqlite, &settings), vec!["begin"]);
        assert_eq!(
            begin_statements(Dialect::Postgres, &TransactionSettings::default()),
            vec!["begin"]
        );
    }
}
