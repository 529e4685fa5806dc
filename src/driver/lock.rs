//! Migration locks.
//!
//! The migrator holds one of these for the whole batch so that two
//! processes never run migrations against the same database at once.

use async_trait::async_trait;

use crate::error::{QuarryError, QuarryResult};
use crate::transpiler::Dialect;

use super::{DatabaseConnection, raw_query};

/// Name used for application-level locks.
pub const MIGRATION_LOCK_NAME: &str = "quarry_migration_lock";

/// Arbitrary but fixed id for PostgreSQL advisory locks.
const ADVISORY_LOCK_ID: i64 = 3_853_314_791_062_309_107;

#[async_trait]
pub trait MigrationLock: Send + Sync {
    /// Called inside the migration transaction, before anything is read.
    async fn acquire(&self, connection: &mut dyn DatabaseConnection) -> QuarryResult<()>;

    /// Called after the batch, before the transaction ends.
    async fn release(&self, connection: &mut dyn DatabaseConnection) -> QuarryResult<()>;
}

/// Transaction-scoped advisory lock; released by commit or rollback.
pub struct PostgresAdvisoryLock;

#[async_trait]
impl MigrationLock for PostgresAdvisoryLock {
    async fn acquire(&self, connection: &mut dyn DatabaseConnection) -> QuarryResult<()> {
        connection
            .execute_query(&raw_query(format!(
                "select pg_advisory_xact_lock({})",
                ADVISORY_LOCK_ID
            )))
            .await?;
        Ok(())
    }

    async fn release(&self, _connection: &mut dyn DatabaseConnection) -> QuarryResult<()> {
        Ok(())
    }
}

/// Session-scoped named lock.
pub struct MysqlNamedLock;

#[async_trait]
impl MigrationLock for MysqlNamedLock {
    async fn acquire(&self, connection: &mut dyn DatabaseConnection) -> QuarryResult<()> {
        let result = connection
            .execute_query(&raw_query(format!(
                "select get_lock('{}', -1) as acquired",
                MIGRATION_LOCK_NAME
            )))
            .await?;
        let acquired = result
            .rows
            .first()
            .and_then(|row| row.get("acquired"))
            .and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.parse().ok())));
        match acquired {
            Some(1) => Ok(()),
            _ => Err(QuarryError::Migration(
                "could not acquire the migration lock".to_string(),
            )),
        }
    }

    async fn release(&self, connection: &mut dyn DatabaseConnection) -> QuarryResult<()> {
        connection
            .execute_query(&raw_query(format!(
                "select release_lock('{}')",
                MIGRATION_LOCK_NAME
            )))
            .await?;
        Ok(())
    }
}

/// Transaction-owned application lock.
pub struct MssqlAppLock;

#[async_trait]
impl MigrationLock for MssqlAppLock {
    async fn acquire(&self, connection: &mut dyn DatabaseConnection) -> QuarryResult<()> {
        connection
            .execute_query(&raw_query(format!(
                "exec sp_getapplock @Resource = '{}', @LockMode = 'Exclusive'",
                MIGRATION_LOCK_NAME
            )))
            .await?;
        Ok(())
    }

    async fn release(&self, _connection: &mut dyn DatabaseConnection) -> QuarryResult<()> {
        Ok(())
    }
}

/// SQLite takes a database-wide write lock for the migration transaction,
/// so there is nothing else to do.
pub struct NoopLock;

#[async_trait]
impl MigrationLock for NoopLock {
    async fn acquire(&self, _connection: &mut dyn DatabaseConnection) -> QuarryResult<()> {
        Ok(())
    }

    async fn release(&self, _connection: &mut dyn DatabaseConnection) -> QuarryResult<()> {
        Ok(())
    }
}

pub fn lock_for(dialect: Dialect) -> Box<dyn MigrationLock> {
    match dialect {
        Dialect::Postgres => Box::new(PostgresAdvisoryLock),
        Dialect::MySql => Box::new(MysqlNamedLock),
        Dialect::MsSql => Box::new(MssqlAppLock),
        Dialect::Sqlite | Dialect::Oracle => Box::new(NoopLock),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::driver::Driver;
    use crate::driver::mock::MockDriver;

    #[tokio::test]
    async fn test_postgres_lock_statement() {
        let driver = MockDriver::new(Dialect::Postgres);
        let mut connection = driver.acquire_connection().await.unwrap();
        let lock = lock_for(Dialect::Postgres);
        lock.acquire(connection.as_mut()).await.unwrap();
        lock.release(connection.as_mut()).await.unwrap();
        assert_eq!(
            driver.statements(),
            vec![format!("select pg_advisory_xact_lock({})", ADVISORY_LOCK_ID)]
        );
    }

    #[tokio::test]
    async fn test_mysql_lock_checks_result() {
        let row: HashMap<String, serde_json::Value> =
            HashMap::from([("acquired".to_string(), serde_json::json!(1))]);
        let driver = MockDriver::new(Dialect::MySql).with_rows(vec![row]);
        let mut connection = driver.acquire_connection().await.unwrap();
        let lock = lock_for(Dialect::MySql);
        lock.acquire(connection.as_mut()).await.unwrap();
        lock.release(connection.as_mut()).await.unwrap();
        assert_eq!(driver.statements().len(), 2);

        let refused = MockDriver::new(Dialect::MySql);
        let mut connection = refused.acquire_connection().await.unwrap();
        assert!(lock.acquire(connection.as_mut()).await.is_err());
    }

    #[tokio::test]
    async fn test_sqlite_lock_is_silent() {
        let driver = MockDriver::new(Dialect::Sqlite);
        let mut connection = driver.acquire_connection().await.unwrap();
        lock_for(Dialect::Sqlite)
            .acquire(connection.as_mut())
            .await
            .unwrap();
        assert!(driver.statements().is_empty());
    }
}
