//! Driver wrapper that owns initialization and query logging.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use tokio::sync::OnceCell;

use crate::error::QuarryResult;
use crate::log::Log;
use crate::transpiler::{CompiledQuery, Dialect};

use super::{DatabaseConnection, Driver, QueryResult, TransactionSettings};

/// Wraps a user driver so that `init` runs once, lazily, before the first
/// acquire, and so that every executed query is logged when logging is on.
pub struct RuntimeDriver {
    driver: Arc<dyn Driver>,
    initialized: OnceCell<()>,
    log: Option<Arc<Log>>,
}

impl RuntimeDriver {
    pub fn new(driver: Arc<dyn Driver>, log: Option<Log>) -> Self {
        Self {
            driver,
            initialized: OnceCell::new(),
            log: log.map(Arc::new),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }
}

#[async_trait]
impl Driver for RuntimeDriver {
    fn dialect(&self) -> Dialect {
        self.driver.dialect()
    }

    async fn init(&self) -> QuarryResult<()> {
        self.initialized
            .get_or_try_init(|| async {
                tracing::debug!(dialect = %self.driver.dialect(), "initializing driver");
                self.driver.init().await
            })
            .await
            .map(|_| ())
    }

    async fn acquire_connection(&self) -> QuarryResult<Box<dyn DatabaseConnection>> {
        self.init().await?;
        let connection = self.driver.acquire_connection().await?;
        Ok(match &self.log {
            Some(log) => Box::new(LoggingConnection {
                inner: connection,
                log: log.clone(),
            }),
            None => connection,
        })
    }

    fn release_connection(&self, connection: Box<dyn DatabaseConnection>) {
        self.driver.release_connection(connection.into_inner());
    }

    async fn begin_transaction(
        &self,
        connection: &mut dyn DatabaseConnection,
        settings: &TransactionSettings,
    ) -> QuarryResult<()> {
        self.driver.begin_transaction(connection, settings).await
    }

    async fn commit_transaction(&self, connection: &mut dyn DatabaseConnection) -> QuarryResult<()> {
        self.driver.commit_transaction(connection).await
    }

    async fn rollback_transaction(
        &self,
        connection: &mut dyn DatabaseConnection,
    ) -> QuarryResult<()> {
        self.driver.rollback_transaction(connection).await
    }

    async fn savepoint(&self, connection: &mut dyn DatabaseConnection, name: &str) -> QuarryResult<()> {
        self.driver.savepoint(connection, name).await
    }

    async fn rollback_to_savepoint(
        &self,
        connection: &mut dyn DatabaseConnection,
        name: &str,
    ) -> QuarryResult<()> {
        self.driver.rollback_to_savepoint(connection, name).await
    }

    async fn release_savepoint(
        &self,
        connection: &mut dyn DatabaseConnection,
        name: &str,
    ) -> QuarryResult<()> {
        self.driver.release_savepoint(connection, name).await
    }

    async fn destroy(&self) -> QuarryResult<()> {
        if self.is_initialized() {
            self.driver.destroy().await?;
        }
        Ok(())
    }
}

struct LoggingConnection {
    inner: Box<dyn DatabaseConnection>,
    log: Arc<Log>,
}

#[async_trait]
impl DatabaseConnection for LoggingConnection {
    async fn execute_query(&mut self, query: &CompiledQuery) -> QuarryResult<QueryResult> {
        let start = Instant::now();
        let result = self.inner.execute_query(query).await;
        match &result {
            Ok(_) => self.log.query(query, start.elapsed()),
            Err(error) => self.log.error(error, query, start.elapsed()),
        }
        result
    }

    fn stream_query<'a>(
        &'a mut self,
        query: &'a CompiledQuery,
        chunk_size: usize,
    ) -> BoxStream<'a, QuarryResult<QueryResult>> {
        let start = Instant::now();
        let log = self.log.clone();
        let mut logged = false;
        self.inner
            .stream_query(query, chunk_size)
            .inspect(move |chunk| {
                if logged {
                    return;
                }
                logged = true;
                match chunk {
                    Ok(_) => log.query(query, start.elapsed()),
                    Err(error) => log.error(error, query, start.elapsed()),
                }
            })
            .boxed()
    }

    fn into_inner(self: Box<Self>) -> Box<dyn DatabaseConnection> {
        self.inner.into_inner()
    }
}
