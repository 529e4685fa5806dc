//! Runs statements: plugins, compilation, connection, result plugins.

use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::mpsc;

use crate::ast::OperationNode;
use crate::driver::{QueryResult, Row};
use crate::error::{QuarryError, QuarryResult};
use crate::plugin::Plugin;
use crate::query_id::QueryId;
use crate::transpiler::{CompiledQuery, Dialect, compile_with_id};

use super::provider::{ConnectionLease, ConnectionProvider, OfflineProvider};

/// Shared by every builder created from the same [`Quarry`](super::Quarry).
#[derive(Clone)]
pub struct QueryExecutor {
    dialect: Dialect,
    provider: Arc<dyn ConnectionProvider>,
    plugins: Arc<Vec<Arc<dyn Plugin>>>,
}

impl QueryExecutor {
    pub fn new(dialect: Dialect, provider: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            dialect,
            provider,
            plugins: Arc::new(Vec::new()),
        }
    }

    /// An executor that compiles but cannot run anything.
    pub fn offline(dialect: Dialect) -> Self {
        Self::new(dialect, Arc::new(OfflineProvider))
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }

    pub fn with_plugin(&self, plugin: Arc<dyn Plugin>) -> Self {
        let mut plugins = self.plugins.as_ref().clone();
        plugins.push(plugin);
        Self {
            plugins: Arc::new(plugins),
            ..self.clone()
        }
    }

    /// The plugin runs before every plugin already installed.
    pub fn with_plugin_at_front(&self, plugin: Arc<dyn Plugin>) -> Self {
        let mut plugins = self.plugins.as_ref().clone();
        plugins.insert(0, plugin);
        Self {
            plugins: Arc::new(plugins),
            ..self.clone()
        }
    }

    pub fn without_plugins(&self) -> Self {
        Self {
            plugins: Arc::new(Vec::new()),
            ..self.clone()
        }
    }

    pub fn with_provider(&self, provider: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            provider,
            ..self.clone()
        }
    }

    /// Run every plugin over `node`, in order. Each must hand back a node of
    /// the kind it received.
    pub fn transform_query(
        &self,
        node: &OperationNode,
        query_id: &QueryId,
    ) -> QuarryResult<OperationNode> {
        let mut node = node.clone();
        for plugin in self.plugins.iter() {
            let expected = node.kind();
            node = plugin.transform_query(node, query_id)?;
            if node.kind() != expected {
                return Err(QuarryError::PluginContract {
                    expected,
                    actual: node.kind(),
                });
            }
        }
        Ok(node)
    }

    /// Plugins, then the dialect compiler.
    pub fn compile_query(
        &self,
        node: &OperationNode,
        query_id: &QueryId,
    ) -> QuarryResult<CompiledQuery> {
        let node = self.transform_query(node, query_id)?;
        compile_with_id(&node, self.dialect, query_id.clone())
    }

    /// A connection for work that bypasses the compiler, such as migration
    /// locks. Inside a transaction this is the transaction's connection, so
    /// drop the lease before running anything else.
    pub async fn acquire_connection(&self) -> QuarryResult<ConnectionLease> {
        self.provider.acquire().await
    }

    pub async fn execute_query(&self, compiled: &CompiledQuery) -> QuarryResult<QueryResult> {
        let result = {
            let mut lease = self.provider.acquire().await?;
            lease.connection()?.execute_query(compiled).await?
        };
        transform_result(&self.plugins, result, &compiled.query_id).await
    }

    /// Rows of `compiled`, fetched `chunk_size` at a time.
    ///
    /// The connection is held by a background task for as long as the stream
    /// is alive. Dropping the stream early stops the task, which releases the
    /// connection.
    pub fn stream_query(
        &self,
        compiled: CompiledQuery,
        chunk_size: usize,
    ) -> BoxStream<'static, QuarryResult<Row>> {
        let (tx, rx) = mpsc::channel::<QuarryResult<Vec<Row>>>(1);
        let provider = self.provider.clone();
        let plugins = self.plugins.clone();

        tokio::spawn(async move {
            let mut lease = match provider.acquire().await {
                Ok(lease) => lease,
                Err(error) => {
                    let _ = tx.send(Err(error)).await;
                    return;
                }
            };
            let connection = match lease.connection() {
                Ok(connection) => connection,
                Err(error) => {
                    let _ = tx.send(Err(error)).await;
                    return;
                }
            };

            let mut chunks = connection.stream_query(&compiled, chunk_size);
            loop {
                let next = tokio::select! {
                    _ = tx.closed() => break,
                    next = chunks.next() => next,
                };
                let chunk = match next {
                    Some(Ok(chunk)) => {
                        transform_result(&plugins, chunk, &compiled.query_id)
                            .await
                            .map(|result| result.rows)
                    }
                    Some(Err(error)) => Err(error),
                    None => break,
                };
                let failed = chunk.is_err();
                if tx.send(chunk).await.is_err() || failed {
                    break;
                }
            }
        });

        stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|chunk| (chunk, rx))
        })
        .flat_map(|chunk| {
            let rows: Vec<QuarryResult<Row>> = match chunk {
                Ok(rows) => rows.into_iter().map(Ok).collect(),
                Err(error) => vec![Err(error)],
            };
            stream::iter(rows)
        })
        .boxed()
    }
}

async fn transform_result(
    plugins: &[Arc<dyn Plugin>],
    mut result: QueryResult,
    query_id: &QueryId,
) -> QuarryResult<QueryResult> {
    for plugin in plugins {
        result = plugin.transform_result(result, query_id).await?;
    }
    Ok(result)
}
