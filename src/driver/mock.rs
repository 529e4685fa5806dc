//! In-memory driver for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

use crate::error::{QuarryError, QuarryResult};
use crate::transpiler::{CompiledQuery, Dialect};

use super::{DatabaseConnection, Driver, QueryResult, Row};

#[derive(Default)]
struct Shared {
    statements: Mutex<Vec<String>>,
    rows: Mutex<Vec<Row>>,
    fail_on: Mutex<Option<String>>,
    init: AtomicUsize,
    acquire: AtomicUsize,
    release: AtomicUsize,
    destroy: AtomicUsize,
}

pub(crate) struct MockDriver {
    dialect: Dialect,
    shared: Arc<Shared>,
}

impl MockDriver {
    pub(crate) fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            shared: Arc::new(Shared::default()),
        }
    }

    /// Rows returned by every statement.
    pub(crate) fn with_rows(self, rows: Vec<Row>) -> Self {
        *self.shared.rows.lock().unwrap() = rows;
        self
    }

    /// Fail any statement whose SQL contains `needle`.
    pub(crate) fn fail_on(&self, needle: &str) {
        *self.shared.fail_on.lock().unwrap() = Some(needle.to_string());
    }

    pub(crate) fn statements(&self) -> Vec<String> {
        self.shared.statements.lock().unwrap().clone()
    }

    pub(crate) fn init_count(&self) -> usize {
        self.shared.init.load(Ordering::SeqCst)
    }

    pub(crate) fn acquire_count(&self) -> usize {
        self.shared.acquire.load(Ordering::SeqCst)
    }

    pub(crate) fn release_count(&self) -> usize {
        self.shared.release.load(Ordering::SeqCst)
    }

    pub(crate) fn destroy_count(&self) -> usize {
        self.shared.destroy.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Driver for MockDriver {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn init(&self) -> QuarryResult<()> {
        self.shared.init.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn acquire_connection(&self) -> QuarryResult<Box<dyn DatabaseConnection>> {
        self.shared.acquire.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            shared: self.shared.clone(),
        }))
    }

    fn release_connection(&self, _connection: Box<dyn DatabaseConnection>) {
        self.shared.release.fetch_add(1, Ordering::SeqCst);
    }

    async fn destroy(&self) -> QuarryResult<()> {
        self.shared.destroy.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockConnection {
    shared: Arc<Shared>,
}

impl MockConnection {
    fn run(&self, query: &CompiledQuery) -> QuarryResult<QueryResult> {
        self.shared
            .statements
            .lock()
            .unwrap()
            .push(query.sql.clone());
        if let Some(needle) = self.shared.fail_on.lock().unwrap().as_deref() {
            if query.sql.contains(needle) {
                return Err(QuarryError::Connection(format!("mock failure on '{}'", query.sql)));
            }
        }
        let rows = self.shared.rows.lock().unwrap().clone();
        let affected = rows.len() as u64;
        Ok(QueryResult {
            rows,
            num_affected_rows: Some(affected),
            ..QueryResult::default()
        })
    }
}

#[async_trait]
impl DatabaseConnection for MockConnection {
    async fn execute_query(&mut self, query: &CompiledQuery) -> QuarryResult<QueryResult> {
        self.run(query)
    }

    fn stream_query<'a>(
        &'a mut self,
        query: &'a CompiledQuery,
        chunk_size: usize,
    ) -> BoxStream<'a, QuarryResult<QueryResult>> {
        let chunks: Vec<QuarryResult<QueryResult>> = match self.run(query) {
            Ok(result) => result
                .rows
                .chunks(chunk_size.max(1))
                .map(|rows| {
                    Ok(QueryResult {
                        rows: rows.to_vec(),
                        ..QueryResult::default()
                    })
                })
                .collect(),
            Err(e) => vec![Err(e)],
        };
        stream::iter(chunks).boxed()
    }

    fn into_inner(self: Box<Self>) -> Box<dyn DatabaseConnection> {
        self
    }
}
