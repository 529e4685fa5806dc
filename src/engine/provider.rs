//! Where the executor gets its connections from.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::driver::{DatabaseConnection, Driver};
use crate::error::{QuarryError, QuarryResult};

/// Hands out a connection for the duration of one statement (or stream).
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    async fn acquire(&self) -> QuarryResult<ConnectionLease>;
}

/// A connection borrowed from a provider.
///
/// Dropping the lease gives the connection back: pooled connections are
/// released to the driver exactly once, pinned ones unlock their slot.
pub struct ConnectionLease {
    inner: LeaseInner,
}

enum LeaseInner {
    Pooled {
        connection: Option<Box<dyn DatabaseConnection>>,
        driver: Arc<dyn Driver>,
    },
    Pinned(OwnedMutexGuard<PinnedConnection>),
}

impl ConnectionLease {
    pub fn connection(&mut self) -> QuarryResult<&mut (dyn DatabaseConnection + 'static)> {
        match &mut self.inner {
            LeaseInner::Pooled { connection, .. } => connection
                .as_deref_mut()
                .ok_or_else(|| QuarryError::Connection("connection already released".to_string())),
            LeaseInner::Pinned(guard) => guard.connection(),
        }
    }
}

impl Drop for ConnectionLease {
    fn drop(&mut self) {
        if let LeaseInner::Pooled { connection, driver } = &mut self.inner {
            if let Some(connection) = connection.take() {
                driver.release_connection(connection);
            }
        }
    }
}

/// Acquires a fresh pooled connection per statement.
pub struct DefaultConnectionProvider {
    driver: Arc<dyn Driver>,
}

impl DefaultConnectionProvider {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self { driver }
    }
}

#[async_trait]
impl ConnectionProvider for DefaultConnectionProvider {
    async fn acquire(&self) -> QuarryResult<ConnectionLease> {
        let connection = self.driver.acquire_connection().await?;
        Ok(ConnectionLease {
            inner: LeaseInner::Pooled {
                connection: Some(connection),
                driver: self.driver.clone(),
            },
        })
    }
}

/// One connection held for a transaction or a `connection()` block.
///
/// Concurrent statements queue on the mutex around it, so they run one at a
/// time in the order they acquired the slot.
pub(crate) struct PinnedConnection {
    connection: Option<Box<dyn DatabaseConnection>>,
    driver: Arc<dyn Driver>,
    in_transaction: bool,
}

pub(crate) type PinnedSlot = Arc<Mutex<PinnedConnection>>;

impl PinnedConnection {
    pub(crate) fn new(
        connection: Box<dyn DatabaseConnection>,
        driver: Arc<dyn Driver>,
        in_transaction: bool,
    ) -> Self {
        Self {
            connection: Some(connection),
            driver,
            in_transaction,
        }
    }

    pub(crate) fn into_slot(self) -> PinnedSlot {
        Arc::new(Mutex::new(self))
    }

    pub(crate) fn connection(&mut self) -> QuarryResult<&mut (dyn DatabaseConnection + 'static)> {
        self.connection.as_deref_mut().ok_or_else(|| {
            QuarryError::Transaction(
                "the transaction or connection has already been finished".to_string(),
            )
        })
    }

    pub(crate) fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.connection.is_none()
    }

    /// While set, dropping the slot rolls the transaction back.
    pub(crate) fn set_in_transaction(&mut self, in_transaction: bool) {
        self.in_transaction = in_transaction;
    }

    /// Hand the connection back to the driver. Later statements fail.
    pub(crate) fn release(&mut self) {
        self.in_transaction = false;
        if let Some(connection) = self.connection.take() {
            self.driver.release_connection(connection);
        }
    }
}

impl Drop for PinnedConnection {
    fn drop(&mut self) {
        let Some(mut connection) = self.connection.take() else {
            return;
        };
        if !self.in_transaction {
            self.driver.release_connection(connection);
            return;
        }

        // an unfinished transaction must not go back to the pool as is
        let driver = self.driver.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!("transaction dropped without commit or rollback, rolling back");
                handle.spawn(async move {
                    if let Err(error) = driver.rollback_transaction(connection.as_mut()).await {
                        tracing::warn!(%error, "rollback of a dropped transaction failed");
                    }
                    driver.release_connection(connection);
                });
            }
            Err(_) => {
                tracing::warn!("transaction dropped outside a runtime, discarding its connection");
            }
        }
    }
}

/// Routes every statement to one pinned connection.
pub(crate) struct SingleConnectionProvider {
    slot: PinnedSlot,
}

impl SingleConnectionProvider {
    pub(crate) fn new(slot: PinnedSlot) -> Self {
        Self { slot }
    }
}

#[async_trait]
impl ConnectionProvider for SingleConnectionProvider {
    async fn acquire(&self) -> QuarryResult<ConnectionLease> {
        let guard = self.slot.clone().lock_owned().await;
        if guard.is_finished() {
            return Err(QuarryError::Transaction(
                "the transaction or connection has already been finished".to_string(),
            ));
        }
        Ok(ConnectionLease {
            inner: LeaseInner::Pinned(guard),
        })
    }
}

/// Provider of instances that were built without a driver.
pub(crate) struct OfflineProvider;

#[async_trait]
impl ConnectionProvider for OfflineProvider {
    async fn acquire(&self) -> QuarryResult<ConnectionLease> {
        Err(QuarryError::Connection(
            "no driver configured, this instance can only compile queries".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::mock::MockDriver;
    use crate::driver::raw_query;
    use crate::transpiler::Dialect;

    #[tokio::test]
    async fn test_pooled_lease_releases_once_on_drop() {
        let mock = Arc::new(MockDriver::new(Dialect::Sqlite));
        let provider = DefaultConnectionProvider::new(mock.clone());

        let mut lease = provider.acquire().await.unwrap();
        lease
            .connection()
            .unwrap()
            .execute_query(&raw_query("select 1"))
            .await
            .unwrap();
        drop(lease);

        assert_eq!(mock.acquire_count(), 1);
        assert_eq!(mock.release_count(), 1);
    }

    #[tokio::test]
    async fn test_released_slot_rejects_statements() {
        let mock = Arc::new(MockDriver::new(Dialect::Sqlite));
        let connection = mock.acquire_connection().await.unwrap();
        let slot = PinnedConnection::new(connection, mock.clone(), false).into_slot();
        let provider = SingleConnectionProvider::new(slot.clone());

        assert!(provider.acquire().await.is_ok());
        slot.lock().await.release();
        assert!(matches!(
            provider.acquire().await,
            Err(QuarryError::Transaction(_))
        ));
        assert_eq!(mock.release_count(), 1);
    }

    #[tokio::test]
    async fn test_offline_provider_fails() {
        assert!(matches!(
            OfflineProvider.acquire().await,
            Err(QuarryError::Connection(_))
        ));
    }
}
