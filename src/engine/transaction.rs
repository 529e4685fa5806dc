//! Transactions and pinned connections.

use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::driver::{AccessMode, DatabaseConnection, Driver, IsolationLevel, TransactionSettings};
use crate::error::{QuarryError, QuarryResult};

use super::Quarry;
use super::provider::{PinnedConnection, PinnedSlot};

/// Rolls back after `error`. A failing rollback is reported alongside the
/// original error, never instead of it.
async fn rollback_after(
    driver: &dyn Driver,
    connection: &mut dyn DatabaseConnection,
    error: QuarryError,
) -> QuarryError {
    match driver.rollback_transaction(connection).await {
        Ok(()) => error,
        Err(rollback) => {
            tracing::warn!(%rollback, original = %error, "transaction rollback failed");
            QuarryError::Rollback {
                source: Box::new(error),
                rollback: Box::new(rollback),
            }
        }
    }
}

/// A pinned connection plus whether this scope acquired it.
struct Pinned {
    slot: PinnedSlot,
    owned: bool,
}

async fn pin(quarry: &Quarry, driver: &Arc<dyn Driver>) -> QuarryResult<Pinned> {
    if quarry.is_transaction() {
        return Err(QuarryError::Transaction(
            "nested transactions are not supported, use savepoints".to_string(),
        ));
    }
    if let Some(slot) = quarry.pinned_slot() {
        return Ok(Pinned {
            slot: slot.clone(),
            owned: false,
        });
    }
    let connection = driver.acquire_connection().await?;
    Ok(Pinned {
        slot: PinnedConnection::new(connection, driver.clone(), false).into_slot(),
        owned: true,
    })
}

async fn begin(pinned: &Pinned, driver: &dyn Driver, settings: &TransactionSettings) -> QuarryResult<()> {
    let mut slot = pinned.slot.lock().await;
    driver.begin_transaction(slot.connection()?, settings).await?;
    slot.set_in_transaction(true);
    Ok(())
}

/// Commit, or roll back when `outcome` is an error or the commit fails.
async fn finish<T>(
    pinned: &Pinned,
    driver: &dyn Driver,
    outcome: QuarryResult<T>,
) -> QuarryResult<T> {
    let mut slot = pinned.slot.lock().await;
    let result = {
        let connection = slot.connection()?;
        match outcome {
            Ok(value) => match driver.commit_transaction(connection).await {
                Ok(()) => Ok(value),
                Err(error) => Err(rollback_after(driver, connection, error).await),
            },
            Err(error) => Err(rollback_after(driver, connection, error).await),
        }
    };
    slot.set_in_transaction(false);
    if pinned.owned {
        slot.release();
    }
    result
}

/// A [`Quarry`] whose statements all run on one connection inside a
/// transaction.
#[derive(Clone)]
pub struct Transaction {
    quarry: Quarry,
}

impl Deref for Transaction {
    type Target = Quarry;

    fn deref(&self) -> &Quarry {
        &self.quarry
    }
}

/// `Quarry::transaction()`: runs a closure inside a transaction.
#[derive(Clone)]
pub struct TransactionBuilder {
    quarry: Quarry,
    settings: TransactionSettings,
}

impl TransactionBuilder {
    pub(crate) fn new(quarry: Quarry) -> Self {
        Self {
            quarry,
            settings: TransactionSettings::default(),
        }
    }

    pub fn isolation_level(&self, level: IsolationLevel) -> Self {
        Self {
            settings: TransactionSettings {
                isolation_level: Some(level),
                ..self.settings
            },
            ..self.clone()
        }
    }

    pub fn access_mode(&self, mode: AccessMode) -> Self {
        Self {
            settings: TransactionSettings {
                access_mode: Some(mode),
                ..self.settings
            },
            ..self.clone()
        }
    }

    /// Commits when `f` succeeds, rolls back and returns its error otherwise.
    ///
    /// ```rust,ignore
    /// let id = db
    ///     .transaction()
    ///     .execute(|trx| async move {
    ///         trx.insert_into("person")?.values(vec![vec![("first_name", val("Jennifer"))]])?.execute().await?;
    ///         Ok(1)
    ///     })
    ///     .await?;
    /// ```
    pub async fn execute<F, Fut, T>(&self, f: F) -> QuarryResult<T>
    where
        F: FnOnce(Transaction) -> Fut,
        Fut: Future<Output = QuarryResult<T>>,
    {
        let driver = self.quarry.require_driver()?;
        let pinned = pin(&self.quarry, &driver).await?;
        begin(&pinned, driver.as_ref(), &self.settings).await?;

        let transaction = Transaction {
            quarry: self.quarry.in_transaction(pinned.slot.clone()),
        };
        let outcome = f(transaction).await;
        finish(&pinned, driver.as_ref(), outcome).await
    }
}

/// `Quarry::start_transaction()`: a transaction finished by hand.
#[derive(Clone)]
pub struct ControlledTransactionBuilder {
    quarry: Quarry,
    settings: TransactionSettings,
}

impl ControlledTransactionBuilder {
    pub(crate) fn new(quarry: Quarry) -> Self {
        Self {
            quarry,
            settings: TransactionSettings::default(),
        }
    }

    pub fn isolation_level(&self, level: IsolationLevel) -> Self {
        Self {
            settings: TransactionSettings {
                isolation_level: Some(level),
                ..self.settings
            },
            ..self.clone()
        }
    }

    pub fn access_mode(&self, mode: AccessMode) -> Self {
        Self {
            settings: TransactionSettings {
                access_mode: Some(mode),
                ..self.settings
            },
            ..self.clone()
        }
    }

    pub async fn execute(&self) -> QuarryResult<ControlledTransaction> {
        let driver = self.quarry.require_driver()?;
        let pinned = pin(&self.quarry, &driver).await?;
        begin(&pinned, driver.as_ref(), &self.settings).await?;

        Ok(ControlledTransaction {
            quarry: self.quarry.in_transaction(pinned.slot.clone()),
            pinned,
            driver,
            finished: AtomicBool::new(false),
        })
    }
}

/// A transaction with explicit `commit`, `rollback` and savepoints.
///
/// Dropping it unfinished rolls it back in the background.
pub struct ControlledTransaction {
    quarry: Quarry,
    pinned: Pinned,
    driver: Arc<dyn Driver>,
    finished: AtomicBool,
}

impl Deref for ControlledTransaction {
    type Target = Quarry;

    fn deref(&self) -> &Quarry {
        &self.quarry
    }
}

impl ControlledTransaction {
    pub async fn commit(&self) -> QuarryResult<()> {
        self.end(true).await
    }

    pub async fn rollback(&self) -> QuarryResult<()> {
        self.end(false).await
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    async fn end(&self, commit: bool) -> QuarryResult<()> {
        let mut slot = self.pinned.slot.lock().await;
        if self.finished.swap(true, Ordering::AcqRel) {
            return Err(QuarryError::Transaction(
                "the transaction has already been committed or rolled back".to_string(),
            ));
        }
        let result = {
            let connection = slot.connection()?;
            if commit {
                self.driver.commit_transaction(connection).await
            } else {
                self.driver.rollback_transaction(connection).await
            }
        };
        slot.set_in_transaction(false);
        if self.pinned.owned {
            slot.release();
        }
        result
    }

    pub async fn savepoint(&self, name: &str) -> QuarryResult<()> {
        let mut slot = self.pinned.slot.lock().await;
        self.driver.savepoint(slot.connection()?, name).await
    }

    pub async fn rollback_to_savepoint(&self, name: &str) -> QuarryResult<()> {
        let mut slot = self.pinned.slot.lock().await;
        self.driver.rollback_to_savepoint(slot.connection()?, name).await
    }

    pub async fn release_savepoint(&self, name: &str) -> QuarryResult<()> {
        let mut slot = self.pinned.slot.lock().await;
        self.driver.release_savepoint(slot.connection()?, name).await
    }
}

/// `Quarry::connection()`: runs a closure with every statement on one
/// connection, without a transaction.
#[derive(Clone)]
pub struct ConnectionBuilder {
    quarry: Quarry,
}

impl ConnectionBuilder {
    pub(crate) fn new(quarry: Quarry) -> Self {
        Self { quarry }
    }

    pub async fn execute<F, Fut, T>(&self, f: F) -> QuarryResult<T>
    where
        F: FnOnce(Quarry) -> Fut,
        Fut: Future<Output = QuarryResult<T>>,
    {
        if self.quarry.pinned_slot().is_some() {
            return f(self.quarry.clone()).await;
        }
        let driver = self.quarry.require_driver()?;
        let connection = driver.acquire_connection().await?;
        let slot = PinnedConnection::new(connection, driver.clone(), false).into_slot();

        let outcome = f(self.quarry.on_connection(slot.clone())).await;
        slot.lock().await.release();
        outcome
    }
}
