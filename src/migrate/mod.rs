//! Schema migrations.
//!
//! Migrations are named and run in name order. Executed names are recorded in
//! `quarry_migration`; a batch holds the dialect's migration lock and runs
//! inside one transaction where the database has transactional DDL.
//!
//! ```rust,ignore
//! struct CreatePerson;
//!
//! #[async_trait]
//! impl Migration for CreatePerson {
//!     async fn up(&self, db: &QueryCreator) -> QuarryResult<()> {
//!         db.schema()
//!             .create_table("person")?
//!             .add_column_with("id", "integer", |col| Ok(col.primary_key()))?
//!             .execute()
//!             .await
//!     }
//! }
//!
//! let result = Migrator::new(db)
//!     .with_migration("2024_01_01_create_person", CreatePerson)
//!     .migrate_to_latest()
//!     .await;
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::builder::WhereInterface;
use crate::driver::lock_for;
use crate::engine::{Quarry, QueryCreator};
use crate::error::{QuarryError, QuarryResult};
use crate::expression::val;
use crate::transpiler::Dialect;

pub const MIGRATION_TABLE: &str = "quarry_migration";
pub const MIGRATION_LOCK_TABLE: &str = "quarry_migration_lock";
const MIGRATION_LOCK_ID: &str = "migration_lock";

#[async_trait]
pub trait Migration: Send + Sync {
    async fn up(&self, db: &QueryCreator) -> QuarryResult<()>;

    /// Migrations without a `down` are simply unrecorded when migrating down.
    async fn down(&self, _db: &QueryCreator) -> QuarryResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
    Success,
    Error,
    NotExecuted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationResult {
    pub migration_name: String,
    pub direction: MigrationDirection,
    pub status: MigrationStatus,
}

/// Outcome of a migrator run. `error` is set when the batch failed; the
/// results then show which migration failed and which never ran.
#[derive(Debug, Default)]
pub struct MigrationResultSet {
    pub error: Option<QuarryError>,
    pub results: Vec<MigrationResult>,
}

impl MigrationResultSet {
    fn failed(error: QuarryError) -> Self {
        Self {
            error: Some(error),
            results: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationInfo {
    pub name: String,
    /// RFC 3339 timestamp of when the migration ran, if it has.
    pub executed_at: Option<String>,
}

/// Where a run should leave the database.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Latest,
    Up,
    Down,
    Named(String),
}

/// Which migrations a run executes, in execution order.
#[derive(Debug, PartialEq)]
struct Plan {
    direction: MigrationDirection,
    names: Vec<String>,
}

#[derive(Clone)]
pub struct Migrator {
    db: Quarry,
    migrations: BTreeMap<String, Arc<dyn Migration>>,
}

impl fmt::Debug for Migrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migrator")
            .field("migrations", &self.migrations.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Migrator {
    pub fn new(db: Quarry) -> Self {
        Self {
            db,
            migrations: BTreeMap::new(),
        }
    }

    /// Registers `migration` under `name`. Names sort lexically, so prefix
    /// them with a date or sequence number.
    pub fn with_migration(mut self, name: impl Into<String>, migration: impl Migration + 'static) -> Self {
        self.migrations.insert(name.into(), Arc::new(migration));
        self
    }

    /// Every registered migration and when it ran.
    pub async fn get_migrations(&self) -> QuarryResult<Vec<MigrationInfo>> {
        self.ensure_tables().await?;
        let executed = executed_migrations(&self.db).await?;
        Ok(self
            .migrations
            .keys()
            .map(|name| MigrationInfo {
                name: name.clone(),
                executed_at: executed
                    .iter()
                    .find(|(executed, _)| executed == name)
                    .and_then(|(_, timestamp)| timestamp.clone()),
            })
            .collect())
    }

    pub async fn migrate_to_latest(&self) -> MigrationResultSet {
        self.migrate(Target::Latest).await
    }

    /// Runs the next pending migration.
    pub async fn migrate_up(&self) -> MigrationResultSet {
        self.migrate(Target::Up).await
    }

    /// Reverts the last executed migration.
    pub async fn migrate_down(&self) -> MigrationResultSet {
        self.migrate(Target::Down).await
    }

    /// Migrates up or down until `name` is the last executed migration.
    pub async fn migrate_to(&self, name: &str) -> MigrationResultSet {
        self.migrate(Target::Named(name.to_string())).await
    }

    async fn migrate(&self, target: Target) -> MigrationResultSet {
        if let Err(error) = self.ensure_tables().await {
            return MigrationResultSet::failed(error);
        }

        let mut results = Vec::new();
        let slots = &mut results;
        let outcome = self
            .run_locked(move |db| self.run_batch(db, target, slots))
            .await;

        match outcome {
            Ok(()) => MigrationResultSet {
                error: None,
                results,
            },
            Err(error) => {
                tracing::error!(%error, "migration failed");
                MigrationResultSet {
                    error: Some(error),
                    results,
                }
            }
        }
    }

    async fn ensure_tables(&self) -> QuarryResult<()> {
        let schema = self.db.schema();
        schema
            .create_table(MIGRATION_TABLE)?
            .if_not_exists()
            .add_column_with("name", "varchar(255)", |col| Ok(col.primary_key().not_null()))?
            .add_column_with("timestamp", "varchar(255)", |col| Ok(col.not_null()))?
            .execute()
            .await?;
        schema
            .create_table(MIGRATION_LOCK_TABLE)?
            .if_not_exists()
            .add_column_with("id", "varchar(255)", |col| Ok(col.primary_key().not_null()))?
            .add_column_with("is_locked", "integer", |col| col.not_null().default_to(0))?
            .execute()
            .await?;

        let lock_row = self
            .db
            .select_from(MIGRATION_LOCK_TABLE)?
            .select(["id"])?
            .where_("id", "=", MIGRATION_LOCK_ID)?
            .execute()
            .await?;
        if lock_row.is_empty() {
            self.db
                .insert_into(MIGRATION_LOCK_TABLE)?
                .values(vec![vec![("id", val(MIGRATION_LOCK_ID)), ("is_locked", val(0))]])?
                .execute()
                .await?;
        }
        Ok(())
    }

    /// Runs `f` holding the migration lock, in a transaction when the
    /// dialect has transactional DDL and on one pinned connection otherwise.
    async fn run_locked<F, Fut>(&self, f: F) -> QuarryResult<()>
    where
        F: FnOnce(Quarry) -> Fut,
        Fut: Future<Output = QuarryResult<()>>,
    {
        let dialect = self.db.dialect();
        let locked = |db: Quarry| async move {
            let lock = lock_for(dialect);
            {
                let mut lease = db.executor().acquire_connection().await?;
                lock.acquire(lease.connection()?).await?;
            }
            let outcome = f(db.clone()).await;
            let released = {
                let mut lease = db.executor().acquire_connection().await?;
                lock.release(lease.connection()?).await
            };
            outcome.and(released)
        };

        if has_transactional_ddl(dialect) {
            self.db
                .transaction()
                .execute(|trx| locked(Quarry::clone(&trx)))
                .await
        } else {
            self.db.connection().execute(locked).await
        }
    }

    async fn run_batch(
        &self,
        db: Quarry,
        target: Target,
        results: &mut Vec<MigrationResult>,
    ) -> QuarryResult<()> {
        let executed: Vec<String> = executed_migrations(&db)
            .await?
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        let names: Vec<&String> = self.migrations.keys().collect();
        validate_history(&names, &executed)?;
        let plan = plan(&names, executed.len(), &target)?;

        results.extend(plan.names.iter().map(|name| MigrationResult {
            migration_name: name.clone(),
            direction: plan.direction,
            status: MigrationStatus::NotExecuted,
        }));
        if plan.names.is_empty() {
            tracing::info!("no migrations to run");
        }

        for (index, name) in plan.names.iter().enumerate() {
            let Some(migration) = self.migrations.get(name) else {
                return Err(QuarryError::Migration(format!("unknown migration '{}'", name)));
            };
            tracing::info!(migration = %name, direction = ?plan.direction, "running migration");

            let outcome = match plan.direction {
                MigrationDirection::Up => match migration.up(&db).await {
                    Ok(()) => record(&db, name).await,
                    Err(error) => Err(error),
                },
                MigrationDirection::Down => match migration.down(&db).await {
                    Ok(()) => unrecord(&db, name).await,
                    Err(error) => Err(error),
                },
            };

            results[index].status = match outcome {
                Ok(()) => MigrationStatus::Success,
                Err(_) => MigrationStatus::Error,
            };
            if let Err(error) = outcome {
                return Err(QuarryError::Migration(format!(
                    "migration '{}' failed: {}",
                    name, error
                )));
            }
        }
        Ok(())
    }
}

fn has_transactional_ddl(dialect: Dialect) -> bool {
    matches!(dialect, Dialect::Postgres | Dialect::Sqlite | Dialect::MsSql)
}

/// `(name, timestamp)` of every executed migration, in name order.
async fn executed_migrations(db: &QueryCreator) -> QuarryResult<Vec<(String, Option<String>)>> {
    let rows = db
        .select_from(MIGRATION_TABLE)?
        .select(["name", "timestamp"])?
        .order_by("name")?
        .execute()
        .await?;
    rows.into_iter()
        .map(|row| {
            let name = row
                .get("name")
                .and_then(|name| name.as_str())
                .ok_or_else(|| {
                    QuarryError::Migration(format!("{} row without a name", MIGRATION_TABLE))
                })?
                .to_string();
            let timestamp = row
                .get("timestamp")
                .and_then(|timestamp| timestamp.as_str())
                .map(str::to_string);
            Ok((name, timestamp))
        })
        .collect()
}

async fn record(db: &QueryCreator, name: &str) -> QuarryResult<()> {
    db.insert_into(MIGRATION_TABLE)?
        .values(vec![vec![
            ("name", val(name)),
            ("timestamp", val(chrono::Utc::now().to_rfc3339())),
        ]])?
        .execute()
        .await?;
    Ok(())
}

async fn unrecord(db: &QueryCreator, name: &str) -> QuarryResult<()> {
    db.delete_from(MIGRATION_TABLE)?
        .where_("name", "=", name)?
        .execute()
        .await?;
    Ok(())
}

/// Executed migrations must be a prefix of the registered ones.
fn validate_history(names: &[&String], executed: &[String]) -> QuarryResult<()> {
    for (index, executed_name) in executed.iter().enumerate() {
        if !names.contains(&executed_name) {
            return Err(QuarryError::Migration(format!(
                "corrupted migrations: previously executed migration '{}' is missing",
                executed_name
            )));
        }
        if names.get(index).copied() != Some(executed_name) {
            return Err(QuarryError::Migration(format!(
                "corrupted migrations: expected previously executed migration '{}' at position {}",
                executed_name, index
            )));
        }
    }
    Ok(())
}

fn plan(names: &[&String], executed: usize, target: &Target) -> QuarryResult<Plan> {
    let up = |end: usize| Plan {
        direction: MigrationDirection::Up,
        names: names[executed..end].iter().map(|name| name.to_string()).collect(),
    };
    let down = |start: usize| Plan {
        direction: MigrationDirection::Down,
        names: names[start..executed]
            .iter()
            .rev()
            .map(|name| name.to_string())
            .collect(),
    };

    Ok(match target {
        Target::Latest => up(names.len()),
        Target::Up => up((executed + 1).min(names.len())),
        Target::Down => down(executed.saturating_sub(1)),
        Target::Named(name) => {
            let index = names
                .iter()
                .position(|candidate| *candidate == name)
                .ok_or_else(|| QuarryError::Migration(format!("unknown migration '{}'", name)))?;
            if index < executed {
                down(index + 1)
            } else {
                up(index + 1)
            }
        }
    })
}

#[cfg(test)]
mod tests;
