use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::driver::Row;
use crate::driver::mock::MockDriver;
use crate::expression::raw;

struct RawMigration {
    up: &'static str,
    down: Option<&'static str>,
}

#[async_trait]
impl Migration for RawMigration {
    async fn up(&self, db: &QueryCreator) -> QuarryResult<()> {
        db.execute_raw(&raw(self.up)).await?;
        Ok(())
    }

    async fn down(&self, db: &QueryCreator) -> QuarryResult<()> {
        if let Some(down) = self.down {
            db.execute_raw(&raw(down)).await?;
        }
        Ok(())
    }
}

fn up_only(up: &'static str) -> RawMigration {
    RawMigration { up, down: None }
}

fn row(pairs: &[(&str, serde_json::Value)]) -> Row {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

fn statuses(result: &MigrationResultSet) -> Vec<(&str, MigrationStatus)> {
    result
        .results
        .iter()
        .map(|r| (r.migration_name.as_str(), r.status))
        .collect()
}

const INSERT_RECORD: &str = r#"insert into "quarry_migration" ("name", "timestamp") values ($1, $2)"#;
const SELECT_EXECUTED: &str =
    r#"select "name", "timestamp" from "quarry_migration" order by "name""#;

#[tokio::test]
async fn test_migrate_to_latest_runs_in_name_order() {
    let mock = Arc::new(MockDriver::new(Dialect::Postgres));
    let migrator = Migrator::new(Quarry::new(mock.clone()))
        .with_migration("002_pet", up_only("create table pet"))
        .with_migration("001_person", up_only("create table person"));

    let result = migrator.migrate_to_latest().await;

    assert!(result.is_ok(), "{:?}", result.error);
    assert_eq!(
        statuses(&result),
        vec![
            ("001_person", MigrationStatus::Success),
            ("002_pet", MigrationStatus::Success),
        ]
    );
    assert!(result.results.iter().all(|r| r.direction == MigrationDirection::Up));

    let statements = mock.statements();
    let begin = statements.iter().position(|s| s == "begin").unwrap();
    assert!(statements[begin + 1].starts_with("select pg_advisory_xact_lock("));
    assert_eq!(
        statements[begin + 2..].to_vec(),
        vec![
            SELECT_EXECUTED.to_string(),
            "create table person".to_string(),
            INSERT_RECORD.to_string(),
            "create table pet".to_string(),
            INSERT_RECORD.to_string(),
            "commit".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_bookkeeping_tables_are_created_first() {
    let mock = Arc::new(MockDriver::new(Dialect::Postgres));
    let migrator = Migrator::new(Quarry::new(mock.clone()));

    let result = migrator.migrate_to_latest().await;
    assert!(result.is_ok());
    assert!(result.results.is_empty());

    let statements = mock.statements();
    assert!(statements[0].starts_with(r#"create table if not exists "quarry_migration" ("#));
    assert!(statements[1].starts_with(r#"create table if not exists "quarry_migration_lock" ("#));
    assert_eq!(
        statements[2],
        r#"select "id" from "quarry_migration_lock" where "id" = $1"#
    );
    assert_eq!(
        statements[3],
        r#"insert into "quarry_migration_lock" ("id", "is_locked") values ($1, $2)"#
    );
}

#[tokio::test]
async fn test_failed_migration_rolls_back_the_batch() {
    let mock = Arc::new(MockDriver::new(Dialect::Postgres));
    mock.fail_on("explode");
    let migrator = Migrator::new(Quarry::new(mock.clone()))
        .with_migration("001_person", up_only("create table person"))
        .with_migration("002_broken", up_only("explode"))
        .with_migration("003_pet", up_only("create table pet"));

    let result = migrator.migrate_to_latest().await;

    assert!(matches!(result.error, Some(QuarryError::Migration(_))));
    assert_eq!(
        statuses(&result),
        vec![
            ("001_person", MigrationStatus::Success),
            ("002_broken", MigrationStatus::Error),
            ("003_pet", MigrationStatus::NotExecuted),
        ]
    );
    let statements = mock.statements();
    assert_eq!(statements.last().map(String::as_str), Some("rollback"));
    assert!(!statements.iter().any(|s| s == "create table pet"));
}

#[tokio::test]
async fn test_migrate_up_and_down_one_step() {
    let executed = row(&[
        ("name", json!("001_person")),
        ("timestamp", json!("2024-01-01T00:00:00+00:00")),
    ]);
    let mock = Arc::new(MockDriver::new(Dialect::Postgres).with_rows(vec![executed]));
    let migrator = Migrator::new(Quarry::new(mock.clone()))
        .with_migration(
            "001_person",
            RawMigration {
                up: "create table person",
                down: Some("drop table person"),
            },
        )
        .with_migration("002_pet", up_only("create table pet"))
        .with_migration("003_toy", up_only("create table toy"));

    let up = migrator.migrate_up().await;
    assert_eq!(statuses(&up), vec![("002_pet", MigrationStatus::Success)]);
    assert!(!mock.statements().iter().any(|s| s == "create table toy"));

    let down = migrator.migrate_down().await;
    assert!(down.is_ok());
    assert_eq!(down.results[0].direction, MigrationDirection::Down);
    assert_eq!(statuses(&down), vec![("001_person", MigrationStatus::Success)]);

    let statements = mock.statements();
    let drop = statements.iter().position(|s| s == "drop table person").unwrap();
    assert_eq!(
        statements[drop + 1],
        r#"delete from "quarry_migration" where "name" = $1"#
    );
}

#[tokio::test]
async fn test_missing_executed_migration_is_reported() {
    let mock = Arc::new(
        MockDriver::new(Dialect::Postgres).with_rows(vec![row(&[("name", json!("000_gone"))])]),
    );
    let migrator = Migrator::new(Quarry::new(mock.clone()))
        .with_migration("001_person", up_only("create table person"));

    let result = migrator.migrate_to_latest().await;

    match result.error {
        Some(QuarryError::Migration(message)) => assert!(message.contains("000_gone")),
        other => panic!("expected a migration error, got {:?}", other),
    }
    assert!(result.results.is_empty());
    assert_eq!(mock.statements().last().map(String::as_str), Some("rollback"));
}

#[tokio::test]
async fn test_mysql_batch_runs_on_a_pinned_connection() {
    let executed = row(&[("name", json!("001_person")), ("acquired", json!(1))]);
    let mock = Arc::new(MockDriver::new(Dialect::MySql).with_rows(vec![executed]));
    let migrator = Migrator::new(Quarry::new(mock.clone()))
        .with_migration("001_person", up_only("create table person"))
        .with_migration("002_pet", up_only("create table pet"));

    let before = mock.acquire_count();
    let result = migrator.migrate_to_latest().await;

    assert!(result.is_ok(), "{:?}", result.error);
    assert_eq!(statuses(&result), vec![("002_pet", MigrationStatus::Success)]);

    let statements = mock.statements();
    assert!(!statements.iter().any(|s| s == "begin" || s == "commit"));
    assert!(statements.iter().any(|s| s.starts_with("select get_lock(")));
    assert_eq!(
        statements.last().map(String::as_str),
        Some("select release_lock('quarry_migration_lock')")
    );
    // bookkeeping setup uses the pool, the batch a single connection
    assert!(mock.acquire_count() > before);
    assert_eq!(mock.acquire_count(), mock.release_count());
}

#[tokio::test]
async fn test_get_migrations_reports_execution_time() {
    let executed = row(&[
        ("name", json!("001_person")),
        ("timestamp", json!("2024-01-01T00:00:00+00:00")),
    ]);
    let mock = Arc::new(MockDriver::new(Dialect::Sqlite).with_rows(vec![executed]));
    let migrator = Migrator::new(Quarry::new(mock))
        .with_migration("001_person", up_only("create table person"))
        .with_migration("002_pet", up_only("create table pet"));

    assert_eq!(
        migrator.get_migrations().await.unwrap(),
        vec![
            MigrationInfo {
                name: "001_person".to_string(),
                executed_at: Some("2024-01-01T00:00:00+00:00".to_string()),
            },
            MigrationInfo {
                name: "002_pet".to_string(),
                executed_at: None,
            },
        ]
    );
}

#[test]
fn test_plan_to_named_migration() {
    let owned = ["001".to_string(), "002".to_string(), "003".to_string()];
    let names: Vec<&String> = owned.iter().collect();

    assert_eq!(
        plan(&names, 1, &Target::Named("003".to_string())).unwrap(),
        Plan {
            direction: MigrationDirection::Up,
            names: vec!["002".to_string(), "003".to_string()],
        }
    );
    assert_eq!(
        plan(&names, 3, &Target::Named("001".to_string())).unwrap(),
        Plan {
            direction: MigrationDirection::Down,
            names: vec!["003".to_string(), "002".to_string()],
        }
    );
    assert_eq!(plan(&names, 2, &Target::Named("002".to_string())).unwrap().names.len(), 0);
    assert!(plan(&names, 0, &Target::Named("999".to_string())).is_err());
    assert_eq!(plan(&names, 0, &Target::Down).unwrap().names.len(), 0);
    assert_eq!(plan(&names, 3, &Target::Up).unwrap().names.len(), 0);
}

#[test]
fn test_history_must_be_a_prefix() {
    let owned = ["001".to_string(), "002".to_string()];
    let names: Vec<&String> = owned.iter().collect();

    assert!(validate_history(&names, &["001".to_string()]).is_ok());
    assert!(validate_history(&names, &["002".to_string()]).is_err());
    assert!(validate_history(&names, &["000".to_string()]).is_err());
}
