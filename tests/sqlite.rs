//! End-to-end tests against an embedded SQLite file database.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde::Deserialize;

use quarry::driver::{Row, SqlxDriver};
use quarry::expression::{count_all, raw, val};
use quarry::migrate::{Migration, MigrationStatus, Migrator};
use quarry::prelude::*;

struct TestDb {
    db: Quarry,
    path: PathBuf,
}

impl TestDb {
    async fn new() -> Self {
        let path = std::env::temp_dir().join(format!("quarry-{}.db", uuid::Uuid::new_v4()));
        let url = format!("sqlite://{}?mode=rwc", path.display());
        let db = Quarry::new(Arc::new(SqlxDriver::new(url).unwrap()));

        db.schema()
            .create_table("person")
            .unwrap()
            .add_column_with("id", "integer", |col| Ok(col.primary_key()))
            .unwrap()
            .add_column_with("first_name", "text", |col| Ok(col.not_null()))
            .unwrap()
            .add_column("age", "integer")
            .unwrap()
            .execute()
            .await
            .unwrap();

        Self { db, path }
    }

    async fn insert(&self, people: &[(&str, i64)]) {
        let rows = people
            .iter()
            .map(|(name, age)| vec![("first_name", val(*name)), ("age", val(*age))])
            .collect();
        self.db
            .insert_into("person")
            .unwrap()
            .values(rows)
            .unwrap()
            .execute()
            .await
            .unwrap();
    }

    async fn names(&self) -> Vec<String> {
        names(
            &self
                .db
                .select_from("person")
                .unwrap()
                .select(["first_name"])
                .unwrap()
                .order_by("first_name")
                .unwrap()
                .execute()
                .await
                .unwrap(),
        )
    }

    async fn close(self) {
        self.db.destroy().await.unwrap();
        let _ = std::fs::remove_file(&self.path);
    }
}

fn names(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.get("first_name")?.as_str().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn test_select_with_parameters() {
    let t = TestDb::new().await;
    t.insert(&[("Jennifer", 40), ("Arnold", 12), ("Sylvester", 70)])
        .await;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Person {
        first_name: String,
    }

    let adults: Vec<Person> = t
        .db
        .select_from("person")
        .unwrap()
        .select(["first_name"])
        .unwrap()
        .where_("age", ">", 18)
        .unwrap()
        .order_by("first_name desc")
        .unwrap()
        .limit(10)
        .unwrap()
        .execute_as()
        .await
        .unwrap();

    assert_eq!(
        adults,
        vec![
            Person {
                first_name: "Sylvester".to_string()
            },
            Person {
                first_name: "Jennifer".to_string()
            },
        ]
    );
    t.close().await;
}

#[tokio::test]
async fn test_computed_columns_keep_their_values() {
    let t = TestDb::new().await;
    t.insert(&[("Jennifer", 40), ("Arnold", 12)]).await;

    let counted = t
        .db
        .select_from("person")
        .unwrap()
        .select([count_all().as_("n")])
        .unwrap()
        .where_("age", ">", 18)
        .unwrap()
        .execute()
        .await
        .unwrap();
    assert_eq!(counted[0].get("n"), Some(&serde_json::json!(1)));

    let computed = t
        .db
        .execute_raw(&raw("select 1.5 * 2 as f, 'x' || 'y' as s, 42 as i"))
        .await
        .unwrap();
    let row = &computed.rows[0];
    assert_eq!(row.get("f"), Some(&serde_json::json!(3.0)));
    assert_eq!(row.get("s"), Some(&serde_json::json!("xy")));
    assert_eq!(row.get("i"), Some(&serde_json::json!(42)));
    t.close().await;
}

#[tokio::test]
async fn test_update_and_delete_report_counts() {
    let t = TestDb::new().await;
    t.insert(&[("Jennifer", 40), ("Arnold", 12)]).await;

    let updated = t
        .db
        .update_table("person")
        .unwrap()
        .set("first_name", "Jen")
        .unwrap()
        .where_("age", "=", 40)
        .unwrap()
        .execute()
        .await
        .unwrap();
    assert_eq!(updated.num_updated_rows, 1);

    let deleted = t
        .db
        .delete_from("person")
        .unwrap()
        .where_("first_name", "=", "Arnold")
        .unwrap()
        .execute()
        .await
        .unwrap();
    assert_eq!(deleted.num_deleted_rows, 1);

    assert_eq!(t.names().await, vec!["Jen".to_string()]);
    t.close().await;
}

#[tokio::test]
async fn test_insert_returning() {
    let t = TestDb::new().await;
    let inserted = t
        .db
        .insert_into("person")
        .unwrap()
        .values(vec![vec![("first_name", val("Jennifer")), ("age", val(40))]])
        .unwrap()
        .returning(["first_name"])
        .unwrap()
        .execute()
        .await
        .unwrap();

    assert_eq!(names(&inserted.rows), vec!["Jennifer".to_string()]);
    t.close().await;
}

#[tokio::test]
async fn test_failed_transaction_rolls_back() {
    let t = TestDb::new().await;

    let result = t
        .db
        .transaction()
        .execute(|trx| async move {
            trx.insert_into("person")?
                .values(vec![vec![("first_name", val("Jennifer")), ("age", val(40))]])?
                .execute()
                .await?;
            Err::<(), _>(QuarryError::Validation("abort".to_string()))
        })
        .await;

    assert!(matches!(result, Err(QuarryError::Validation(_))));
    assert!(t.names().await.is_empty());
    t.close().await;
}

#[tokio::test]
async fn test_committed_transaction_is_visible() {
    let t = TestDb::new().await;

    t.db.transaction()
        .execute(|trx| async move {
            trx.insert_into("person")?
                .values(vec![vec![("first_name", val("Jennifer")), ("age", val(40))]])?
                .execute()
                .await?;
            Ok::<_, QuarryError>(())
        })
        .await
        .unwrap();

    assert_eq!(t.names().await, vec!["Jennifer".to_string()]);
    t.close().await;
}

#[tokio::test]
async fn test_savepoint_rollback() {
    let t = TestDb::new().await;

    let trx = t.db.start_transaction().execute().await.unwrap();
    trx.insert_into("person")
        .unwrap()
        .values(vec![vec![("first_name", val("Jennifer")), ("age", val(40))]])
        .unwrap()
        .execute()
        .await
        .unwrap();
    trx.savepoint("second").await.unwrap();
    trx.insert_into("person")
        .unwrap()
        .values(vec![vec![("first_name", val("Arnold")), ("age", val(12))]])
        .unwrap()
        .execute()
        .await
        .unwrap();
    trx.rollback_to_savepoint("second").await.unwrap();
    trx.commit().await.unwrap();

    assert_eq!(t.names().await, vec!["Jennifer".to_string()]);
    t.close().await;
}

#[tokio::test]
async fn test_stream_rows_in_chunks() {
    let t = TestDb::new().await;
    t.insert(&[("A", 1), ("B", 2), ("C", 3), ("D", 4), ("E", 5)])
        .await;

    let query = t
        .db
        .select_from("person")
        .unwrap()
        .select(["first_name"])
        .unwrap()
        .order_by("first_name")
        .unwrap();

    let rows: Vec<Row> = query
        .stream(2)
        .unwrap()
        .map(|row| row.unwrap())
        .collect()
        .await;
    assert_eq!(names(&rows), vec!["A", "B", "C", "D", "E"]);

    let first: Vec<Row> = query
        .stream(2)
        .unwrap()
        .take(1)
        .map(|row| row.unwrap())
        .collect()
        .await;
    assert_eq!(names(&first), vec!["A"]);

    assert_eq!(t.names().await.len(), 5);
    t.close().await;
}

struct CreatePet;

#[async_trait]
impl Migration for CreatePet {
    async fn up(&self, db: &QueryCreator) -> QuarryResult<()> {
        db.schema()
            .create_table("pet")?
            .add_column_with("id", "integer", |col| Ok(col.primary_key()))?
            .add_column_with("name", "text", |col| Ok(col.not_null()))?
            .execute()
            .await
    }

    async fn down(&self, db: &QueryCreator) -> QuarryResult<()> {
        db.schema().drop_table("pet")?.execute().await
    }
}

#[tokio::test]
async fn test_migrator_round_trip() {
    let t = TestDb::new().await;
    let migrator = Migrator::new(t.db.clone()).with_migration("001_pet", CreatePet);

    let up = migrator.migrate_to_latest().await;
    assert!(up.is_ok(), "{:?}", up.error);
    assert_eq!(up.results[0].status, MigrationStatus::Success);

    let info = migrator.get_migrations().await.unwrap();
    assert!(info[0].executed_at.is_some());
    t.db.select_from("pet").unwrap().select_all().execute().await.unwrap();

    let again = migrator.migrate_to_latest().await;
    assert!(again.is_ok());
    assert!(again.results.is_empty());

    let down = migrator.migrate_down().await;
    assert!(down.is_ok(), "{:?}", down.error);
    assert!(t.db.select_from("pet").unwrap().select_all().execute().await.is_err());
    t.close().await;
}
