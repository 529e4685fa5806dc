use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use super::*;
use crate::driver::IsolationLevel;
use crate::driver::mock::MockDriver;
use crate::expression::{raw, val};

fn mock() -> Arc<MockDriver> {
    Arc::new(MockDriver::new(Dialect::Postgres))
}

#[tokio::test]
async fn test_pooled_statements_acquire_and_release() {
    let mock = mock();
    let db = Quarry::new(mock.clone());

    db.select_from("person").unwrap().execute().await.unwrap();
    db.execute_raw(&raw("select 1")).await.unwrap();

    assert_eq!(mock.init_count(), 1);
    assert_eq!(mock.acquire_count(), 2);
    assert_eq!(mock.release_count(), 2);
}

#[tokio::test]
async fn test_terminal_methods_run_through_the_executor() {
    let mock = mock();
    let db = Quarry::new(mock.clone());

    db.schema().drop_table("pet").unwrap().execute().await.unwrap();
    db.update_table("person")
        .unwrap()
        .set("age", 1)
        .unwrap()
        .execute()
        .await
        .unwrap();
    let missing = db
        .select_from("person")
        .unwrap()
        .select_all()
        .execute_take_first_or_throw()
        .await;

    assert!(matches!(missing, Err(QuarryError::NoResult(_))));
    assert_eq!(
        mock.statements(),
        vec![
            r#"drop table "pet""#.to_string(),
            r#"update "person" set "age" = $1"#.to_string(),
            r#"select * from "person""#.to_string(),
        ]
    );
}

#[tokio::test]
async fn test_transaction_commits() {
    let mock = mock();
    let db = Quarry::new(mock.clone());

    let inserted = db
        .transaction()
        .execute(|trx| async move {
            assert!(trx.is_transaction());
            let result = trx
                .insert_into("person")?
                .values(vec![vec![("first_name", val("Jennifer"))]])?
                .execute()
                .await?;
            Ok::<_, QuarryError>(result.num_inserted_or_updated_rows)
        })
        .await
        .unwrap();

    assert_eq!(inserted, Some(0));
    assert_eq!(
        mock.statements(),
        vec![
            "begin".to_string(),
            r#"insert into "person" ("first_name") values ($1)"#.to_string(),
            "commit".to_string(),
        ]
    );
    assert_eq!(mock.acquire_count(), 1);
    assert_eq!(mock.release_count(), 1);
}

#[tokio::test]
async fn test_transaction_rolls_back_on_error() {
    let mock = mock();
    let db = Quarry::new(mock.clone());

    let result: QuarryResult<()> = db
        .transaction()
        .execute(|trx| async move {
            trx.delete_from("person")?.execute().await?;
            Err::<(), _>(QuarryError::Validation("boom".to_string()))
        })
        .await;

    assert!(matches!(result, Err(QuarryError::Validation(_))));
    assert_eq!(
        mock.statements(),
        vec![
            "begin".to_string(),
            r#"delete from "person""#.to_string(),
            "rollback".to_string(),
        ]
    );
    assert_eq!(mock.release_count(), 1);
}

#[tokio::test]
async fn test_failed_commit_rolls_back() {
    let mock = mock();
    mock.fail_on("commit");
    let db = Quarry::new(mock.clone());

    let result = db
        .transaction()
        .execute(|_trx| async move { Ok::<_, QuarryError>(()) })
        .await;

    assert!(matches!(result, Err(QuarryError::Connection(_))));
    assert_eq!(
        mock.statements(),
        vec!["begin".to_string(), "commit".to_string(), "rollback".to_string()]
    );
}

#[tokio::test]
async fn test_failed_rollback_keeps_original_error() {
    let mock = mock();
    mock.fail_on("rollback");
    let db = Quarry::new(mock.clone());

    let result: QuarryResult<()> = db
        .transaction()
        .execute(|_trx| async move { Err::<(), _>(QuarryError::Validation("boom".to_string())) })
        .await;

    match result {
        Err(QuarryError::Rollback { source, .. }) => {
            assert!(matches!(*source, QuarryError::Validation(_)));
        }
        other => panic!("expected a rollback error, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn test_transaction_settings() {
    let mock = mock();
    let db = Quarry::new(mock.clone());

    db.transaction()
        .isolation_level(IsolationLevel::Serializable)
        .execute(|_trx| async move { Ok::<_, QuarryError>(()) })
        .await
        .unwrap();

    assert_eq!(
        mock.statements(),
        vec![
            "start transaction isolation level serializable".to_string(),
            "commit".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_nested_transaction_is_rejected() {
    let mock = mock();
    let db = Quarry::new(mock.clone());

    let result = db
        .transaction()
        .execute(|trx| async move {
            trx.transaction()
                .execute(|_inner| async move { Ok::<_, QuarryError>(()) })
                .await
        })
        .await;

    assert!(matches!(result, Err(QuarryError::Transaction(_))));
    assert_eq!(
        mock.statements(),
        vec!["begin".to_string(), "rollback".to_string()]
    );
}

#[tokio::test]
async fn test_controlled_transaction_with_savepoints() {
    let mock = mock();
    let db = Quarry::new(mock.clone());

    let trx = db.start_transaction().execute().await.unwrap();
    trx.savepoint("before_pets").await.unwrap();
    trx.delete_from("pet").unwrap().execute().await.unwrap();
    trx.rollback_to_savepoint("before_pets").await.unwrap();
    trx.release_savepoint("before_pets").await.unwrap();
    trx.commit().await.unwrap();

    assert!(trx.is_finished());
    assert_eq!(
        mock.statements(),
        vec![
            "begin".to_string(),
            r#"savepoint "before_pets""#.to_string(),
            r#"delete from "pet""#.to_string(),
            r#"rollback to savepoint "before_pets""#.to_string(),
            r#"release savepoint "before_pets""#.to_string(),
            "commit".to_string(),
        ]
    );
    assert_eq!(mock.release_count(), 1);
}

#[tokio::test]
async fn test_controlled_transaction_finishes_once() {
    let mock = mock();
    let db = Quarry::new(mock.clone());

    let trx = db.start_transaction().execute().await.unwrap();
    trx.rollback().await.unwrap();

    assert!(matches!(trx.commit().await, Err(QuarryError::Transaction(_))));
    assert!(matches!(
        trx.select_from("person").unwrap().execute().await,
        Err(QuarryError::Transaction(_))
    ));
    assert_eq!(
        mock.statements(),
        vec!["begin".to_string(), "rollback".to_string()]
    );
}

#[tokio::test]
async fn test_dropped_controlled_transaction_rolls_back() {
    let mock = mock();
    let db = Quarry::new(mock.clone());

    let trx = db.start_transaction().execute().await.unwrap();
    drop(trx);
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(
        mock.statements(),
        vec!["begin".to_string(), "rollback".to_string()]
    );
    assert_eq!(mock.release_count(), 1);
}

#[tokio::test]
async fn test_connection_pins_one_connection() {
    let mock = mock();
    let db = Quarry::new(mock.clone());

    let count = db
        .connection()
        .execute(|conn| async move {
            conn.select_from("person")?.execute().await?;
            conn.select_from("pet")?.execute().await?;
            Ok::<_, QuarryError>(2)
        })
        .await
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(mock.acquire_count(), 1);
    assert_eq!(mock.release_count(), 1);
}

#[tokio::test]
async fn test_offline_instance_rejects_transactions() {
    let db = Quarry::offline(Dialect::Postgres);
    let result = db
        .transaction()
        .execute(|_trx| async move { Ok::<_, QuarryError>(()) })
        .await;
    assert!(matches!(result, Err(QuarryError::Connection(_))));
}

#[tokio::test]
async fn test_destroy_closes_driver() {
    let mock = mock();
    let db = Quarry::new(mock.clone());
    db.select_from("person").unwrap().execute().await.unwrap();
    db.destroy().await.unwrap();
    assert_eq!(mock.destroy_count(), 1);
}

#[test]
fn test_with_plugin_leaves_original_untouched() {
    let db = Quarry::offline(Dialect::Postgres);
    let scoped = db.with_schema("app");

    assert_eq!(
        db.select_from("person").unwrap().compile().unwrap().sql,
        r#"select from "person""#
    );
    assert_eq!(
        scoped.select_from("person").unwrap().compile().unwrap().sql,
        r#"select from "app"."person""#
    );
}
