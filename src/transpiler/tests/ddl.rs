use pretty_assertions::assert_eq;

use super::{pg, pg_sql, sql_for};
use crate::engine::Quarry;
use crate::expression::{cmp, func, raw, reference};
use crate::transpiler::Dialect;

#[test]
fn test_identity_keyword_per_dialect() {
    let table = pg()
        .schema()
        .create_table("person")
        .unwrap()
        .add_column_with("id", "integer", |col| Ok(col.primary_key().auto_increment()))
        .unwrap();

    assert_eq!(
        pg_sql(&table),
        r#"create table "person" ("id" integer primary key generated by default as identity)"#
    );
    assert_eq!(
        sql_for(&table, Dialect::MsSql),
        "create table [person] ([id] integer primary key identity)"
    );
}

#[test]
fn test_table_constraints() {
    let table = pg()
        .schema()
        .create_table("membership")
        .unwrap()
        .add_column("person_id", "integer")
        .unwrap()
        .add_column("club_id", "integer")
        .unwrap()
        .add_column("fee", "numeric(10, 2)")
        .unwrap()
        .add_primary_key_constraint("membership_pk", ["person_id", "club_id"])
        .unwrap()
        .add_check_constraint("fee_positive", cmp("fee", ">", raw("0")).unwrap())
        .unwrap()
        .add_foreign_key_constraint_with(
            "membership_person_fk",
            ["person_id"],
            "person",
            ["id"],
            |fk| fk.on_delete("cascade"),
        )
        .unwrap();

    assert_eq!(
        pg_sql(&table),
        concat!(
            r#"create table "membership" ("person_id" integer, "club_id" integer, "fee" numeric(10, 2), "#,
            r#"constraint "membership_pk" primary key ("person_id", "club_id"), "#,
            r#"constraint "fee_positive" check ("fee" > 0), "#,
            r#"constraint "membership_person_fk" foreign key ("person_id") references "person" ("id") on delete cascade)"#,
        )
    );
}

#[test]
fn test_temporary_table_on_commit() {
    let table = pg()
        .schema()
        .create_table("scratch")
        .unwrap()
        .temporary()
        .add_column("id", "integer")
        .unwrap()
        .on_commit("drop")
        .unwrap();

    assert_eq!(
        pg_sql(&table),
        r#"create temporary table "scratch" ("id" integer) on commit drop"#
    );
}

#[test]
fn test_generated_column() {
    let table = pg()
        .schema()
        .create_table("person")
        .unwrap()
        .add_column_with("full_name", "text", |col| {
            Ok(col
                .generated_always_as(raw("first_name || ' ' || last_name"))
                .stored())
        })
        .unwrap();

    assert_eq!(
        pg_sql(&table),
        r#"create table "person" ("full_name" text generated always as (first_name || ' ' || last_name) stored)"#
    );
}

#[test]
fn test_alter_table_variants() {
    let schema = pg().schema();

    let query = schema
        .alter_table("person")
        .unwrap()
        .drop_column("nickname")
        .unwrap()
        .rename_column("first_name", "given_name")
        .unwrap();
    assert_eq!(
        pg_sql(&query),
        r#"alter table "person" drop column "nickname", rename column "first_name" to "given_name""#
    );

    let query = schema
        .alter_table("person")
        .unwrap()
        .alter_column("age", |col| col.set_default(0))
        .unwrap();
    assert_eq!(
        pg_sql(&query),
        r#"alter table "person" alter column "age" set default 0"#
    );

    let query = schema
        .alter_table("person")
        .unwrap()
        .drop_constraint_if_exists("person_age_check")
        .unwrap()
        .cascade();
    assert_eq!(
        pg_sql(&query),
        r#"alter table "person" drop constraint if exists "person_age_check" cascade"#
    );

    let query = schema
        .alter_table("person")
        .unwrap()
        .add_unique_constraint("person_email_uq", ["email"])
        .unwrap();
    assert_eq!(
        pg_sql(&query),
        r#"alter table "person" add constraint "person_email_uq" unique ("email")"#
    );
}

#[test]
fn test_expression_index_using_method() {
    let index = pg()
        .schema()
        .create_index("person_lower_name_idx")
        .unwrap()
        .if_not_exists()
        .on("person")
        .unwrap()
        .using("BTREE")
        .unwrap()
        .expression(func("lower", vec![reference("first_name").unwrap()]));

    assert_eq!(
        pg_sql(&index),
        r#"create index if not exists "person_lower_name_idx" on "person" using btree ((lower("first_name")))"#
    );
    assert!(pg().schema().create_index("x").unwrap().using("gin; drop").is_err());
}

#[test]
fn test_mysql_drop_index_on_table() {
    let db = Quarry::offline(Dialect::MySql);
    let drop = db
        .schema()
        .drop_index("person_name_idx")
        .unwrap()
        .on("person")
        .unwrap();
    assert_eq!(
        sql_for(&drop, Dialect::MySql),
        "drop index `person_name_idx` on `person`"
    );
}

#[test]
fn test_schema_and_view_statements() {
    let schema = pg().schema();

    assert_eq!(
        pg_sql(&schema.create_schema("app").unwrap().if_not_exists()),
        r#"create schema if not exists "app""#
    );
    assert_eq!(
        pg_sql(&schema.drop_schema("app").unwrap().cascade()),
        r#"drop schema "app" cascade"#
    );

    let active = pg()
        .select_from("person")
        .unwrap()
        .select(["id"])
        .unwrap();
    let view = schema
        .create_view("app.active_person")
        .unwrap()
        .materialized()
        .columns(["person_id"])
        .unwrap()
        .as_(&active)
        .unwrap();
    assert_eq!(
        pg_sql(&view),
        r#"create materialized view "app"."active_person" ("person_id") as select "id" from "person""#
    );
}
