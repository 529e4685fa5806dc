use pretty_assertions::assert_eq;

use super::{pg, pg_sql};
use crate::builder::{JoinInterface, ReturningInterface, WhereInterface};
use crate::expression::{raw, reference, val};

#[test]
fn test_explain_prefix() {
    let query = pg().select_from("person").unwrap().select_all().explain();
    assert_eq!(pg_sql(&query), r#"explain select * from "person""#);

    let query = pg()
        .select_from("person")
        .unwrap()
        .select_all()
        .explain_with(raw("(format json)"));
    assert_eq!(
        pg_sql(&query),
        r#"explain (format json) select * from "person""#
    );
}

#[test]
fn test_distinct_on_and_offset() {
    let query = pg()
        .select_from("person")
        .unwrap()
        .distinct_on(["last_name"])
        .unwrap()
        .select(["last_name", "first_name"])
        .unwrap()
        .order_by("last_name")
        .unwrap()
        .limit(10)
        .unwrap()
        .offset(20)
        .unwrap();

    assert_eq!(
        pg_sql(&query),
        concat!(
            r#"select distinct on ("last_name") "last_name", "first_name" from "person" "#,
            r#"order by "last_name" limit $1 offset $2"#,
        )
    );
}

#[test]
fn test_recursive_cte() {
    let db = pg();
    let root = db
        .select_from("node")
        .unwrap()
        .select(["id", "parent_id"])
        .unwrap()
        .where_("parent_id", "is", None::<i32>)
        .unwrap();
    let tree = db
        .with_recursive("tree(id, parent_id)", &root)
        .unwrap()
        .select_from("tree")
        .unwrap()
        .select_all();

    assert_eq!(
        pg_sql(&tree),
        concat!(
            r#"with recursive "tree"("id", "parent_id") as "#,
            r#"(select "id", "parent_id" from "node" where "parent_id" is null) "#,
            r#"select * from "tree""#,
        )
    );
}

#[test]
fn test_lateral_join() {
    let db = pg();
    let latest = db
        .select_from("pet")
        .unwrap()
        .select(["name"])
        .unwrap()
        .where_ref("pet.owner_id", "=", "person.id")
        .unwrap()
        .limit(1)
        .unwrap()
        .as_("latest");
    let query = db
        .select_from("person")
        .unwrap()
        .inner_join_lateral_with(latest, |join| Ok(join.on_true()))
        .unwrap()
        .select(["person.first_name", "latest.name"])
        .unwrap();

    assert_eq!(
        pg_sql(&query),
        concat!(
            r#"select "person"."first_name", "latest"."name" from "person" "#,
            r#"inner join lateral (select "name" from "pet" where "pet"."owner_id" = "person"."id" limit $1) as "latest" on true"#,
        )
    );
}

#[test]
fn test_cross_join() {
    let query = pg()
        .select_from("person")
        .unwrap()
        .cross_join("pet")
        .unwrap()
        .select_all();
    assert_eq!(
        pg_sql(&query),
        r#"select * from "person" cross join "pet""#
    );
}

#[test]
fn test_insert_default_values_returning() {
    let query = pg()
        .insert_into("person")
        .unwrap()
        .default_values()
        .returning(["id"])
        .unwrap();
    assert_eq!(
        pg_sql(&query),
        r#"insert into "person" default values returning "id""#
    );
}

#[test]
fn test_on_duplicate_key_update() {
    let query = pg()
        .insert_into("pet")
        .unwrap()
        .values(vec![vec![("name", val("Catto"))]])
        .unwrap()
        .on_duplicate_key_update(vec![("name", val("Doggo"))])
        .unwrap();
    assert_eq!(
        super::sql_for(&query, crate::transpiler::Dialect::MySql),
        "insert into `pet` (`name`) values (?) on duplicate key update `name` = ?"
    );
}

#[test]
fn test_delete_using_join() {
    let query = pg()
        .delete_from("pet")
        .unwrap()
        .using(["person"])
        .unwrap()
        .where_ref("pet.owner_id", "=", "person.id")
        .unwrap()
        .where_("person.first_name", "=", "Jennifer")
        .unwrap();

    assert_eq!(
        pg_sql(&query),
        concat!(
            r#"delete from "pet" using "person" "#,
            r#"where "pet"."owner_id" = "person"."id" and "person"."first_name" = $1"#,
        )
    );
}

#[test]
fn test_update_returning_expression() {
    let query = pg()
        .update_table("person")
        .unwrap()
        .set("age", reference("age").unwrap())
        .unwrap()
        .returning(["id", "age as new_age"])
        .unwrap();

    assert_eq!(
        pg_sql(&query),
        r#"update "person" set "age" = "age" returning "id", "age" as "new_age""#
    );
}
