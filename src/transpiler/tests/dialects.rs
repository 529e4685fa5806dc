use pretty_assertions::assert_eq;

use super::{pg, sql_for};
use crate::ast::Value;
use crate::builder::{ReturningInterface, SelectQueryBuilder, ToOperationNode, WhereInterface};
use crate::error::QuarryError;
use crate::expression::{lit, val};
use crate::transpiler::{Dialect, compile};

fn by_id() -> SelectQueryBuilder {
    pg().select_from("person")
        .unwrap()
        .select(["first_name"])
        .unwrap()
        .where_("id", "=", 1)
        .unwrap()
}

#[test]
fn test_placeholders_and_quoting() {
    let query = by_id();
    let expected = [
        (Dialect::Postgres, r#"select "first_name" from "person" where "id" = $1"#),
        (Dialect::MySql, "select `first_name` from `person` where `id` = ?"),
        (Dialect::Sqlite, r#"select "first_name" from "person" where "id" = ?"#),
        (Dialect::MsSql, "select [first_name] from [person] where [id] = @1"),
        (Dialect::Oracle, r#"select "first_name" from "person" where "id" = :1"#),
    ];
    for (dialect, sql) in expected {
        assert_eq!(sql_for(&query, dialect), sql, "{}", dialect.name());
    }
}

#[test]
fn test_quote_character_is_escaped_per_dialect() {
    let query = pg().select_from("a`b]c").unwrap().select_all();
    assert_eq!(sql_for(&query, Dialect::MySql), "select * from `a``b]c`");
    assert_eq!(sql_for(&query, Dialect::MsSql), "select * from [a`b]]c]");
}

#[test]
fn test_oracle_limit_becomes_fetch() {
    let query = pg()
        .select_from("person")
        .unwrap()
        .select_all()
        .order_by("id")
        .unwrap()
        .limit(10)
        .unwrap()
        .offset(20)
        .unwrap();

    let compiled = compile(&query.to_operation_node(), Dialect::Oracle).unwrap();
    assert_eq!(
        compiled.sql,
        r#"select * from "person" order by "id" offset :1 rows fetch next :2 rows only"#
    );
    assert_eq!(compiled.parameters, vec![Value::from(20), Value::from(10)]);
}

#[test]
fn test_mssql_offset_needs_order_by() {
    let query = pg()
        .select_from("person")
        .unwrap()
        .select_all()
        .limit(10)
        .unwrap()
        .offset(20)
        .unwrap();

    assert_eq!(
        sql_for(&query, Dialect::MsSql),
        "select * from [person] order by (select null) offset @1 rows fetch next @2 rows only"
    );
}

#[test]
fn test_mssql_boolean_comparisons_use_bits() {
    let query = pg()
        .select_from("person")
        .unwrap()
        .select_all()
        .where_("active", "=", true)
        .unwrap()
        .where_("deleted", "!=", false)
        .unwrap();

    assert_eq!(
        sql_for(&query, Dialect::MsSql),
        "select * from [person] where [active] = 1 and [deleted] <> 0"
    );
    assert_eq!(
        sql_for(&query, Dialect::Postgres),
        r#"select * from "person" where "active" is true and "deleted" is not false"#
    );
}

#[test]
fn test_mssql_rewrite_leaves_tree_untouched() {
    let query = pg()
        .select_from("person")
        .unwrap()
        .select_all()
        .limit(5)
        .unwrap();
    let node = query.to_operation_node();

    compile(&node, Dialect::MsSql).unwrap();
    assert_eq!(
        compile(&node, Dialect::Postgres).unwrap().sql,
        r#"select * from "person" limit $1"#
    );
}

#[test]
fn test_returning_is_rejected_without_support() {
    let query = pg()
        .insert_into("person")
        .unwrap()
        .values(vec![vec![("first_name", val("Jennifer"))]])
        .unwrap()
        .returning(["id"])
        .unwrap();

    for dialect in [Dialect::MySql, Dialect::MsSql, Dialect::Oracle] {
        let err = compile(&query.to_operation_node(), dialect).unwrap_err();
        assert!(
            matches!(err, QuarryError::Unsupported { feature: "returning", .. }),
            "{}",
            dialect.name()
        );
    }
    assert!(compile(&query.to_operation_node(), Dialect::Sqlite).is_ok());
}

#[test]
fn test_insert_ignore_is_rejected_without_support() {
    let query = pg()
        .insert_into("person")
        .unwrap()
        .values(vec![vec![("first_name", val("Jennifer"))]])
        .unwrap()
        .ignore();

    let err = compile(&query.to_operation_node(), Dialect::MsSql).unwrap_err();
    assert!(matches!(
        err,
        QuarryError::Unsupported {
            feature: "insert ignore",
            ..
        }
    ));
}

#[test]
fn test_paginated_select_in_every_dialect() {
    let query = pg()
        .select_from("person")
        .unwrap()
        .select_all()
        .where_("age", ">", 18)
        .unwrap()
        .order_by("first_name asc")
        .unwrap()
        .limit(10)
        .unwrap();

    let expected = [
        (
            Dialect::Postgres,
            r#"select * from "person" where "age" > $1 order by "first_name" asc limit $2"#,
            vec![Value::from(18), Value::from(10)],
        ),
        (
            Dialect::MySql,
            "select * from `person` where `age` > ? order by `first_name` asc limit ?",
            vec![Value::from(18), Value::from(10)],
        ),
        (
            Dialect::Sqlite,
            r#"select * from "person" where "age" > ? order by "first_name" asc limit ?"#,
            vec![Value::from(18), Value::from(10)],
        ),
        (
            Dialect::MsSql,
            "select top(@1) * from [person] where [age] > @2 order by [first_name] asc",
            vec![Value::from(10), Value::from(18)],
        ),
        (
            Dialect::Oracle,
            r#"select * from "person" where "age" > :1 order by "first_name" asc fetch next :2 rows only"#,
            vec![Value::from(18), Value::from(10)],
        ),
    ];
    for (dialect, sql, parameters) in expected {
        let compiled = compile(&query.to_operation_node(), dialect).unwrap();
        assert_eq!(compiled.sql, sql, "{}", dialect.name());
        assert_eq!(compiled.parameters, parameters, "{}", dialect.name());
    }
}

#[test]
fn test_mysql_escapes_backslashes_in_literals() {
    let query = pg()
        .select_from("file")
        .unwrap()
        .select_all()
        .where_("path", "=", lit("C:\\dir\\"))
        .unwrap()
        .where_("owner", "=", lit("it's"))
        .unwrap();

    assert_eq!(
        sql_for(&query, Dialect::MySql),
        r"select * from `file` where `path` = 'C:\\dir\\' and `owner` = 'it''s'"
    );
    assert_eq!(
        sql_for(&query, Dialect::Postgres),
        r#"select * from "file" where "path" = 'C:\dir\' and "owner" = 'it''s'"#
    );

    let table = pg()
        .schema()
        .create_table("file")
        .unwrap()
        .add_column_with("path", "varchar(255)", |col| col.default_to("C:\\tmp\\"))
        .unwrap();
    assert_eq!(
        sql_for(&table, Dialect::MySql),
        r"create table `file` (`path` varchar(255) default 'C:\\tmp\\')"
    );
}

#[test]
fn test_mssql_top_with_modifier() {
    let query = pg()
        .select_from("person")
        .unwrap()
        .select_all()
        .top(5, Some("percent"))
        .unwrap();

    assert_eq!(sql_for(&query, Dialect::MsSql), "select top(5) percent * from [person]");
    assert!(query.top(5, Some("half")).is_err());
}
