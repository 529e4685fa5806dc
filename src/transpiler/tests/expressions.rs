use pretty_assertions::assert_eq;

use super::{pg, pg_sql};
use crate::ast::Value;
use crate::builder::{ToOperationNode, WhereInterface};
use crate::expression::{
    and, between, case, cast, cmp, cmp_ref, count_all, exists, func, lit, neg, not, or,
    raw_with, reference, sum, val,
};
use crate::transpiler::{Dialect, compile};

fn select_expr(expr: crate::expression::Expr) -> String {
    pg_sql(&pg().select_no_from().select([expr]).unwrap())
}

#[test]
fn test_literals_are_escaped() {
    assert_eq!(select_expr(lit("it's")), "select 'it''s'");
    assert_eq!(select_expr(lit(42)), "select 42");
    assert_eq!(select_expr(lit(Value::Null)), "select null");
}

#[test]
fn test_identifiers_double_embedded_quotes() {
    let query = pg().select_from("we\"ird").unwrap().select_all();
    assert_eq!(pg_sql(&query), r#"select * from "we""ird""#);
}

#[test]
fn test_parameters_follow_render_order() {
    let query = pg()
        .select_from("person")
        .unwrap()
        .select([raw_with("coalesce(nickname, {})", vec![val("anon")])
            .unwrap()
            .as_("name")])
        .unwrap()
        .where_("age", ">", 18)
        .unwrap();

    let compiled = compile(&query.to_operation_node(), Dialect::Postgres).unwrap();
    assert_eq!(
        compiled.sql,
        r#"select coalesce(nickname, $1) as "name" from "person" where "age" > $2"#
    );
    assert_eq!(compiled.parameters, vec![Value::from("anon"), Value::from(18)]);
}

#[test]
fn test_compiling_twice_is_identical() {
    let query = pg()
        .select_from("person")
        .unwrap()
        .where_("id", "in", vec![1, 2])
        .unwrap();
    let node = query.to_operation_node();

    let first = compile(&node, Dialect::Postgres).unwrap();
    let second = compile(&node, Dialect::Postgres).unwrap();
    assert_eq!(first.sql, second.sql);
    assert_eq!(first.parameters, second.parameters);
}

#[test]
fn test_boolean_combinations() {
    let filter = or(vec![
        and(vec![
            cmp("age", ">=", 18).unwrap(),
            cmp("active", "=", true).unwrap(),
        ]),
        not(cmp_ref("first_name", "=", "last_name").unwrap()),
    ]);
    let query = pg().select_from("person").unwrap().where_expr(filter);

    assert_eq!(
        pg_sql(&query),
        r#"select from "person" where (("age" >= $1 and "active" is true) or not "first_name" = "last_name")"#
    );
}

#[test]
fn test_between_and_negation() {
    assert_eq!(
        select_expr(between("age", 18, 65).unwrap()),
        r#"select "age" between $1 and $2"#
    );
    assert_eq!(select_expr(neg(reference("balance").unwrap())), r#"select -"balance""#);
}

#[test]
fn test_sub_queries_are_parenthesized() {
    let db = pg();
    let owners = db.select_from("pet").unwrap().select(["owner_id"]).unwrap();
    let query = db
        .select_from("person")
        .unwrap()
        .where_("id", "in", &owners)
        .unwrap()
        .where_expr(exists(&owners));

    assert_eq!(
        pg_sql(&query),
        concat!(
            r#"select from "person" where "id" in (select "owner_id" from "pet") "#,
            r#"and exists (select "owner_id" from "pet")"#,
        )
    );
}

#[test]
fn test_aliased_sub_query_in_from() {
    let db = pg();
    let adults = db
        .select_from("person")
        .unwrap()
        .where_("age", ">=", 18)
        .unwrap()
        .as_("adults");
    let query = db.select_from(adults).unwrap().select_all();

    assert_eq!(
        pg_sql(&query),
        r#"select * from (select from "person" where "age" >= $1) as "adults""#
    );
}

#[test]
fn test_set_operations_are_not_wrapped() {
    let db = pg();
    let people = db.select_from("person").unwrap().select(["first_name"]).unwrap();
    let pets = db.select_from("pet").unwrap().select(["name"]).unwrap();

    assert_eq!(
        pg_sql(&people.union_all(&pets)),
        r#"select "first_name" from "person" union all select "name" from "pet""#
    );
}

#[test]
fn test_functions_and_casts() {
    assert_eq!(
        select_expr(func("lower", vec![reference("first_name").unwrap()])),
        r#"select lower("first_name")"#
    );
    assert_eq!(
        select_expr(cast(reference("age").unwrap(), "text").unwrap()),
        r#"select cast("age" as text)"#
    );
}

#[test]
fn test_case_expression() {
    let expr = case()
        .when(cmp("age", "<", 18).unwrap(), lit("minor"))
        .unwrap()
        .else_(lit("adult"))
        .unwrap()
        .end()
        .as_("bracket");

    assert_eq!(
        select_expr(expr),
        r#"select case when "age" < $1 then 'minor' else 'adult' end as "bracket""#
    );
}

#[test]
fn test_aggregates() {
    let total = sum("amount")
        .unwrap()
        .filter_where(cmp("status", "=", "paid").unwrap())
        .as_("paid");
    assert_eq!(
        select_expr(total),
        r#"select sum("amount") filter(where "status" = $1) as "paid""#
    );

    let running = count_all()
        .over(|o| o.partition_by(["species"])?.order_by("age desc"))
        .unwrap()
        .to_expr();
    assert_eq!(
        select_expr(running),
        r#"select count(*) over(partition by "species" order by "age" desc)"#
    );
}
