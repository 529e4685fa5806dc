use pretty_assertions::assert_eq;

use super::*;
use crate::ast::NodeKind;

#[test]
fn test_bare_column() {
    let node = parse_reference("first_name").unwrap();
    assert_eq!(node, OperationNode::from(ColumnNode::new("first_name")));
}

#[test]
fn test_table_column() {
    let node = parse_reference("person.first_name").unwrap();
    let reference = node.cast::<ReferenceNode>().unwrap();
    assert_eq!(reference.table.as_ref().unwrap().name(), "person");
    assert_eq!(reference.column, OperationNode::from(ColumnNode::new("first_name")));
}

#[test]
fn test_schema_table_column() {
    let node = parse_reference("public.person.id").unwrap();
    let reference = node.cast::<ReferenceNode>().unwrap();
    let table = reference.table.as_ref().unwrap();
    assert_eq!(table.schema(), Some("public"));
    assert_eq!(table.name(), "person");
}

#[test]
fn test_too_many_dots_is_rejected() {
    let err = parse_reference("a.b.c.d").unwrap_err();
    assert!(matches!(err, QuarryError::InvalidReference { .. }));
    assert!(err.to_string().contains("a.b.c.d"));
}

#[test]
fn test_star_references() {
    assert_eq!(parse_reference("*").unwrap().kind(), NodeKind::SelectAll);
    let node = parse_reference("person.*").unwrap();
    let reference = node.cast::<ReferenceNode>().unwrap();
    assert_eq!(reference.column.kind(), NodeKind::SelectAll);
}

#[test]
fn test_alias() {
    let node = parse_aliased_reference("person.first_name as name").unwrap();
    let alias = node.cast::<AliasNode>().unwrap();
    assert_eq!(alias.alias_name(), Some("name"));
    assert_eq!(alias.node.kind(), NodeKind::Reference);
}

#[test]
fn test_double_alias_is_rejected() {
    assert!(parse_aliased_reference("a as b as c").is_err());
    assert!(parse_aliased_reference("a as ").is_err());
}

#[test]
fn test_table_expression_with_alias() {
    let node = parse_table_expression("public.person as p").unwrap();
    let alias = node.cast::<AliasNode>().unwrap();
    let table = alias.node.cast::<TableNode>().unwrap();
    assert_eq!(table.schema(), Some("public"));
    assert_eq!(alias.alias_name(), Some("p"));
}

#[test]
fn test_table_with_column_part_is_rejected() {
    assert!(parse_table("a.b.c").is_err());
    assert!(parse_table("").is_err());
}

#[test]
fn test_order_by_direction() {
    let item = parse_order_by("age desc").unwrap();
    assert_eq!(item.direction, Some(OrderDirection::Desc));
    let item = parse_order_by("age").unwrap();
    assert_eq!(item.direction, None);
}

#[test]
fn test_order_by_rejects_unknown_direction() {
    let err = parse_order_by("age DESC").unwrap_err();
    match err {
        QuarryError::InvalidOrderDirection { input, direction } => {
            assert_eq!(input, "age DESC");
            assert_eq!(direction, "DESC");
        }
        other => panic!("unexpected error {other}"),
    }
    assert!(parse_order_by("age sideways").is_err());
}

#[test]
fn test_equals_null_becomes_is() {
    let node = parse_binary_operation(
        ColumnNode::new("deleted_at").into(),
        "=",
        Operand::Value(Value::Null),
    )
    .unwrap();
    let op = node.cast::<BinaryOperationNode>().unwrap();
    assert_eq!(op.operator.operator, Operator::Is);
    assert_eq!(op.right, OperationNode::from(ValueNode::immediate(Value::Null)));
}

#[test]
fn test_not_equals_true_becomes_is_not() {
    let node = parse_binary_operation(
        ColumnNode::new("active").into(),
        "<>",
        Operand::Value(Value::Bool(true)),
    )
    .unwrap();
    let op = node.cast::<BinaryOperationNode>().unwrap();
    assert_eq!(op.operator.operator, Operator::IsNot);
    assert_eq!(op.right, OperationNode::from(ValueNode::immediate(true)));
}

#[test]
fn test_regular_values_are_bound() {
    let node = parse_binary_operation(
        ColumnNode::new("age").into(),
        ">",
        Operand::Value(Value::Int(18)),
    )
    .unwrap();
    let op = node.cast::<BinaryOperationNode>().unwrap();
    assert_eq!(op.right, OperationNode::from(ValueNode::new(18)));
}

#[test]
fn test_unknown_operator() {
    let err = parse_binary_operation(
        ColumnNode::new("age").into(),
        "=~=",
        Operand::Value(Value::Int(1)),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Invalid operator: '=~='");
}

#[test]
fn test_empty_filter_lists() {
    let and = parse_filter_list(vec![], Combinator::And);
    let op = and.cast::<BinaryOperationNode>().unwrap();
    assert_eq!(op.right, OperationNode::from(ValueNode::immediate(1)));

    let or = parse_filter_list(vec![], Combinator::Or);
    let op = or.cast::<BinaryOperationNode>().unwrap();
    assert_eq!(op.right, OperationNode::from(ValueNode::immediate(0)));
}

#[test]
fn test_single_filter_is_not_wrapped() {
    let filter: OperationNode = ColumnNode::new("a").into();
    assert_eq!(parse_filter_list(vec![filter.clone()], Combinator::And), filter);
}

#[test]
fn test_filter_list_folds_left() {
    let filters: Vec<OperationNode> = ["a", "b", "c"]
        .into_iter()
        .map(|c| ColumnNode::new(c).into())
        .collect();
    let node = parse_filter_list(filters, Combinator::Or);
    let parens = node.cast::<ParensNode>().unwrap();
    let outer = parens.node.cast::<OrNode>().unwrap();
    assert_eq!(outer.left.kind(), NodeKind::Or);
    assert_eq!(outer.right, OperationNode::from(ColumnNode::new("c")));
}

#[test]
fn test_common_table_expression_name() {
    let name = parse_common_table_expression_name("adults(id, name)").unwrap();
    assert_eq!(name.table.name(), "adults");
    let columns: Vec<&str> = name.columns.iter().map(|c| c.name()).collect();
    assert_eq!(columns, vec!["id", "name"]);

    assert!(parse_common_table_expression_name("adults(id").is_err());
    assert!(parse_common_table_expression_name("s.adults").is_err());
}

#[test]
fn test_mixed_value_list() {
    let list = parse_value_list(vec![
        Operand::Value(Value::Int(1)),
        Operand::Node(ColumnNode::new("x").into()),
    ])
    .unwrap();
    assert_eq!(list.len(), 2);
    assert!(matches!(list.values, crate::ast::ValueListItems::Expressions(_)));
}
