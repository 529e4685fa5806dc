//! Parsing of caller-supplied references, tables, operators and values into
//! AST nodes.
//!
//! References follow `column`, `table.column` or `schema.table.column`;
//! aliases use the literal ` as ` separator. Every failure is raised before
//! any I/O and names the offending input.

mod data_type;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::ast::{
    AliasNode, AndNode, BinaryOperationNode, ColumnNode, CommonTableExpressionNameNode,
    IdentifierNode, Operator, OperationNode, OrNode, OrderByItemNode, OrderDirection, ParensNode,
    ReferenceNode, SchemableIdentifierNode, SelectAllNode, TableNode, Value, ValueListNode,
    ValueNode,
};
use crate::error::{QuarryError, QuarryResult};
use crate::expression::Expr;

pub use data_type::parse_data_type;

const ALIAS_SEPARATOR: &str = " as ";

/// A right-hand operand: a plain value or an already built expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(Value),
    Node(OperationNode),
}

impl Operand {
    /// Plain values become bound parameters.
    pub fn into_node(self) -> OperationNode {
        match self {
            Operand::Value(value) => ValueNode::new(value).into(),
            Operand::Node(node) => node,
        }
    }

    /// Plain values become escaped literals. Used inside DDL.
    pub fn into_immediate_node(self) -> OperationNode {
        match self {
            Operand::Value(value) => ValueNode::immediate(value).into(),
            Operand::Node(node) => node,
        }
    }

    fn null_or_bool(&self) -> Option<&Value> {
        match self {
            Operand::Value(value) if value.is_null_or_bool() => Some(value),
            _ => None,
        }
    }
}

/// Anything usable as a value: primitives, `Value`, expressions, sub-queries, lists.
pub trait ValueExpression {
    fn into_operand(self) -> QuarryResult<Operand>;

    fn into_value_node(self) -> QuarryResult<OperationNode>
    where
        Self: Sized,
    {
        Ok(self.into_operand()?.into_node())
    }
}

macro_rules! primitive_value_expression {
    ($($ty:ty),*) => {
        $(
            impl ValueExpression for $ty {
                fn into_operand(self) -> QuarryResult<Operand> {
                    Ok(Operand::Value(self.into()))
                }
            }
        )*
    };
}

primitive_value_expression!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    &str,
    String,
    Value,
    serde_json::Value,
    uuid::Uuid,
    chrono::NaiveDateTime,
    chrono::NaiveDate,
    chrono::DateTime<chrono::Utc>
);

impl<T: ValueExpression> ValueExpression for Option<T> {
    fn into_operand(self) -> QuarryResult<Operand> {
        match self {
            Some(v) => v.into_operand(),
            None => Ok(Operand::Value(Value::Null)),
        }
    }
}

impl ValueExpression for Operand {
    fn into_operand(self) -> QuarryResult<Operand> {
        Ok(self)
    }
}

impl ValueExpression for OperationNode {
    fn into_operand(self) -> QuarryResult<Operand> {
        Ok(Operand::Node(self))
    }
}

impl ValueExpression for Expr {
    fn into_operand(self) -> QuarryResult<Operand> {
        Ok(Operand::Node(self.into_node()))
    }
}

impl ValueExpression for &Expr {
    fn into_operand(self) -> QuarryResult<Operand> {
        Ok(Operand::Node(self.node().clone()))
    }
}

impl<T: ValueExpression> ValueExpression for Vec<T> {
    fn into_operand(self) -> QuarryResult<Operand> {
        Ok(Operand::Node(parse_value_list(self)?.into()))
    }
}

impl<T: ValueExpression, const N: usize> ValueExpression for [T; N] {
    fn into_operand(self) -> QuarryResult<Operand> {
        Ok(Operand::Node(parse_value_list(self)?.into()))
    }
}

/// A list becomes one parameter per element when every element is a plain
/// value, otherwise every element is parsed as its own sub-expression.
pub fn parse_value_list<I, T>(items: I) -> QuarryResult<ValueListNode>
where
    I: IntoIterator<Item = T>,
    T: ValueExpression,
{
    let operands = items
        .into_iter()
        .map(ValueExpression::into_operand)
        .collect::<QuarryResult<Vec<_>>>()?;

    if operands.iter().all(|o| matches!(o, Operand::Value(_))) {
        let values = operands
            .into_iter()
            .filter_map(|o| match o {
                Operand::Value(v) => Some(v),
                Operand::Node(_) => None,
            })
            .collect();
        Ok(ValueListNode::primitive(values))
    } else {
        Ok(ValueListNode::expressions(
            operands.into_iter().map(Operand::into_node).collect(),
        ))
    }
}

/// Anything usable as a column reference: strings are parsed, expressions pass through.
pub trait ReferenceExpression {
    fn into_reference(self) -> QuarryResult<OperationNode>;
}

impl ReferenceExpression for &str {
    fn into_reference(self) -> QuarryResult<OperationNode> {
        parse_reference(self)
    }
}

impl ReferenceExpression for String {
    fn into_reference(self) -> QuarryResult<OperationNode> {
        parse_reference(&self)
    }
}

impl ReferenceExpression for &String {
    fn into_reference(self) -> QuarryResult<OperationNode> {
        parse_reference(self)
    }
}

impl ReferenceExpression for Expr {
    fn into_reference(self) -> QuarryResult<OperationNode> {
        Ok(self.into_node())
    }
}

impl ReferenceExpression for &Expr {
    fn into_reference(self) -> QuarryResult<OperationNode> {
        Ok(self.node().clone())
    }
}

impl ReferenceExpression for OperationNode {
    fn into_reference(self) -> QuarryResult<OperationNode> {
        Ok(self)
    }
}

/// Selections: references with optional ` as ` aliases, or expressions.
pub trait SelectExpression {
    fn into_selection(self) -> QuarryResult<OperationNode>;
}

impl SelectExpression for &str {
    fn into_selection(self) -> QuarryResult<OperationNode> {
        parse_aliased_reference(self)
    }
}

impl SelectExpression for String {
    fn into_selection(self) -> QuarryResult<OperationNode> {
        parse_aliased_reference(&self)
    }
}

impl SelectExpression for Expr {
    fn into_selection(self) -> QuarryResult<OperationNode> {
        Ok(self.into_node())
    }
}

impl SelectExpression for OperationNode {
    fn into_selection(self) -> QuarryResult<OperationNode> {
        Ok(self)
    }
}

/// Table sources: `schema.table as alias` strings or aliased sub-queries.
pub trait TableExpression {
    fn into_table_expression(self) -> QuarryResult<OperationNode>;
}

impl TableExpression for &str {
    fn into_table_expression(self) -> QuarryResult<OperationNode> {
        parse_table_expression(self)
    }
}

impl TableExpression for String {
    fn into_table_expression(self) -> QuarryResult<OperationNode> {
        parse_table_expression(&self)
    }
}

impl TableExpression for Expr {
    fn into_table_expression(self) -> QuarryResult<OperationNode> {
        Ok(self.into_node())
    }
}

impl TableExpression for OperationNode {
    fn into_table_expression(self) -> QuarryResult<OperationNode> {
        Ok(self)
    }
}

fn split_identifier_parts(input: &str) -> QuarryResult<Vec<&str>> {
    let parts: Vec<&str> = input.split('.').map(str::trim).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(QuarryError::reference(input, "empty identifier"));
    }
    Ok(parts)
}

/// `column`, `table.column`, `schema.table.column`; `*` is allowed as the column.
pub fn parse_reference(input: &str) -> QuarryResult<OperationNode> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(QuarryError::reference(input, "empty reference"));
    }
    let parts = split_identifier_parts(trimmed)?;

    let (table, column) = match parts.as_slice() {
        [column] => (None, *column),
        [table, column] => (Some(TableNode::new(*table)), *column),
        [schema, table, column] => (Some(TableNode::with_schema(*schema, *table)), *column),
        _ => {
            return Err(QuarryError::reference(
                input,
                "expected column, table.column or schema.table.column",
            ));
        }
    };

    if column == "*" {
        return Ok(match table {
            Some(table) => ReferenceNode::select_all(table).into(),
            None => SelectAllNode.into(),
        });
    }

    Ok(match table {
        Some(table) => ReferenceNode::column(Some(table), column).into(),
        None => ColumnNode::new(column).into(),
    })
}

fn split_alias(input: &str) -> QuarryResult<(&str, Option<&str>)> {
    match input.split_once(ALIAS_SEPARATOR) {
        Some((left, right)) => {
            let (left, right) = (left.trim(), right.trim());
            if left.is_empty() || right.is_empty() {
                return Err(QuarryError::reference(input, "empty side of an alias"));
            }
            if right.contains(ALIAS_SEPARATOR) {
                return Err(QuarryError::reference(input, "more than one alias"));
            }
            Ok((left, Some(right)))
        }
        None => Ok((input.trim(), None)),
    }
}

/// A reference followed by an optional ` as alias`.
pub fn parse_aliased_reference(input: &str) -> QuarryResult<OperationNode> {
    let (reference, alias) = split_alias(input)?;
    let node = parse_reference(reference)?;
    Ok(match alias {
        Some(alias) => AliasNode::new(node, alias).into(),
        None => node,
    })
}

/// `table` or `schema.table`.
pub fn parse_table(input: &str) -> QuarryResult<TableNode> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(QuarryError::reference(input, "empty table name"));
    }
    match split_identifier_parts(trimmed)?.as_slice() {
        [table] => Ok(TableNode::new(*table)),
        [schema, table] => Ok(TableNode::with_schema(*schema, *table)),
        _ => Err(QuarryError::reference(
            input,
            "expected table or schema.table",
        )),
    }
}

/// `table`, `schema.table`, either followed by an optional ` as alias`.
pub fn parse_table_expression(input: &str) -> QuarryResult<OperationNode> {
    let (table, alias) = split_alias(input)?;
    let table = parse_table(table)?;
    Ok(match alias {
        Some(alias) => AliasNode::new(table.into(), alias).into(),
        None => table.into(),
    })
}

/// `schema.name` identifiers for indexes and views.
pub fn parse_schemable_identifier(input: &str) -> QuarryResult<SchemableIdentifierNode> {
    let table = parse_table(input)?;
    Ok((*table.table).clone())
}

/// `reference` or `reference asc|desc`. The direction must be exact.
pub fn parse_order_by(input: &str) -> QuarryResult<OrderByItemNode> {
    let trimmed = input.trim();
    match trimmed.split_once(' ') {
        Some((reference, direction)) => {
            let dir = OrderDirection::parse(direction).ok_or_else(|| {
                QuarryError::InvalidOrderDirection {
                    input: input.to_string(),
                    direction: direction.to_string(),
                }
            })?;
            Ok(OrderByItemNode::new(parse_reference(reference)?, Some(dir)))
        }
        None => Ok(OrderByItemNode::new(parse_reference(trimmed)?, None)),
    }
}

/// `name` or `name(column_a, column_b)`.
pub fn parse_common_table_expression_name(
    input: &str,
) -> QuarryResult<CommonTableExpressionNameNode> {
    let trimmed = input.trim();
    let (name, columns) = match trimmed.split_once('(') {
        Some((name, rest)) => {
            let inner = rest.strip_suffix(')').ok_or_else(|| {
                QuarryError::reference(input, "unterminated column list")
            })?;
            let columns = inner
                .split(',')
                .map(str::trim)
                .map(|c| {
                    if c.is_empty() {
                        Err(QuarryError::reference(input, "empty column name"))
                    } else {
                        Ok(Arc::new(ColumnNode::new(c)))
                    }
                })
                .collect::<QuarryResult<Vec<_>>>()?;
            (name.trim(), columns)
        }
        None => (trimmed, Vec::new()),
    };
    if name.is_empty() || name.contains('.') {
        return Err(QuarryError::reference(input, "invalid common table expression name"));
    }
    Ok(CommonTableExpressionNameNode {
        table: Arc::new(TableNode::new(name)),
        columns,
    })
}

/// A column name without qualification.
pub fn parse_column(input: &str) -> QuarryResult<ColumnNode> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.contains('.') {
        return Err(QuarryError::reference(input, "expected a bare column name"));
    }
    Ok(ColumnNode::new(trimmed))
}

/// `left <op> right` with null/boolean promotion: `= null` becomes `is null`,
/// `!= true` becomes `is not true`. Null and boolean operands of `is` are
/// rendered inline.
pub fn parse_binary_operation(
    left: OperationNode,
    operator: &str,
    right: Operand,
) -> QuarryResult<OperationNode> {
    let mut op = Operator::parse_binary(operator)?;
    let literal = right.null_or_bool().cloned();
    if literal.is_some() {
        if op.is_equality() {
            op = Operator::Is;
        } else if op.is_inequality() {
            op = Operator::IsNot;
        }
    }

    let right = match (op, literal) {
        (Operator::Is | Operator::IsNot, Some(value)) => ValueNode::immediate(value).into(),
        _ => right.into_node(),
    };

    Ok(BinaryOperationNode::new(left, op, right).into())
}

/// Boolean combination of filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

/// `and([])` is `1 = 1`, `or([])` is `1 = 0`; one filter is returned as is;
/// two or more are chained left to right and wrapped in parentheses.
pub fn parse_filter_list(filters: Vec<OperationNode>, combinator: Combinator) -> OperationNode {
    let mut iter = filters.into_iter();
    let Some(first) = iter.next() else {
        let right = match combinator {
            Combinator::And => 1,
            Combinator::Or => 0,
        };
        return BinaryOperationNode::new(
            ValueNode::immediate(1).into(),
            Operator::Eq,
            ValueNode::immediate(right).into(),
        )
        .into();
    };

    let mut count = 1;
    let combined = iter.fold(first, |left, right| {
        count += 1;
        match combinator {
            Combinator::And => AndNode { left, right }.into(),
            Combinator::Or => OrNode { left, right }.into(),
        }
    });

    if count > 1 {
        ParensNode::new(combined).into()
    } else {
        combined
    }
}

/// Identifier nodes for names that are never qualified (constraints, indexes).
pub fn parse_identifier(input: &str) -> QuarryResult<IdentifierNode> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(QuarryError::reference(input, "empty identifier"));
    }
    Ok(IdentifierNode::new(trimmed))
}
