//! Expression helpers.
//!
//! Free functions that build [`Expr`] values for filters, selections and
//! updates: references, bound values, literals, comparisons, boolean
//! combinations, functions, aggregates, `case` and `cast`.
//!
//! ```rust,ignore
//! use quarry::expression::{and, cmp, or};
//!
//! let adults_named_j = and(vec![
//!     cmp("age", ">=", 18)?,
//!     or(vec![cmp("first_name", "like", "J%")?, cmp("last_name", "like", "J%")?]),
//! ]);
//! ```

mod aggregate;
mod case;

pub use aggregate::{AggregateBuilder, OverBuilder};
pub use case::CaseBuilder;

use crate::ast::{
    AliasNode, BinaryOperationNode, CastNode, FunctionNode, Operator, OperationNode, ParensNode,
    RawNode, UnaryOperationNode, Value, ValueNode,
};
use crate::builder::ToOperationNode;
use crate::error::{QuarryError, QuarryResult};
use crate::parser::{
    self, Combinator, ReferenceExpression, ValueExpression, parse_binary_operation,
    parse_data_type, parse_filter_list,
};

/// An expression node. Cheap to clone; never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr(OperationNode);

impl Expr {
    pub fn new(node: impl Into<OperationNode>) -> Self {
        Self(node.into())
    }

    pub fn node(&self) -> &OperationNode {
        &self.0
    }

    pub fn into_node(self) -> OperationNode {
        self.0
    }

    /// `<expr> as <alias>`
    pub fn as_(&self, alias: &str) -> Expr {
        Expr::new(AliasNode::new(self.0.clone(), alias))
    }

    /// `<expr> <op> <rhs>`, with the same operator validation as `where_`.
    pub fn cmp(&self, operator: &str, rhs: impl ValueExpression) -> QuarryResult<Expr> {
        Ok(Expr(parse_binary_operation(
            self.0.clone(),
            operator,
            rhs.into_operand()?,
        )?))
    }

    pub fn is_null(&self) -> Expr {
        Expr::new(BinaryOperationNode::new(
            self.0.clone(),
            Operator::Is,
            ValueNode::immediate(Value::Null).into(),
        ))
    }

    pub fn is_not_null(&self) -> Expr {
        Expr::new(BinaryOperationNode::new(
            self.0.clone(),
            Operator::IsNot,
            ValueNode::immediate(Value::Null).into(),
        ))
    }

    pub fn and(&self, other: Expr) -> Expr {
        and(vec![self.clone(), other])
    }

    pub fn or(&self, other: Expr) -> Expr {
        or(vec![self.clone(), other])
    }

    pub fn not(&self) -> Expr {
        not(self.clone())
    }
}

impl From<Expr> for OperationNode {
    fn from(expr: Expr) -> Self {
        expr.0
    }
}

impl ToOperationNode for Expr {
    fn to_operation_node(&self) -> OperationNode {
        self.0.clone()
    }
}

/// A column reference: `column`, `table.column` or `schema.table.column`.
pub fn reference(input: &str) -> QuarryResult<Expr> {
    Ok(Expr(parser::parse_reference(input)?))
}

/// A bound parameter.
pub fn val(value: impl Into<Value>) -> Expr {
    Expr::new(ValueNode::new(value))
}

/// A literal rendered inline. Never pass untrusted input.
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::new(ValueNode::immediate(value))
}

/// Raw SQL.
pub fn raw(sql: impl Into<String>) -> Expr {
    Expr::new(RawNode::sql(sql))
}

/// Raw SQL with `{}` markers replaced by `params`, in order.
pub fn raw_with(sql: &str, params: Vec<Expr>) -> QuarryResult<Expr> {
    let fragments: Vec<String> = sql.split("{}").map(str::to_string).collect();
    if fragments.len() != params.len() + 1 {
        return Err(QuarryError::Validation(format!(
            "raw sql '{}' has {} placeholders but {} parameters were given",
            sql,
            fragments.len() - 1,
            params.len()
        )));
    }
    Ok(Expr::new(RawNode::new(
        fragments,
        params.into_iter().map(Expr::into_node).collect(),
    )))
}

/// `<lhs> <op> <rhs>` where `rhs` is a value, list or expression.
pub fn cmp(
    lhs: impl ReferenceExpression,
    operator: &str,
    rhs: impl ValueExpression,
) -> QuarryResult<Expr> {
    Ok(Expr(parse_binary_operation(
        lhs.into_reference()?,
        operator,
        rhs.into_operand()?,
    )?))
}

/// `<lhs> <op> <rhs>` where both sides are references.
pub fn cmp_ref(
    lhs: impl ReferenceExpression,
    operator: &str,
    rhs: impl ReferenceExpression,
) -> QuarryResult<Expr> {
    Ok(Expr::new(BinaryOperationNode::new(
        lhs.into_reference()?,
        Operator::parse_binary(operator)?,
        rhs.into_reference()?,
    )))
}

/// `<expr> between <low> and <high>`
pub fn between(
    expr: impl ReferenceExpression,
    low: impl ValueExpression,
    high: impl ValueExpression,
) -> QuarryResult<Expr> {
    let range = crate::ast::AndNode {
        left: low.into_value_node()?,
        right: high.into_value_node()?,
    };
    Ok(Expr::new(BinaryOperationNode::new(
        expr.into_reference()?,
        Operator::Between,
        range.into(),
    )))
}

/// Every filter must hold. `and(vec![])` is always true.
pub fn and(filters: Vec<Expr>) -> Expr {
    Expr(parse_filter_list(
        filters.into_iter().map(Expr::into_node).collect(),
        Combinator::And,
    ))
}

/// Any filter must hold. `or(vec![])` is always false.
pub fn or(filters: Vec<Expr>) -> Expr {
    Expr(parse_filter_list(
        filters.into_iter().map(Expr::into_node).collect(),
        Combinator::Or,
    ))
}

pub fn not(expr: Expr) -> Expr {
    Expr::new(UnaryOperationNode::new(Operator::Not, expr.into_node()))
}

pub fn exists(subquery: &impl ToOperationNode) -> Expr {
    Expr::new(UnaryOperationNode::new(
        Operator::Exists,
        subquery.to_operation_node(),
    ))
}

pub fn not_exists(subquery: &impl ToOperationNode) -> Expr {
    Expr::new(UnaryOperationNode::new(
        Operator::NotExists,
        subquery.to_operation_node(),
    ))
}

/// `-<expr>`
pub fn neg(expr: Expr) -> Expr {
    Expr::new(UnaryOperationNode::new(Operator::Negate, expr.into_node()))
}

/// `(<expr>)`
pub fn parens(expr: Expr) -> Expr {
    Expr::new(ParensNode::new(expr.into_node()))
}

/// A function call: `name(arg, ...)`.
pub fn func(name: impl Into<String>, arguments: Vec<Expr>) -> Expr {
    Expr::new(FunctionNode {
        name: name.into(),
        arguments: arguments.into_iter().map(Expr::into_node).collect(),
    })
}

/// `cast(<expr> as <data type>)`
pub fn cast(expr: Expr, data_type: &str) -> QuarryResult<Expr> {
    Ok(Expr::new(CastNode {
        expression: expr.into_node(),
        data_type: parse_data_type(data_type)?.into(),
    }))
}

/// A searched `case when ... then ... end`.
pub fn case() -> CaseBuilder {
    CaseBuilder::new(None)
}

/// A simple `case <value> when ... then ... end`.
pub fn case_value(value: Expr) -> CaseBuilder {
    CaseBuilder::new(Some(value.into_node()))
}

/// Any aggregate or window function.
pub fn agg(func: impl Into<String>, arguments: Vec<Expr>) -> AggregateBuilder {
    AggregateBuilder::new(func, arguments.into_iter().map(Expr::into_node).collect())
}

pub fn count(expr: impl ReferenceExpression) -> QuarryResult<AggregateBuilder> {
    Ok(AggregateBuilder::new("count", vec![expr.into_reference()?]))
}

/// `count(*)`
pub fn count_all() -> AggregateBuilder {
    AggregateBuilder::new("count", vec![crate::ast::SelectAllNode.into()])
}

pub fn sum(expr: impl ReferenceExpression) -> QuarryResult<AggregateBuilder> {
    Ok(AggregateBuilder::new("sum", vec![expr.into_reference()?]))
}

pub fn avg(expr: impl ReferenceExpression) -> QuarryResult<AggregateBuilder> {
    Ok(AggregateBuilder::new("avg", vec![expr.into_reference()?]))
}

pub fn min(expr: impl ReferenceExpression) -> QuarryResult<AggregateBuilder> {
    Ok(AggregateBuilder::new("min", vec![expr.into_reference()?]))
}

pub fn max(expr: impl ReferenceExpression) -> QuarryResult<AggregateBuilder> {
    Ok(AggregateBuilder::new("max", vec![expr.into_reference()?]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{NodeKind, ValueListItems, ValueListNode};

    #[test]
    fn test_cmp_promotes_null() {
        let expr = cmp("deleted_at", "=", None::<i32>).unwrap();
        let op = expr.node().cast::<BinaryOperationNode>().unwrap();
        assert_eq!(op.operator.operator, Operator::Is);
        assert_eq!(
            op.right.cast::<ValueNode>().unwrap().as_ref(),
            &ValueNode::immediate(Value::Null)
        );
    }

    #[test]
    fn test_in_list_of_values_is_primitive() {
        let expr = cmp("id", "in", vec![1, 2, 3]).unwrap();
        let op = expr.node().cast::<BinaryOperationNode>().unwrap();
        let list = op.right.cast::<ValueListNode>().unwrap();
        assert_eq!(
            list.values,
            ValueListItems::Primitive(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn test_mixed_list_is_parsed_per_item() {
        let expr = cmp("id", "in", vec![val(1), reference("other.id").unwrap()]).unwrap();
        let op = expr.node().cast::<BinaryOperationNode>().unwrap();
        let list = op.right.cast::<ValueListNode>().unwrap();
        match &list.values {
            ValueListItems::Expressions(items) => {
                assert_eq!(items[0].kind(), NodeKind::Value);
                assert_eq!(items[1].kind(), NodeKind::Reference);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_raw_with_checks_placeholder_count() {
        assert!(raw_with("coalesce({}, {})", vec![val(1)]).is_err());
        assert!(raw_with("coalesce({}, {})", vec![val(1), val(2)]).is_ok());
    }

    #[test]
    fn test_and_of_two_is_parenthesized() {
        let expr = and(vec![
            cmp("a", "=", 1).unwrap(),
            cmp("b", "=", 2).unwrap(),
        ]);
        assert_eq!(expr.node().kind(), NodeKind::Parens);
    }
}
