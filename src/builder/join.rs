use crate::ast::{JoinNode, JoinType, OperationNode, RawNode};
use crate::error::QuarryResult;
use crate::expression::Expr;
use crate::parser::{Operand, ReferenceExpression, ValueExpression, parse_binary_operation};

use super::ToOperationNode;

/// The `on` clause of one join, handed to the `*_join_with` callbacks.
///
/// ```rust,ignore
/// db.select_from("person")?
///     .left_join_with("pet", |join| {
///         join.on_ref("pet.owner_id", "=", "person.id")?
///             .on("pet.name", "=", "Catto")
///     })?;
/// ```
#[derive(Debug, Clone)]
pub struct JoinBuilder {
    node: JoinNode,
}

impl JoinBuilder {
    pub(crate) fn new(join_type: JoinType, table: OperationNode) -> Self {
        Self {
            node: JoinNode::new(join_type, table),
        }
    }

    /// `on <lhs> <op> <value>`, and-ed with earlier conditions.
    pub fn on(
        &self,
        lhs: impl ReferenceExpression,
        operator: &str,
        rhs: impl ValueExpression,
    ) -> QuarryResult<Self> {
        let filter = parse_binary_operation(lhs.into_reference()?, operator, rhs.into_operand()?)?;
        Ok(Self {
            node: self.node.with_on(filter),
        })
    }

    /// `on <lhs> <op> <rhs>` with both sides references.
    pub fn on_ref(
        &self,
        lhs: impl ReferenceExpression,
        operator: &str,
        rhs: impl ReferenceExpression,
    ) -> QuarryResult<Self> {
        self.on(lhs, operator, Operand::Node(rhs.into_reference()?))
    }

    pub fn on_expr(&self, filter: Expr) -> Self {
        Self {
            node: self.node.with_on(filter.into_node()),
        }
    }

    /// Or-ed with the conditions so far.
    pub fn or_on_expr(&self, filter: Expr) -> Self {
        Self {
            node: self.node.with_or_on(filter.into_node()),
        }
    }

    /// `on true`, mostly for lateral joins.
    pub fn on_true(&self) -> Self {
        Self {
            node: self.node.with_on(RawNode::sql("true").into()),
        }
    }

    pub(crate) fn into_node(self) -> JoinNode {
        self.node
    }
}

impl ToOperationNode for JoinBuilder {
    fn to_operation_node(&self) -> OperationNode {
        self.node.clone().into()
    }
}
