use std::sync::Arc;

use crate::ast::{CaseNode, OperationNode, WhenNode};
use crate::builder::ToOperationNode;
use crate::error::QuarryResult;
use crate::parser::ValueExpression;

use super::Expr;

/// `case [value] when ... then ... [else ...] end`
#[derive(Debug, Clone, PartialEq)]
pub struct CaseBuilder {
    node: CaseNode,
}

impl CaseBuilder {
    pub(crate) fn new(value: Option<OperationNode>) -> Self {
        Self {
            node: CaseNode {
                value,
                when: Vec::new(),
                else_: None,
                is_statement: false,
            },
        }
    }

    /// `when <condition> then <result>`. For a simple case the condition is
    /// the value compared against.
    pub fn when(&self, condition: impl ValueExpression, result: impl ValueExpression) -> QuarryResult<Self> {
        let mut when = self.node.when.clone();
        when.push(Arc::new(WhenNode {
            condition: condition.into_value_node()?,
            result: Some(result.into_value_node()?),
        }));
        Ok(Self {
            node: CaseNode {
                when,
                ..self.node.clone()
            },
        })
    }

    pub fn else_(&self, result: impl ValueExpression) -> QuarryResult<Self> {
        Ok(Self {
            node: CaseNode {
                else_: Some(result.into_value_node()?),
                ..self.node.clone()
            },
        })
    }

    pub fn end(&self) -> Expr {
        Expr::new(self.node.clone())
    }

    /// `end case`
    pub fn end_case(&self) -> Expr {
        Expr::new(CaseNode {
            is_statement: true,
            ..self.node.clone()
        })
    }
}

impl ToOperationNode for CaseBuilder {
    fn to_operation_node(&self) -> OperationNode {
        self.node.clone().into()
    }
}
