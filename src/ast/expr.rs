use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{OperationNode, Operator, OrderByNode, Value, WhereNode};

/// A value: a bound parameter, or an escaped literal when `immediate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueNode {
    pub value: Value,
    pub immediate: bool,
}

impl ValueNode {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            immediate: false,
        }
    }

    /// Rendered inline instead of bound. Only for trusted values.
    pub fn immediate(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            immediate: true,
        }
    }
}

/// Items of a `(a, b, c)` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueListItems {
    /// Plain values, bound as one parameter each.
    Primitive(Vec<Value>),
    /// Individually parsed sub-expressions.
    Expressions(Vec<OperationNode>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueListNode {
    pub values: ValueListItems,
}

impl ValueListNode {
    pub fn primitive(values: Vec<Value>) -> Self {
        Self {
            values: ValueListItems::Primitive(values),
        }
    }

    pub fn expressions(values: Vec<OperationNode>) -> Self {
        Self {
            values: ValueListItems::Expressions(values),
        }
    }

    pub fn len(&self) -> usize {
        match &self.values {
            ValueListItems::Primitive(v) => v.len(),
            ValueListItems::Expressions(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `values (..), (..)` rows of an insert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuesNode {
    pub values: Vec<Arc<ValueListNode>>,
}

/// `default` inside an insert row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultInsertValueNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorNode {
    pub operator: Operator,
}

impl OperatorNode {
    pub fn new(operator: Operator) -> Self {
        Self { operator }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryOperationNode {
    pub left: OperationNode,
    pub operator: Arc<OperatorNode>,
    pub right: OperationNode,
}

impl BinaryOperationNode {
    pub fn new(left: OperationNode, operator: Operator, right: OperationNode) -> Self {
        Self {
            left,
            operator: Arc::new(OperatorNode::new(operator)),
            right,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryOperationNode {
    pub operator: Arc<OperatorNode>,
    pub operand: OperationNode,
}

impl UnaryOperationNode {
    pub fn new(operator: Operator, operand: OperationNode) -> Self {
        Self {
            operator: Arc::new(OperatorNode::new(operator)),
            operand,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AndNode {
    pub left: OperationNode,
    pub right: OperationNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrNode {
    pub left: OperationNode,
    pub right: OperationNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParensNode {
    pub node: OperationNode,
}

impl ParensNode {
    pub fn new(node: OperationNode) -> Self {
        Self { node }
    }
}

/// Raw SQL: `sql_fragments[i]` is followed by `parameters[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub sql_fragments: Vec<String>,
    pub parameters: Vec<OperationNode>,
}

impl RawNode {
    pub fn new(sql_fragments: Vec<String>, parameters: Vec<OperationNode>) -> Self {
        Self {
            sql_fragments,
            parameters,
        }
    }

    /// Raw SQL without parameters.
    pub fn sql(sql: impl Into<String>) -> Self {
        Self {
            sql_fragments: vec![sql.into()],
            parameters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionNode {
    pub name: String,
    pub arguments: Vec<OperationNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateFunctionNode {
    pub func: String,
    pub aggregated: Vec<OperationNode>,
    pub distinct: bool,
    pub order_by: Option<Arc<OrderByNode>>,
    pub filter: Option<Arc<WhereNode>>,
    pub over: Option<Arc<OverNode>>,
}

impl AggregateFunctionNode {
    pub fn new(func: impl Into<String>, aggregated: Vec<OperationNode>) -> Self {
        Self {
            func: func.into(),
            aggregated,
            distinct: false,
            order_by: None,
            filter: None,
            over: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseNode {
    pub value: Option<OperationNode>,
    pub when: Vec<Arc<WhenNode>>,
    #[serde(rename = "else")]
    pub else_: Option<OperationNode>,
    /// `end case` instead of `end` (procedural case statements).
    pub is_statement: bool,
}

/// `when <condition> then <result>`; also a merge action branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhenNode {
    pub condition: OperationNode,
    pub result: Option<OperationNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastNode {
    pub expression: OperationNode,
    pub data_type: OperationNode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverNode {
    pub partition_by: Option<Arc<PartitionByNode>>,
    pub order_by: Option<Arc<OrderByNode>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionByNode {
    pub items: Vec<Arc<PartitionByItemNode>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionByItemNode {
    pub partition_by: OperationNode,
}

/// `matched`, `not matched` or `not matched by source` in a merge branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedNode {
    pub not: bool,
    pub by_source: bool,
}
