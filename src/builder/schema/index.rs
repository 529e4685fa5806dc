use std::sync::Arc;

use crate::ast::{
    CreateIndexNode, DropIndexNode, IdentifierNode, OperationNode, OrderDirection, RawNode,
    SchemableIdentifierNode, WhereNode,
};
use crate::builder::{QueryBuilderProps, ToOperationNode};
use crate::error::{QuarryError, QuarryResult};
use crate::expression::{Expr, parens};
use crate::parser::{
    Operand, ReferenceExpression, ValueExpression, parse_binary_operation, parse_column,
    parse_table,
};

#[derive(Clone)]
pub struct CreateIndexBuilder {
    pub(crate) props: QueryBuilderProps,
    node: Arc<CreateIndexNode>,
}

impl CreateIndexBuilder {
    pub(crate) fn create(props: QueryBuilderProps, name: IdentifierNode) -> Self {
        Self {
            props,
            node: Arc::new(CreateIndexNode {
                name: Arc::new(name),
                table: None,
                columns: Vec::new(),
                unique: false,
                if_not_exists: false,
                using: None,
                where_: None,
                nulls_not_distinct: false,
            }),
        }
    }

    fn with_node(&self, node: CreateIndexNode) -> Self {
        Self {
            props: self.props.clone(),
            node: Arc::new(node),
        }
    }

    pub fn on(&self, table: &str) -> QuarryResult<Self> {
        Ok(self.with_node(CreateIndexNode {
            table: Some(Arc::new(parse_table(table)?)),
            ..self.node.as_ref().clone()
        }))
    }

    /// Indexed columns, `"name"` or `"name desc"`.
    pub fn columns<I, S>(&self, columns: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut all = self.node.columns.clone();
        for column in columns {
            all.push(index_column(column.as_ref())?);
        }
        Ok(self.with_node(CreateIndexNode {
            columns: all,
            ..self.node.as_ref().clone()
        }))
    }

    pub fn column(&self, column: &str) -> QuarryResult<Self> {
        self.columns([column])
    }

    /// An expression index: `create index ... ((lower(name)))`.
    pub fn expression(&self, expression: Expr) -> Self {
        let mut columns = self.node.columns.clone();
        columns.push(parens(expression).into_node());
        self.with_node(CreateIndexNode {
            columns,
            ..self.node.as_ref().clone()
        })
    }

    pub fn unique(&self) -> Self {
        self.with_node(CreateIndexNode {
            unique: true,
            ..self.node.as_ref().clone()
        })
    }

    pub fn nulls_not_distinct(&self) -> Self {
        self.with_node(CreateIndexNode {
            nulls_not_distinct: true,
            ..self.node.as_ref().clone()
        })
    }

    pub fn if_not_exists(&self) -> Self {
        self.with_node(CreateIndexNode {
            if_not_exists: true,
            ..self.node.as_ref().clone()
        })
    }

    /// Index method such as `btree`, `hash` or `gin`.
    pub fn using(&self, method: &str) -> QuarryResult<Self> {
        let method = parse_index_method(method)?;
        Ok(self.with_node(CreateIndexNode {
            using: Some(method),
            ..self.node.as_ref().clone()
        }))
    }

    /// Partial index filter. Values are inlined.
    pub fn where_(
        &self,
        lhs: impl ReferenceExpression,
        operator: &str,
        rhs: impl ValueExpression,
    ) -> QuarryResult<Self> {
        let rhs = Operand::Node(rhs.into_operand()?.into_immediate_node());
        let filter = parse_binary_operation(lhs.into_reference()?, operator, rhs)?;
        Ok(self.with_node(CreateIndexNode {
            where_: Some(Arc::new(WhereNode::and(self.node.where_.as_ref(), filter))),
            ..self.node.as_ref().clone()
        }))
    }

    pub fn where_expr(&self, filter: Expr) -> Self {
        self.with_node(CreateIndexNode {
            where_: Some(Arc::new(WhereNode::and(
                self.node.where_.as_ref(),
                filter.into_node(),
            ))),
            ..self.node.as_ref().clone()
        })
    }
}

impl ToOperationNode for CreateIndexBuilder {
    fn to_operation_node(&self) -> OperationNode {
        self.node.clone().into()
    }
}

fn index_column(input: &str) -> QuarryResult<OperationNode> {
    match input.trim().split_once(' ') {
        Some((column, direction)) => {
            let column: OperationNode = parse_column(column)?.into();
            let direction = OrderDirection::parse(direction).ok_or_else(|| {
                QuarryError::InvalidOrderDirection {
                    input: input.to_string(),
                    direction: direction.to_string(),
                }
            })?;
            Ok(RawNode::new(
                vec![String::new(), format!(" {}", direction.sql_keyword())],
                vec![column],
            )
            .into())
        }
        None => Ok(parse_column(input)?.into()),
    }
}

fn parse_index_method(input: &str) -> QuarryResult<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(QuarryError::Validation(format!(
            "invalid index method '{}'",
            input
        )));
    }
    Ok(trimmed.to_lowercase())
}

#[derive(Clone)]
pub struct DropIndexBuilder {
    pub(crate) props: QueryBuilderProps,
    node: Arc<DropIndexNode>,
}

impl DropIndexBuilder {
    pub(crate) fn create(props: QueryBuilderProps, name: SchemableIdentifierNode) -> Self {
        Self {
            props,
            node: Arc::new(DropIndexNode {
                name: Arc::new(name),
                table: None,
                if_exists: false,
                cascade: false,
            }),
        }
    }

    fn with_node(&self, node: DropIndexNode) -> Self {
        Self {
            props: self.props.clone(),
            node: Arc::new(node),
        }
    }

    /// MySQL `drop index <name> on <table>`.
    pub fn on(&self, table: &str) -> QuarryResult<Self> {
        Ok(self.with_node(DropIndexNode {
            table: Some(Arc::new(parse_table(table)?)),
            ..self.node.as_ref().clone()
        }))
    }

    pub fn if_exists(&self) -> Self {
        self.with_node(DropIndexNode {
            if_exists: true,
            ..self.node.as_ref().clone()
        })
    }

    pub fn cascade(&self) -> Self {
        self.with_node(DropIndexNode {
            cascade: true,
            ..self.node.as_ref().clone()
        })
    }
}

impl ToOperationNode for DropIndexBuilder {
    fn to_operation_node(&self) -> OperationNode {
        self.node.clone().into()
    }
}
