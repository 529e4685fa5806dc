use std::sync::Arc;

use crate::ast::{
    CreateViewNode, DropViewNode, OperationNode, SchemableIdentifierNode, ValueListItems,
    ValueListNode, ValueNode,
};
use crate::builder::{QueryBuilderProps, ToOperationNode};
use crate::error::QuarryResult;
use crate::transformer::{Transformer, transform};

use super::column::parse_columns;

#[derive(Clone)]
pub struct CreateViewBuilder {
    pub(crate) props: QueryBuilderProps,
    node: Arc<CreateViewNode>,
}

impl CreateViewBuilder {
    pub(crate) fn create(props: QueryBuilderProps, name: SchemableIdentifierNode) -> Self {
        Self {
            props,
            node: Arc::new(CreateViewNode {
                name: Arc::new(name),
                columns: Vec::new(),
                as_: None,
                or_replace: false,
                temporary: false,
                materialized: false,
                if_not_exists: false,
            }),
        }
    }

    fn with_node(&self, node: CreateViewNode) -> Self {
        Self {
            props: self.props.clone(),
            node: Arc::new(node),
        }
    }

    pub fn columns<I, S>(&self, columns: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(self.with_node(CreateViewNode {
            columns: parse_columns(columns)?,
            ..self.node.as_ref().clone()
        }))
    }

    /// The view's query. Views cannot take parameters, so every value in
    /// it is inlined as a literal.
    pub fn as_(&self, query: &impl ToOperationNode) -> QuarryResult<Self> {
        let query = transform(&mut InlineValues, &query.to_operation_node())?;
        Ok(self.with_node(CreateViewNode {
            as_: Some(query),
            ..self.node.as_ref().clone()
        }))
    }

    pub fn or_replace(&self) -> Self {
        self.with_node(CreateViewNode {
            or_replace: true,
            ..self.node.as_ref().clone()
        })
    }

    pub fn temporary(&self) -> Self {
        self.with_node(CreateViewNode {
            temporary: true,
            ..self.node.as_ref().clone()
        })
    }

    pub fn materialized(&self) -> Self {
        self.with_node(CreateViewNode {
            materialized: true,
            ..self.node.as_ref().clone()
        })
    }

    pub fn if_not_exists(&self) -> Self {
        self.with_node(CreateViewNode {
            if_not_exists: true,
            ..self.node.as_ref().clone()
        })
    }
}

impl ToOperationNode for CreateViewBuilder {
    fn to_operation_node(&self) -> OperationNode {
        self.node.clone().into()
    }
}

/// Turns bound values into literals.
struct InlineValues;

impl Transformer for InlineValues {
    fn transform_node(&mut self, node: OperationNode, _: &[OperationNode]) -> OperationNode {
        if let Some(value) = node.cast::<ValueNode>() {
            if value.immediate {
                return node;
            }
            return ValueNode::immediate(value.value.clone()).into();
        }
        if let Some(list) = node.cast::<ValueListNode>() {
            if let ValueListItems::Primitive(values) = &list.values {
                return ValueListNode::expressions(
                    values
                        .iter()
                        .map(|v| ValueNode::immediate(v.clone()).into())
                        .collect(),
                )
                .into();
            }
        }
        node
    }
}

#[derive(Clone)]
pub struct DropViewBuilder {
    pub(crate) props: QueryBuilderProps,
    node: Arc<DropViewNode>,
}

impl DropViewBuilder {
    pub(crate) fn create(props: QueryBuilderProps, name: SchemableIdentifierNode) -> Self {
        Self {
            props,
            node: Arc::new(DropViewNode {
                name: Arc::new(name),
                if_exists: false,
                cascade: false,
                materialized: false,
            }),
        }
    }

    fn with_node(&self, node: DropViewNode) -> Self {
        Self {
            props: self.props.clone(),
            node: Arc::new(node),
        }
    }

    pub fn if_exists(&self) -> Self {
        self.with_node(DropViewNode {
            if_exists: true,
            ..self.node.as_ref().clone()
        })
    }

    pub fn cascade(&self) -> Self {
        self.with_node(DropViewNode {
            cascade: true,
            ..self.node.as_ref().clone()
        })
    }

    pub fn materialized(&self) -> Self {
        self.with_node(DropViewNode {
            materialized: true,
            ..self.node.as_ref().clone()
        })
    }
}

impl ToOperationNode for DropViewBuilder {
    fn to_operation_node(&self) -> OperationNode {
        self.node.clone().into()
    }
}
