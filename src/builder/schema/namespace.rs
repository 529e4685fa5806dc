use std::sync::Arc;

use crate::ast::{CreateSchemaNode, DropSchemaNode, IdentifierNode, OperationNode};
use crate::builder::{QueryBuilderProps, ToOperationNode};

#[derive(Clone)]
pub struct CreateSchemaBuilder {
    pub(crate) props: QueryBuilderProps,
    node: Arc<CreateSchemaNode>,
}

impl CreateSchemaBuilder {
    pub(crate) fn create(props: QueryBuilderProps, schema: IdentifierNode) -> Self {
        Self {
            props,
            node: Arc::new(CreateSchemaNode {
                schema: Arc::new(schema),
                if_not_exists: false,
            }),
        }
    }

    pub fn if_not_exists(&self) -> Self {
        Self {
            props: self.props.clone(),
            node: Arc::new(CreateSchemaNode {
                if_not_exists: true,
                ..self.node.as_ref().clone()
            }),
        }
    }
}

impl ToOperationNode for CreateSchemaBuilder {
    fn to_operation_node(&self) -> OperationNode {
        self.node.clone().into()
    }
}

#[derive(Clone)]
pub struct DropSchemaBuilder {
    pub(crate) props: QueryBuilderProps,
    node: Arc<DropSchemaNode>,
}

impl DropSchemaBuilder {
    pub(crate) fn create(props: QueryBuilderProps, schema: IdentifierNode) -> Self {
        Self {
            props,
            node: Arc::new(DropSchemaNode {
                schema: Arc::new(schema),
                if_exists: false,
                cascade: false,
            }),
        }
    }

    fn with_node(&self, node: DropSchemaNode) -> Self {
        Self {
            props: self.props.clone(),
            node: Arc::new(node),
        }
    }

    pub fn if_exists(&self) -> Self {
        self.with_node(DropSchemaNode {
            if_exists: true,
            ..self.node.as_ref().clone()
        })
    }

    pub fn cascade(&self) -> Self {
        self.with_node(DropSchemaNode {
            cascade: true,
            ..self.node.as_ref().clone()
        })
    }
}

impl ToOperationNode for DropSchemaBuilder {
    fn to_operation_node(&self) -> OperationNode {
        self.node.clone().into()
    }
}
