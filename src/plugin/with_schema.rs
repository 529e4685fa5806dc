use std::collections::HashSet;
use std::sync::Arc;

use crate::ast::{
    IdentifierNode, NodeKind, OperationNode, ReferenceNode, SchemableIdentifierNode, TableNode,
    WithNode,
};
use crate::error::QuarryResult;
use crate::query_id::QueryId;
use crate::transformer::{Transformer, Visitor, transform, visit};

use super::Plugin;

/// Qualifies every unqualified table of a statement with one schema.
///
/// Names defined by a `with` clause are left alone, and so are column
/// qualifiers that name an alias rather than a table of the statement.
#[derive(Debug, Clone)]
pub struct WithSchemaPlugin {
    schema: String,
}

impl WithSchemaPlugin {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
        }
    }
}

impl Plugin for WithSchemaPlugin {
    fn transform_query(&self, node: OperationNode, _: &QueryId) -> QuarryResult<OperationNode> {
        let mut tables = TableCollector::default();
        visit(&mut tables, &node);

        let mut transformer = SchemaTransformer {
            schema: &self.schema,
            tables: tables.tables,
            ctes: tables.ctes,
        };
        transform(&mut transformer, &node)
    }
}

#[derive(Default)]
struct TableCollector {
    tables: HashSet<String>,
    ctes: HashSet<String>,
}

impl Visitor for TableCollector {
    fn visit_node(&mut self, node: &OperationNode, ancestors: &[OperationNode]) {
        if let Some(with) = node.cast::<WithNode>() {
            self.ctes.extend(with.names().map(str::to_string));
            return;
        }
        let Some(table) = node.cast::<TableNode>() else {
            return;
        };
        // `person.id` names a table, but so might `p.id` with `p` an alias
        let qualifies_column = ancestors
            .last()
            .is_some_and(|parent| parent.is::<ReferenceNode>());
        if !qualifies_column && table.schema().is_none() {
            self.tables.insert(table.name().to_string());
        }
    }
}

struct SchemaTransformer<'a> {
    schema: &'a str,
    tables: HashSet<String>,
    ctes: HashSet<String>,
}

impl SchemaTransformer<'_> {
    fn is_object_name(ancestors: &[OperationNode]) -> bool {
        matches!(
            ancestors.last().map(OperationNode::kind),
            Some(NodeKind::CreateView | NodeKind::DropView | NodeKind::DropIndex)
        )
    }
}

impl Transformer for SchemaTransformer<'_> {
    fn transform_node(&mut self, node: OperationNode, ancestors: &[OperationNode]) -> OperationNode {
        let Some(id) = node.cast::<SchemableIdentifierNode>() else {
            return node;
        };
        if id.schema.is_some() {
            return node;
        }
        let name = id.identifier.name.as_str();
        if self.ctes.contains(name) {
            return node;
        }
        if !self.tables.contains(name) && !Self::is_object_name(ancestors) {
            return node;
        }
        SchemableIdentifierNode {
            schema: Some(Arc::new(IdentifierNode::new(self.schema))),
            identifier: id.identifier.clone(),
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::{
        AliasNode, CommonTableExpressionNode, ReferenceNode, SelectQueryNode, SelectionNode,
        WithCapableNode,
    };
    use crate::parser::parse_common_table_expression_name;
    use crate::transpiler::ToSql;

    fn qualify(node: OperationNode) -> String {
        WithSchemaPlugin::new("app")
            .transform_query(node, &QueryId::new())
            .unwrap()
            .to_sql()
            .unwrap()
    }

    #[test]
    fn test_tables_and_their_references_are_qualified() {
        let node = SelectQueryNode::create(vec![TableNode::new("person").into()])
            .with_selections(vec![SelectionNode::new(
                ReferenceNode::column(Some(TableNode::new("person")), "id").into(),
            )]);
        assert_eq!(
            qualify(node.into()),
            r#"select "app"."person"."id" from "app"."person""#
        );
    }

    #[test]
    fn test_aliases_are_not_qualified() {
        let node = SelectQueryNode::create(vec![
            AliasNode::new(TableNode::new("person").into(), "p").into(),
        ])
        .with_selections(vec![SelectionNode::new(
            ReferenceNode::column(Some(TableNode::new("p")), "id").into(),
        )]);
        assert_eq!(
            qualify(node.into()),
            r#"select "p"."id" from "app"."person" as "p""#
        );
    }

    #[test]
    fn test_cte_names_are_not_qualified() {
        let cte = CommonTableExpressionNode {
            name: Arc::new(parse_common_table_expression_name("adults").unwrap()),
            materialized: None,
            expression: SelectQueryNode::create(vec![TableNode::new("person").into()]).into(),
        };
        let with = WithNode::default().with_expression(cte);
        let node = SelectQueryNode::create(vec![TableNode::new("adults").into()])
            .set_with_node(Some(Arc::new(with)));
        assert_eq!(
            qualify(node.into()),
            r#"with "adults" as (select from "app"."person") select from "adults""#
        );
    }
}
