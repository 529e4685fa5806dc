use async_trait::async_trait;

use crate::ast::{IdentifierNode, OperationNode};
use crate::driver::{QueryResult, Row};
use crate::error::QuarryResult;
use crate::query_id::QueryId;
use crate::transformer::{Transformer, transform};

use super::Plugin;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CamelCaseOptions {
    /// `FIRST_NAME` instead of `first_name` in the database.
    pub upper_case: bool,
    /// `address1` becomes `address_1`.
    pub underscore_before_digits: bool,
    /// `fooBAR` becomes `foo_b_a_r` rather than `foo_bar`.
    pub underscore_between_uppercase_letters: bool,
    /// Leave keys of nested JSON objects in result rows untouched.
    pub maintain_nested_object_keys: bool,
}

/// camelCase names in code, snake_case names in the database.
///
/// Every identifier of an outgoing statement is converted to snake_case and
/// every column name of a result row back to camelCase.
#[derive(Debug, Clone, Default)]
pub struct CamelCasePlugin {
    options: CamelCaseOptions,
}

impl CamelCasePlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CamelCaseOptions) -> Self {
        Self { options }
    }

    pub fn snake_case(&self, s: &str) -> String {
        let chars: Vec<char> = s.chars().collect();
        let Some(first) = chars.first() else {
            return String::new();
        };

        let mut out: String = first.to_lowercase().collect();
        for pair in chars.windows(2) {
            let (prev, c) = (pair[0], pair[1]);
            if self.options.underscore_before_digits
                && c.is_ascii_digit()
                && !prev.is_ascii_digit()
                && !out.ends_with('_')
            {
                out.push('_');
                out.push(c);
                continue;
            }
            if c.is_uppercase() {
                if self.options.underscore_between_uppercase_letters || !prev.is_uppercase() {
                    out.push('_');
                }
                out.extend(c.to_lowercase());
            } else {
                out.push(c);
            }
        }

        if self.options.upper_case {
            out.to_uppercase()
        } else {
            out
        }
    }

    pub fn camel_case(&self, s: &str) -> String {
        let source = if self.options.upper_case && is_upper_snake_case(s) {
            s.to_lowercase()
        } else {
            s.to_string()
        };

        let mut out = String::with_capacity(source.len());
        let mut chars = source.chars();
        let Some(first) = chars.next() else {
            return out;
        };
        out.push(first);
        let mut prev = first;
        for c in chars {
            if c != '_' {
                if prev == '_' {
                    out.extend(c.to_uppercase());
                } else {
                    out.push(c);
                }
            }
            prev = c;
        }
        out
    }

    fn map_row(&self, row: Row) -> Row {
        row.into_iter()
            .map(|(key, value)| (self.camel_case(&key), self.map_value(value)))
            .collect()
    }

    fn map_value(&self, value: serde_json::Value) -> serde_json::Value {
        if self.options.maintain_nested_object_keys {
            return value;
        }
        match value {
            serde_json::Value::Object(object) => serde_json::Value::Object(
                object
                    .into_iter()
                    .map(|(key, value)| (self.camel_case(&key), self.map_value(value)))
                    .collect(),
            ),
            serde_json::Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(|v| self.map_value(v)).collect())
            }
            other => other,
        }
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    s.chars()
        .all(|c| c == '_' || c.is_ascii_digit() || c.is_uppercase())
}

struct SnakeCaseTransformer<'a>(&'a CamelCasePlugin);

impl Transformer for SnakeCaseTransformer<'_> {
    fn transform_node(&mut self, node: OperationNode, _: &[OperationNode]) -> OperationNode {
        match node.cast::<IdentifierNode>() {
            Some(id) => {
                let name = self.0.snake_case(&id.name);
                if name == id.name {
                    node
                } else {
                    IdentifierNode::new(name).into()
                }
            }
            None => node,
        }
    }
}

#[async_trait]
impl Plugin for CamelCasePlugin {
    fn transform_query(&self, node: OperationNode, _: &QueryId) -> QuarryResult<OperationNode> {
        transform(&mut SnakeCaseTransformer(self), &node)
    }

    async fn transform_result(&self, result: QueryResult, _: &QueryId) -> QuarryResult<QueryResult> {
        Ok(QueryResult {
            rows: result.rows.into_iter().map(|row| self.map_row(row)).collect(),
            ..result
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::{ReferenceNode, SelectQueryNode, SelectionNode, TableNode};
    use crate::transpiler::ToSql;

    #[test]
    fn test_snake_case() {
        let plugin = CamelCasePlugin::new();
        assert_eq!(plugin.snake_case("firstName"), "first_name");
        assert_eq!(plugin.snake_case("personID"), "person_id");
        assert_eq!(plugin.snake_case("address1"), "address1");

        let digits = CamelCasePlugin::with_options(CamelCaseOptions {
            underscore_before_digits: true,
            ..CamelCaseOptions::default()
        });
        assert_eq!(digits.snake_case("address1"), "address_1");
    }

    #[test]
    fn test_camel_case() {
        let plugin = CamelCasePlugin::new();
        assert_eq!(plugin.camel_case("first_name"), "firstName");
        assert_eq!(plugin.camel_case("id"), "id");

        let upper = CamelCasePlugin::with_options(CamelCaseOptions {
            upper_case: true,
            ..CamelCaseOptions::default()
        });
        assert_eq!(upper.camel_case("FIRST_NAME"), "firstName");
        assert_eq!(upper.snake_case("firstName"), "FIRST_NAME");
    }

    #[test]
    fn test_identifiers_are_snake_cased() {
        let node: OperationNode = SelectQueryNode::create(vec![TableNode::new("petOwner").into()])
            .with_selections(vec![SelectionNode::new(
                ReferenceNode::column(Some(TableNode::new("petOwner")), "firstName").into(),
            )])
            .into();
        let out = CamelCasePlugin::new()
            .transform_query(node, &QueryId::new())
            .unwrap();
        assert_eq!(
            out.to_sql().unwrap(),
            r#"select "pet_owner"."first_name" from "pet_owner""#
        );
    }

    #[tokio::test]
    async fn test_result_keys_are_camel_cased() {
        let row: Row = HashMap::from([
            ("first_name".to_string(), serde_json::json!("Jennifer")),
            ("pet_info".to_string(), serde_json::json!({"pet_name": "Doggo"})),
        ]);
        let result = QueryResult {
            rows: vec![row],
            ..QueryResult::default()
        };
        let out = CamelCasePlugin::new()
            .transform_result(result, &QueryId::new())
            .await
            .unwrap();
        assert_eq!(out.rows[0]["firstName"], serde_json::json!("Jennifer"));
        assert_eq!(out.rows[0]["petInfo"], serde_json::json!({"petName": "Doggo"}));
    }
}
