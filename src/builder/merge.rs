use std::sync::Arc;

use crate::ast::{
    AndNode, DeleteQueryNode, InsertQueryNode, JoinType, MatchedNode, MergeQueryNode,
    OperationNode, RawNode, UpdateQueryNode, WhenNode, WithNode,
};
use crate::error::{QuarryError, QuarryResult};
use crate::expression::Expr;
use crate::parser::TableExpression;

use super::insert::{parse_insert_rows, parse_updates};
use super::join::JoinBuilder;
use super::{MergeResult, QueryBuilderProps, ToOperationNode};

/// `merge into` statements (PostgreSQL 15+, SQL Server, Oracle).
///
/// ```rust,ignore
/// db.merge_into("person")?
///     .using("pet", "pet.owner_id", "person.id")?
///     .when_matched()
///     .then_delete()
///     .when_not_matched()
///     .then_insert_values(vec![("first_name", reference("pet.name")?)])?
///     .execute()
///     .await?;
/// ```
#[derive(Clone)]
pub struct MergeQueryBuilder {
    pub(crate) props: QueryBuilderProps,
    node: Arc<MergeQueryNode>,
}

impl MergeQueryBuilder {
    pub(crate) fn create(
        props: QueryBuilderProps,
        into: OperationNode,
        with: Option<Arc<WithNode>>,
    ) -> Self {
        Self {
            props,
            node: Arc::new(MergeQueryNode {
                with,
                ..MergeQueryNode::create(into)
            }),
        }
    }

    fn with_node(&self, node: MergeQueryNode) -> Self {
        Self {
            props: self.props.clone(),
            node: Arc::new(node),
        }
    }

    pub fn node(&self) -> &Arc<MergeQueryNode> {
        &self.node
    }

    /// `using <table> on <k1> = <k2>`
    pub fn using(&self, table: impl TableExpression, k1: &str, k2: &str) -> QuarryResult<Self> {
        self.using_with(table, |join| join.on_ref(k1, "=", k2))
    }

    pub fn using_with<F>(&self, table: impl TableExpression, f: F) -> QuarryResult<Self>
    where
        F: FnOnce(JoinBuilder) -> QuarryResult<JoinBuilder>,
    {
        let join = f(JoinBuilder::new(
            JoinType::Inner,
            table.into_table_expression()?,
        ))?;
        Ok(self.with_node(self.node.with_using(join.into_node())))
    }

    pub fn when_matched(&self) -> MatchedThen {
        self.matched_then(false, None)
    }

    /// `when matched and <condition>`
    pub fn when_matched_and(&self, condition: Expr) -> MatchedThen {
        self.matched_then(false, Some(condition))
    }

    /// `when not matched by source`: target rows without a source row.
    pub fn when_not_matched_by_source(&self) -> MatchedThen {
        self.matched_then(true, None)
    }

    pub fn when_not_matched_by_source_and(&self, condition: Expr) -> MatchedThen {
        self.matched_then(true, Some(condition))
    }

    pub fn when_not_matched(&self) -> NotMatchedThen {
        NotMatchedThen {
            builder: self.clone(),
            condition: when_condition(true, false, None),
        }
    }

    pub fn when_not_matched_and(&self, condition: Expr) -> NotMatchedThen {
        NotMatchedThen {
            builder: self.clone(),
            condition: when_condition(true, false, Some(condition)),
        }
    }

    fn matched_then(&self, by_source: bool, condition: Option<Expr>) -> MatchedThen {
        MatchedThen {
            builder: self.clone(),
            condition: when_condition(by_source, by_source, condition),
        }
    }

    fn with_when(&self, condition: OperationNode, result: OperationNode) -> Self {
        self.with_node(self.node.with_when(WhenNode {
            condition,
            result: Some(result),
        }))
    }

    pub async fn execute(&self) -> QuarryResult<MergeResult> {
        if self.node.using.is_none() {
            return Err(QuarryError::Validation(
                "merge needs a using clause".to_string(),
            ));
        }
        Ok(self.execute_raw().await?.into())
    }
}

impl ToOperationNode for MergeQueryBuilder {
    fn to_operation_node(&self) -> OperationNode {
        self.node.clone().into()
    }
}

fn when_condition(not: bool, by_source: bool, condition: Option<Expr>) -> OperationNode {
    let matched: OperationNode = MatchedNode { not, by_source }.into();
    match condition {
        Some(condition) => AndNode {
            left: matched,
            right: condition.into_node(),
        }
        .into(),
        None => matched,
    }
}

fn do_nothing() -> OperationNode {
    RawNode::sql("do nothing").into()
}

/// The action of a `when matched` or `when not matched by source` branch.
#[derive(Clone)]
pub struct MatchedThen {
    builder: MergeQueryBuilder,
    condition: OperationNode,
}

impl MatchedThen {
    /// `then update set ...` on the target row.
    pub fn then_update_set<K: AsRef<str>>(
        self,
        updates: Vec<(K, Expr)>,
    ) -> QuarryResult<MergeQueryBuilder> {
        let update = UpdateQueryNode {
            table: None,
            updates: parse_updates(updates)?,
            ..UpdateQueryNode::default()
        };
        Ok(self.builder.with_when(self.condition, update.into()))
    }

    pub fn then_delete(self) -> MergeQueryBuilder {
        self.builder
            .with_when(self.condition, DeleteQueryNode::create(Vec::new()).into())
    }

    pub fn then_do_nothing(self) -> MergeQueryBuilder {
        self.builder.with_when(self.condition, do_nothing())
    }
}

/// The action of a `when not matched` branch.
#[derive(Clone)]
pub struct NotMatchedThen {
    builder: MergeQueryBuilder,
    condition: OperationNode,
}

impl NotMatchedThen {
    /// `then insert (cols) values (...)`
    pub fn then_insert_values<K: AsRef<str>>(
        self,
        values: Vec<(K, Expr)>,
    ) -> QuarryResult<MergeQueryBuilder> {
        if values.is_empty() {
            return Err(QuarryError::Validation(
                "merge insert needs at least one value".to_string(),
            ));
        }
        let row = values
            .into_iter()
            .map(|(column, value)| (column.as_ref().to_string(), value.into_node()))
            .collect();
        let (columns, values) = parse_insert_rows(vec![row]);
        let insert = InsertQueryNode {
            into: None,
            columns,
            values: Some(values.into()),
            ..InsertQueryNode::default()
        };
        Ok(self.builder.with_when(self.condition, insert.into()))
    }

    pub fn then_do_nothing(self) -> MergeQueryBuilder {
        self.builder.with_when(self.condition, do_nothing())
    }
}
