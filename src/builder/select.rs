use std::sync::Arc;

use futures::stream::BoxStream;

use crate::ast::{
    AliasNode, ExplainNode, FetchModifier, FetchNode, GroupByItemNode, GroupByNode, HavingNode,
    LimitNode, NullsOrder, OffsetNode, OperationNode, OrderByItemNode, OrderByNode,
    OrderDirection, ReferenceNode, SelectAllNode, SelectModifier, SelectModifierNode,
    SelectQueryNode, SelectionNode, SetOperationNode, SetOperator, TopModifier, TopNode,
    ValueNode, WithNode,
};
use crate::driver::Row;
use crate::error::QuarryResult;
use crate::expression::Expr;
use crate::parser::{
    Operand, ReferenceExpression, SelectExpression, TableExpression, ValueExpression,
    parse_order_by, parse_table,
};

use super::interfaces::node_interfaces;
use super::{HavingInterface, QueryBuilderProps, ToOperationNode};

/// `select` statements.
///
/// ```rust,ignore
/// let people = db
///     .select_from("person")?
///     .select(["first_name", "age"])?
///     .where_("age", ">", 18)?
///     .order_by("first_name asc")?
///     .limit(10)?
///     .execute()
///     .await?;
/// ```
#[derive(Clone)]
pub struct SelectQueryBuilder {
    pub(crate) props: QueryBuilderProps,
    node: Arc<SelectQueryNode>,
}

impl SelectQueryBuilder {
    pub(crate) fn create(
        props: QueryBuilderProps,
        froms: Option<Vec<OperationNode>>,
        with: Option<Arc<WithNode>>,
    ) -> Self {
        let node = match froms {
            Some(froms) => SelectQueryNode::create(froms),
            None => SelectQueryNode::default(),
        };
        Self {
            props,
            node: Arc::new(SelectQueryNode { with, ..node }),
        }
    }

    fn with_node(&self, node: SelectQueryNode) -> Self {
        Self {
            props: self.props.clone(),
            node: Arc::new(node),
        }
    }

    pub fn node(&self) -> &Arc<SelectQueryNode> {
        &self.node
    }

    /// Adds selections: `column`, `table.column`, `column as alias`,
    /// `table.*`, or expressions such as aliased sub-queries.
    pub fn select<I, S>(&self, selections: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: SelectExpression,
    {
        let selections = selections
            .into_iter()
            .map(|s| Ok(SelectionNode::new(s.into_selection()?)))
            .collect::<QuarryResult<Vec<_>>>()?;
        Ok(self.with_node(self.node.with_selections(selections)))
    }

    /// `select *`
    pub fn select_all(&self) -> Self {
        self.with_node(
            self.node
                .with_selections(vec![SelectionNode::new(SelectAllNode.into())]),
        )
    }

    /// `select "table".*`
    pub fn select_all_from(&self, table: &str) -> QuarryResult<Self> {
        let table = parse_table(table)?;
        Ok(self.with_node(self.node.with_selections(vec![SelectionNode::new(
            ReferenceNode::select_all(table).into(),
        )])))
    }

    pub fn clear_select(&self) -> Self {
        self.with_node(self.node.without_selections())
    }

    /// Adds `from` items to the ones given at creation.
    pub fn from<I, T>(&self, froms: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: TableExpression,
    {
        let froms = froms
            .into_iter()
            .map(TableExpression::into_table_expression)
            .collect::<QuarryResult<Vec<_>>>()?;
        Ok(self.with_node(self.node.with_froms(froms)))
    }

    pub fn distinct(&self) -> Self {
        self.modifier(SelectModifier::Distinct)
    }

    /// PostgreSQL `distinct on (...)`.
    pub fn distinct_on<I, R>(&self, references: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = R>,
        R: ReferenceExpression,
    {
        let references = references
            .into_iter()
            .map(ReferenceExpression::into_reference)
            .collect::<QuarryResult<Vec<_>>>()?;
        Ok(self.with_node(self.node.with_distinct_on(references)))
    }

    fn modifier(&self, modifier: SelectModifier) -> Self {
        let node = SelectModifierNode::new(modifier);
        if modifier == SelectModifier::Distinct {
            self.with_node(self.node.with_front_modifier(node))
        } else {
            self.with_node(self.node.with_end_modifier(node))
        }
    }

    pub fn for_update(&self) -> Self {
        self.modifier(SelectModifier::ForUpdate)
    }

    /// `for update of "a", "b"`
    pub fn for_update_of<I, T>(&self, tables: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let of = tables
            .into_iter()
            .map(|t| Ok(parse_table(t.as_ref())?.into()))
            .collect::<QuarryResult<Vec<OperationNode>>>()?;
        Ok(self.with_node(self.node.with_end_modifier(SelectModifierNode {
            of,
            ..SelectModifierNode::new(SelectModifier::ForUpdate)
        })))
    }

    pub fn for_share(&self) -> Self {
        self.modifier(SelectModifier::ForShare)
    }

    pub fn for_key_share(&self) -> Self {
        self.modifier(SelectModifier::ForKeyShare)
    }

    pub fn for_no_key_update(&self) -> Self {
        self.modifier(SelectModifier::ForNoKeyUpdate)
    }

    pub fn no_wait(&self) -> Self {
        self.modifier(SelectModifier::NoWait)
    }

    pub fn skip_locked(&self) -> Self {
        self.modifier(SelectModifier::SkipLocked)
    }

    /// Raw SQL right after `select`, e.g. MySQL `sql_no_cache`.
    pub fn modify_front(&self, modifier: Expr) -> Self {
        self.with_node(
            self.node
                .with_front_modifier(SelectModifierNode::raw(modifier.into_node())),
        )
    }

    /// Raw SQL at the end of the statement.
    pub fn modify_end(&self, modifier: Expr) -> Self {
        self.with_node(
            self.node
                .with_end_modifier(SelectModifierNode::raw(modifier.into_node())),
        )
    }

    pub fn group_by<I, R>(&self, references: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = R>,
        R: ReferenceExpression,
    {
        let items = references
            .into_iter()
            .map(|r| {
                Ok(Arc::new(GroupByItemNode {
                    group_by: r.into_reference()?,
                }))
            })
            .collect::<QuarryResult<Vec<_>>>()?;
        Ok(self.with_node(self.node.with_group_by(GroupByNode { items })))
    }

    pub fn clear_group_by(&self) -> Self {
        self.with_node(SelectQueryNode {
            group_by: None,
            ..self.node.as_ref().clone()
        })
    }

    fn with_order_by_item(&self, item: OrderByItemNode) -> Self {
        self.with_node(SelectQueryNode {
            order_by: Some(Arc::new(OrderByNode::with_items(
                self.node.order_by.as_ref(),
                vec![item],
            ))),
            ..self.node.as_ref().clone()
        })
    }

    /// `reference` or `reference asc|desc`.
    pub fn order_by(&self, order_by: &str) -> QuarryResult<Self> {
        Ok(self.with_order_by_item(parse_order_by(order_by)?))
    }

    /// `order by <reference> [asc|desc] nulls first|last`
    pub fn order_by_nulls(&self, order_by: &str, nulls: NullsOrder) -> QuarryResult<Self> {
        let item = parse_order_by(order_by)?;
        Ok(self.with_order_by_item(OrderByItemNode {
            nulls: Some(nulls),
            ..item
        }))
    }

    pub fn order_by_expr(&self, expr: Expr, direction: Option<OrderDirection>) -> Self {
        self.with_order_by_item(OrderByItemNode::new(expr.into_node(), direction))
    }

    pub fn clear_order_by(&self) -> Self {
        self.with_node(SelectQueryNode {
            order_by: None,
            ..self.node.as_ref().clone()
        })
    }

    pub fn limit(&self, limit: impl ValueExpression) -> QuarryResult<Self> {
        Ok(self.with_node(self.node.with_limit(LimitNode {
            limit: limit.into_value_node()?,
        })))
    }

    pub fn clear_limit(&self) -> Self {
        self.with_node(self.node.without_limit())
    }

    pub fn offset(&self, offset: impl ValueExpression) -> QuarryResult<Self> {
        Ok(self.with_node(self.node.with_offset(OffsetNode {
            offset: offset.into_value_node()?,
        })))
    }

    pub fn clear_offset(&self) -> Self {
        self.with_node(self.node.without_offset())
    }

    /// `fetch next <n> rows only|with ties`; `modifier` is `only` or `with ties`.
    pub fn fetch(&self, row_count: impl ValueExpression, modifier: &str) -> QuarryResult<Self> {
        Ok(self.with_node(self.node.with_fetch(FetchNode {
            row_count: row_count.into_value_node()?,
            modifier: FetchModifier::parse(modifier)?,
        })))
    }

    /// SQL Server `top(<n>) [percent] [with ties]`.
    pub fn top(&self, expression: u32, modifier: Option<&str>) -> QuarryResult<Self> {
        let modifier = modifier.map(TopModifier::parse).transpose()?;
        Ok(self.with_node(self.node.with_top(TopNode {
            expression: ValueNode::immediate(i64::from(expression)).into(),
            modifier,
        })))
    }

    fn set_operation(&self, operator: SetOperator, other: &impl ToOperationNode, all: bool) -> Self {
        self.with_node(self.node.with_set_operation(SetOperationNode {
            operator,
            expression: other.to_operation_node(),
            all,
        }))
    }

    pub fn union(&self, other: &impl ToOperationNode) -> Self {
        self.set_operation(SetOperator::Union, other, false)
    }

    pub fn union_all(&self, other: &impl ToOperationNode) -> Self {
        self.set_operation(SetOperator::Union, other, true)
    }

    pub fn intersect(&self, other: &impl ToOperationNode) -> Self {
        self.set_operation(SetOperator::Intersect, other, false)
    }

    pub fn intersect_all(&self, other: &impl ToOperationNode) -> Self {
        self.set_operation(SetOperator::Intersect, other, true)
    }

    pub fn except(&self, other: &impl ToOperationNode) -> Self {
        self.set_operation(SetOperator::Except, other, false)
    }

    pub fn except_all(&self, other: &impl ToOperationNode) -> Self {
        self.set_operation(SetOperator::Except, other, true)
    }

    /// Prefix the statement with `explain`.
    pub fn explain(&self) -> Self {
        self.with_node(self.node.with_explain(ExplainNode { options: None }))
    }

    /// `explain <options>`, e.g. `raw("(format json)")` on PostgreSQL.
    pub fn explain_with(&self, options: Expr) -> Self {
        self.with_node(self.node.with_explain(ExplainNode {
            options: Some(options.into_node()),
        }))
    }

    /// The statement as `(<select>) as alias`, for `from`, joins and selections.
    pub fn as_(&self, alias: &str) -> Expr {
        Expr::new(AliasNode::new(self.to_operation_node(), alias))
    }

    pub async fn execute(&self) -> QuarryResult<Vec<Row>> {
        Ok(self.execute_raw().await?.rows)
    }

    /// Rows fetched `chunk_size` at a time.
    ///
    /// The connection stays checked out until the stream ends or is dropped.
    /// Must be called inside a tokio runtime.
    pub fn stream(&self, chunk_size: usize) -> QuarryResult<BoxStream<'static, QuarryResult<Row>>> {
        let compiled = self.compile()?;
        Ok(self.props.executor().stream_query(compiled, chunk_size))
    }
}

node_interfaces!(where: SelectQueryBuilder);

impl HavingInterface for SelectQueryBuilder {
    fn having_node(&self) -> Option<&Arc<HavingNode>> {
        self.node.having.as_ref()
    }

    fn set_having_node(&self, having: Option<Arc<HavingNode>>) -> Self {
        self.with_node(SelectQueryNode {
            having,
            ..self.node.as_ref().clone()
        })
    }
}

impl ToOperationNode for SelectQueryBuilder {
    fn to_operation_node(&self) -> OperationNode {
        self.node.clone().into()
    }
}

impl ValueExpression for SelectQueryBuilder {
    fn into_operand(self) -> QuarryResult<Operand> {
        Ok(Operand::Node(self.to_operation_node()))
    }
}

impl ValueExpression for &SelectQueryBuilder {
    fn into_operand(self) -> QuarryResult<Operand> {
        Ok(Operand::Node(self.to_operation_node()))
    }
}
