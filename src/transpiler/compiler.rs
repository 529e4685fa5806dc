//! The default renderer for every node kind.

use std::sync::Arc;

use crate::ast::*;
use crate::error::{QuarryError, QuarryResult};

use super::traits::{IgnoreSpelling, PaginationStyle, SqlGenerator};

/// Renders a tree into SQL text and its ordered parameter list.
///
/// The walk is read-only. Parameters are numbered in the order their
/// placeholders are written, and the stack of parent kinds decides whether a
/// nested statement is parenthesized.
pub struct QueryCompiler<'g> {
    generator: &'g dyn SqlGenerator,
    sql: String,
    parameters: Vec<Value>,
    parents: Vec<NodeKind>,
}

impl<'g> QueryCompiler<'g> {
    pub fn new(generator: &'g dyn SqlGenerator) -> Self {
        Self {
            generator,
            sql: String::new(),
            parameters: Vec::new(),
            parents: Vec::new(),
        }
    }

    pub fn compile(mut self, node: &OperationNode) -> QuarryResult<(String, Vec<Value>)> {
        self.visit(node)?;
        Ok((self.sql, self.parameters))
    }

    fn append(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    fn add_parameter(&mut self, value: &Value) {
        self.parameters.push(value.clone());
        let placeholder = self.generator.placeholder(self.parameters.len());
        self.append(&placeholder);
    }

    fn identifier(&mut self, name: &str) {
        let quoted = self.generator.quote_identifier(name);
        self.append(&quoted);
    }

    /// Kind of the parent of the node currently being rendered.
    fn parent_kind(&self) -> Option<NodeKind> {
        self.parents.iter().rev().nth(1).copied()
    }

    fn wrap_sub_statement(&self, kind: NodeKind) -> bool {
        self.generator
            .parenthesize_sub_statement(kind, self.parent_kind())
    }

    fn visit(&mut self, node: &OperationNode) -> QuarryResult<()> {
        self.parents.push(node.kind());
        let result = self.dispatch(node);
        self.parents.pop();
        result
    }

    fn visit_typed<N: Node>(&mut self, node: &Arc<N>) -> QuarryResult<()> {
        self.visit(&node.clone().into_operation())
    }

    fn visit_list(&mut self, nodes: &[OperationNode], separator: &str) -> QuarryResult<()> {
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                self.append(separator);
            }
            self.visit(node)?;
        }
        Ok(())
    }

    fn visit_typed_list<N: Node>(&mut self, nodes: &[Arc<N>], separator: &str) -> QuarryResult<()> {
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                self.append(separator);
            }
            self.visit_typed(node)?;
        }
        Ok(())
    }

    /// `" " + node` when present.
    fn visit_opt<N: Node>(&mut self, node: &Option<Arc<N>>) -> QuarryResult<()> {
        if let Some(node) = node {
            self.append(" ");
            self.visit_typed(node)?;
        }
        Ok(())
    }

    fn constraint_name(&mut self, name: &Option<Arc<IdentifierNode>>) -> QuarryResult<()> {
        if let Some(name) = name {
            self.append("constraint ");
            self.visit_typed(name)?;
            self.append(" ");
        }
        Ok(())
    }

    fn column_list(&mut self, columns: &[Arc<ColumnNode>]) -> QuarryResult<()> {
        self.append("(");
        self.visit_typed_list(columns, ", ")?;
        self.append(")");
        Ok(())
    }

    fn dispatch(&mut self, node: &OperationNode) -> QuarryResult<()> {
        use OperationNode as O;

        match node {
            O::Identifier(n) => {
                self.identifier(&n.name);
                Ok(())
            }
            O::SchemableIdentifier(n) => {
                if let Some(schema) = &n.schema {
                    self.visit_typed(schema)?;
                    self.append(".");
                }
                self.visit_typed(&n.identifier)
            }
            O::Table(n) => self.visit_typed(&n.table),
            O::Column(n) => self.visit_typed(&n.column),
            O::SelectAll(_) => {
                self.append("*");
                Ok(())
            }
            O::Reference(n) => {
                if let Some(table) = &n.table {
                    self.visit_typed(table)?;
                    self.append(".");
                }
                self.visit(&n.column)
            }
            O::Alias(n) => {
                self.visit(&n.node)?;
                self.append(" as ");
                self.visit(&n.alias)
            }
            O::Value(n) => {
                if n.immediate {
                    let literal = self.generator.literal(&n.value);
                    self.append(&literal);
                } else {
                    self.add_parameter(&n.value);
                }
                Ok(())
            }
            O::ValueList(n) => self.visit_value_list(n),
            O::Values(n) => {
                self.append("values ");
                self.visit_typed_list(&n.values, ", ")
            }
            O::DefaultInsertValue(_) => {
                let keyword = self.generator.default_insert_value();
                self.append(keyword);
                Ok(())
            }
            O::Operator(n) => {
                self.append(n.operator.sql_symbol());
                Ok(())
            }
            O::BinaryOperation(n) => {
                self.visit(&n.left)?;
                self.append(" ");
                self.visit_typed(&n.operator)?;
                self.append(" ");
                self.visit(&n.right)
            }
            O::UnaryOperation(n) => {
                self.visit_typed(&n.operator)?;
                if n.operator.operator != Operator::Negate {
                    self.append(" ");
                }
                self.visit(&n.operand)
            }
            O::And(n) => {
                self.visit(&n.left)?;
                self.append(" and ");
                self.visit(&n.right)
            }
            O::Or(n) => {
                self.visit(&n.left)?;
                self.append(" or ");
                self.visit(&n.right)
            }
            O::Parens(n) => {
                self.append("(");
                self.visit(&n.node)?;
                self.append(")");
                Ok(())
            }
            O::Raw(n) => {
                for (i, fragment) in n.sql_fragments.iter().enumerate() {
                    self.append(fragment);
                    if let Some(parameter) = n.parameters.get(i) {
                        self.visit(parameter)?;
                    }
                }
                Ok(())
            }
            O::Function(n) => {
                self.append(&n.name);
                self.append("(");
                self.visit_list(&n.arguments, ", ")?;
                self.append(")");
                Ok(())
            }
            O::AggregateFunction(n) => self.visit_aggregate_function(n),
            O::Case(n) => {
                self.append("case");
                if let Some(value) = &n.value {
                    self.append(" ");
                    self.visit(value)?;
                }
                for when in &n.when {
                    self.append(" ");
                    self.visit_typed(when)?;
                }
                if let Some(else_) = &n.else_ {
                    self.append(" else ");
                    self.visit(else_)?;
                }
                self.append(" end");
                if n.is_statement {
                    self.append(" case");
                }
                Ok(())
            }
            O::When(n) => {
                self.append("when ");
                self.visit(&n.condition)?;
                if let Some(result) = &n.result {
                    self.append(" then ");
                    self.visit(result)?;
                }
                Ok(())
            }
            O::Cast(n) => {
                self.append("cast(");
                self.visit(&n.expression)?;
                self.append(" as ");
                self.visit(&n.data_type)?;
                self.append(")");
                Ok(())
            }
            O::Over(n) => {
                if let Some(partition_by) = &n.partition_by {
                    self.visit_typed(partition_by)?;
                }
                if let Some(order_by) = &n.order_by {
                    if n.partition_by.is_some() {
                        self.append(" ");
                    }
                    self.visit_typed(order_by)?;
                }
                Ok(())
            }
            O::PartitionBy(n) => {
                self.append("partition by ");
                self.visit_typed_list(&n.items, ", ")
            }
            O::PartitionByItem(n) => self.visit(&n.partition_by),
            O::Matched(n) => {
                if n.not {
                    self.append("not ");
                }
                self.append("matched");
                if n.by_source {
                    self.append(" by source");
                }
                Ok(())
            }

            O::Selection(n) => self.visit(&n.selection),
            O::From(n) => {
                self.append("from ");
                self.visit_list(&n.froms, ", ")
            }
            O::Join(n) => {
                self.append(n.join_type.sql_keyword());
                self.append(" ");
                self.visit(&n.table)?;
                self.visit_opt(&n.on)
            }
            O::On(n) => {
                self.append("on ");
                self.visit(&n.on)
            }
            O::Where(n) => {
                self.append("where ");
                self.visit(&n.where_)
            }
            O::Having(n) => {
                self.append("having ");
                self.visit(&n.having)
            }
            O::GroupBy(n) => {
                self.append("group by ");
                self.visit_typed_list(&n.items, ", ")
            }
            O::GroupByItem(n) => self.visit(&n.group_by),
            O::OrderBy(n) => {
                self.append("order by ");
                self.visit_typed_list(&n.items, ", ")
            }
            O::OrderByItem(n) => {
                self.visit(&n.order_by)?;
                if let Some(direction) = n.direction {
                    self.append(" ");
                    self.append(direction.sql_keyword());
                }
                match n.nulls {
                    Some(NullsOrder::First) => self.append(" nulls first"),
                    Some(NullsOrder::Last) => self.append(" nulls last"),
                    None => {}
                }
                Ok(())
            }
            O::Limit(n) => {
                self.append("limit ");
                self.visit(&n.limit)
            }
            O::Offset(n) => {
                self.append("offset ");
                self.visit(&n.offset)?;
                if self.generator.pagination() != PaginationStyle::LimitOffset {
                    self.append(" rows");
                }
                Ok(())
            }
            O::Fetch(n) => {
                self.append("fetch next ");
                self.visit(&n.row_count)?;
                self.append(match n.modifier {
                    FetchModifier::Only => " rows only",
                    FetchModifier::WithTies => " rows with ties",
                });
                Ok(())
            }
            O::Top(n) => {
                self.append("top(");
                self.visit(&n.expression)?;
                self.append(")");
                if let Some(modifier) = n.modifier {
                    self.append(" ");
                    self.append(modifier.sql_keyword());
                }
                Ok(())
            }
            O::SelectModifier(n) => {
                match (&n.modifier, &n.raw) {
                    (Some(modifier), _) => self.append(modifier.sql_keyword()),
                    (None, Some(raw)) => self.visit(raw)?,
                    (None, None) => {}
                }
                if !n.of.is_empty() {
                    self.append(" of ");
                    self.visit_list(&n.of, ", ")?;
                }
                Ok(())
            }
            O::SetOperation(n) => {
                self.append(n.operator.sql_keyword());
                if n.all {
                    self.append(" all");
                }
                self.append(" ");
                self.visit(&n.expression)
            }
            O::With(n) => {
                self.append("with ");
                if n.recursive {
                    self.append("recursive ");
                }
                self.visit_typed_list(&n.expressions, ", ")
            }
            O::CommonTableExpression(n) => {
                self.visit_typed(&n.name)?;
                self.append(" as ");
                match n.materialized {
                    Some(true) => self.append("materialized "),
                    Some(false) => self.append("not materialized "),
                    None => {}
                }
                self.visit(&n.expression)
            }
            O::CommonTableExpressionName(n) => {
                self.visit_typed(&n.table)?;
                if !n.columns.is_empty() {
                    self.column_list(&n.columns)?;
                }
                Ok(())
            }
            O::Returning(n) => {
                if !self.generator.supports_returning() {
                    return Err(QuarryError::unsupported(self.generator.name(), "returning"));
                }
                self.append("returning ");
                self.visit_typed_list(&n.selections, ", ")
            }
            O::ColumnUpdate(n) => {
                self.visit(&n.column)?;
                self.append(" = ");
                self.visit(&n.value)
            }
            O::OnConflict(n) => self.visit_on_conflict(n),
            O::OnDuplicateKey(n) => {
                self.append("on duplicate key update ");
                self.visit_typed_list(&n.updates, ", ")
            }
            O::Explain(n) => {
                self.append("explain");
                if let Some(options) = &n.options {
                    self.append(" ");
                    self.visit(options)?;
                }
                Ok(())
            }
            O::Using(n) => {
                self.append("using ");
                self.visit_list(&n.tables, ", ")
            }

            O::SelectQuery(n) => self.visit_select_query(n),
            O::InsertQuery(n) => self.visit_insert_query(n),
            O::UpdateQuery(n) => self.visit_update_query(n),
            O::DeleteQuery(n) => self.visit_delete_query(n),
            O::MergeQuery(n) => self.visit_merge_query(n),

            O::CreateTable(n) => self.visit_create_table(n),
            O::ColumnDefinition(n) => self.visit_column_definition(n),
            O::DataType(n) => {
                self.append(&n.data_type);
                Ok(())
            }
            O::DefaultValue(n) => {
                self.append("default ");
                self.visit(&n.default_value)
            }
            O::Generated(n) => {
                self.append("generated ");
                if n.always {
                    self.append("always ");
                } else if n.by_default {
                    self.append("by default ");
                }
                self.append("as ");
                match &n.expression {
                    Some(expression) if !n.identity => {
                        self.append("(");
                        self.visit(expression)?;
                        self.append(")");
                    }
                    _ => self.append("identity"),
                }
                if n.stored {
                    self.append(" stored");
                }
                Ok(())
            }
            O::References(n) => {
                self.append("references ");
                self.visit_typed(&n.table)?;
                self.append(" ");
                self.column_list(&n.columns)?;
                if let Some(action) = n.on_delete {
                    self.append(" on delete ");
                    self.append(action.sql_keyword());
                }
                if let Some(action) = n.on_update {
                    self.append(" on update ");
                    self.append(action.sql_keyword());
                }
                Ok(())
            }
            O::PrimaryKeyConstraint(n) => {
                self.constraint_name(&n.name)?;
                self.append("primary key ");
                self.column_list(&n.columns)
            }
            O::UniqueConstraint(n) => {
                self.constraint_name(&n.name)?;
                self.append("unique ");
                if n.nulls_not_distinct {
                    self.append("nulls not distinct ");
                }
                self.column_list(&n.columns)
            }
            O::CheckConstraint(n) => {
                self.constraint_name(&n.name)?;
                self.append("check (");
                self.visit(&n.expression)?;
                self.append(")");
                Ok(())
            }
            O::ForeignKeyConstraint(n) => {
                self.constraint_name(&n.name)?;
                self.append("foreign key ");
                self.column_list(&n.columns)?;
                self.append(" ");
                self.visit_typed(&n.references)
            }
            O::DropTable(n) => {
                self.append("drop table ");
                if n.if_exists {
                    self.append("if exists ");
                }
                self.visit_typed(&n.table)?;
                if n.cascade {
                    self.append(" cascade");
                }
                Ok(())
            }
            O::CreateIndex(n) => self.visit_create_index(n),
            O::DropIndex(n) => {
                self.append("drop index ");
                if n.if_exists {
                    self.append("if exists ");
                }
                self.visit_typed(&n.name)?;
                if let Some(table) = &n.table {
                    self.append(" on ");
                    self.visit_typed(table)?;
                }
                if n.cascade {
                    self.append(" cascade");
                }
                Ok(())
            }
            O::CreateSchema(n) => {
                self.append("create schema ");
                if n.if_not_exists {
                    self.append("if not exists ");
                }
                self.visit_typed(&n.schema)
            }
            O::DropSchema(n) => {
                self.append("drop schema ");
                if n.if_exists {
                    self.append("if exists ");
                }
                self.visit_typed(&n.schema)?;
                if n.cascade {
                    self.append(" cascade");
                }
                Ok(())
            }
            O::CreateView(n) => self.visit_create_view(n),
            O::DropView(n) => {
                self.append("drop ");
                if n.materialized {
                    self.append("materialized ");
                }
                self.append("view ");
                if n.if_exists {
                    self.append("if exists ");
                }
                self.visit_typed(&n.name)?;
                if n.cascade {
                    self.append(" cascade");
                }
                Ok(())
            }
            O::AlterTable(n) => self.visit_alter_table(n),
            O::AddColumn(n) => {
                self.append("add column ");
                self.visit_typed(&n.column)
            }
            O::DropColumn(n) => {
                self.append("drop column ");
                self.visit_typed(&n.column)
            }
            O::RenameColumn(n) => {
                self.append("rename column ");
                self.visit_typed(&n.column)?;
                self.append(" to ");
                self.visit_typed(&n.rename_to)
            }
            O::AlterColumn(n) => {
                self.append("alter column ");
                self.visit_typed(&n.column)?;
                if let Some(data_type) = &n.data_type {
                    self.append(" type ");
                    self.visit(data_type)?;
                } else if let Some(default) = &n.set_default {
                    self.append(" set default ");
                    self.visit(default)?;
                } else if n.drop_default {
                    self.append(" drop default");
                } else if n.set_not_null {
                    self.append(" set not null");
                } else if n.drop_not_null {
                    self.append(" drop not null");
                }
                Ok(())
            }
            O::AddConstraint(n) => {
                self.append("add ");
                self.visit(&n.constraint)
            }
            O::DropConstraint(n) => {
                self.append("drop constraint ");
                if n.if_exists {
                    self.append("if exists ");
                }
                self.visit_typed(&n.constraint_name)?;
                if n.cascade {
                    self.append(" cascade");
                }
                Ok(())
            }
        }
    }

    fn visit_value_list(&mut self, n: &ValueListNode) -> QuarryResult<()> {
        self.append("(");
        match &n.values {
            ValueListItems::Primitive(values) => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.append(", ");
                    }
                    self.add_parameter(value);
                }
            }
            ValueListItems::Expressions(nodes) => self.visit_list(nodes, ", ")?,
        }
        self.append(")");
        Ok(())
    }

    fn visit_aggregate_function(&mut self, n: &AggregateFunctionNode) -> QuarryResult<()> {
        self.append(&n.func);
        self.append("(");
        if n.distinct {
            self.append("distinct ");
        }
        self.visit_list(&n.aggregated, ", ")?;
        self.visit_opt(&n.order_by)?;
        self.append(")");
        if let Some(filter) = &n.filter {
            self.append(" filter(");
            self.visit_typed(filter)?;
            self.append(")");
        }
        if let Some(over) = &n.over {
            self.append(" over(");
            self.visit_typed(over)?;
            self.append(")");
        }
        Ok(())
    }

    fn visit_modifiers(&mut self, modifiers: &[Arc<SelectModifierNode>]) -> QuarryResult<()> {
        if modifiers.is_empty() {
            return Ok(());
        }
        let mut sorted = modifiers.to_vec();
        sorted.sort_by_key(|m| m.priority());
        self.append(" ");
        self.visit_typed_list(&sorted, " ")
    }

    fn visit_select_query(&mut self, n: &SelectQueryNode) -> QuarryResult<()> {
        let wrap = self.wrap_sub_statement(NodeKind::SelectQuery);
        if wrap {
            self.append("(");
        }

        if let Some(explain) = &n.explain {
            self.visit_typed(explain)?;
            self.append(" ");
        }
        if let Some(with) = &n.with {
            self.visit_typed(with)?;
            self.append(" ");
        }

        self.append("select");
        if !n.distinct_on.is_empty() {
            self.append(" distinct on (");
            self.visit_list(&n.distinct_on, ", ")?;
            self.append(")");
        }
        self.visit_modifiers(&n.front_modifiers)?;
        self.visit_opt(&n.top)?;
        if !n.selections.is_empty() {
            self.append(" ");
            self.visit_typed_list(&n.selections, ", ")?;
        }
        self.visit_opt(&n.from)?;
        for join in &n.joins {
            self.append(" ");
            self.visit_typed(join)?;
        }
        self.visit_opt(&n.where_)?;
        self.visit_opt(&n.group_by)?;
        self.visit_opt(&n.having)?;
        for operation in &n.set_operations {
            self.append(" ");
            self.visit_typed(operation)?;
        }
        self.visit_opt(&n.order_by)?;
        self.visit_opt(&n.limit)?;
        self.visit_opt(&n.offset)?;
        self.visit_opt(&n.fetch)?;
        self.visit_modifiers(&n.end_modifiers)?;

        if wrap {
            self.append(")");
        }
        Ok(())
    }

    fn visit_insert_query(&mut self, n: &InsertQueryNode) -> QuarryResult<()> {
        let wrap = self.wrap_sub_statement(NodeKind::InsertQuery);
        if wrap {
            self.append("(");
        }

        if let Some(explain) = &n.explain {
            self.visit_typed(explain)?;
            self.append(" ");
        }
        if let Some(with) = &n.with {
            self.visit_typed(with)?;
            self.append(" ");
        }

        let mut do_nothing_on_conflict = false;
        if n.ignore {
            match self.generator.insert_ignore() {
                IgnoreSpelling::Prefix(prefix) => self.append(prefix),
                IgnoreSpelling::OnConflictDoNothing => {
                    self.append("insert");
                    do_nothing_on_conflict = n.on_conflict.is_none();
                }
                IgnoreSpelling::Unsupported => {
                    return Err(QuarryError::unsupported(
                        self.generator.name(),
                        "insert ignore",
                    ));
                }
            }
        } else if n.replace {
            self.append("replace");
        } else {
            self.append("insert");
        }

        if let Some(into) = &n.into {
            self.append(" into ");
            self.visit_typed(into)?;
        }
        if !n.columns.is_empty() {
            self.append(" ");
            self.column_list(&n.columns)?;
        }
        if let Some(values) = &n.values {
            self.append(" ");
            self.visit(values)?;
        }
        if n.default_values {
            self.append(" default values");
        }
        self.visit_opt(&n.on_conflict)?;
        if do_nothing_on_conflict {
            self.append(" on conflict do nothing");
        }
        self.visit_opt(&n.on_duplicate_key)?;
        self.visit_opt(&n.returning)?;

        if wrap {
            self.append(")");
        }
        Ok(())
    }

    fn visit_on_conflict(&mut self, n: &OnConflictNode) -> QuarryResult<()> {
        self.append("on conflict");
        if !n.columns.is_empty() {
            self.append(" ");
            self.column_list(&n.columns)?;
        } else if let Some(constraint) = &n.constraint {
            self.append(" on constraint ");
            self.visit_typed(constraint)?;
        } else if let Some(expression) = &n.index_expression {
            self.append(" (");
            self.visit(expression)?;
            self.append(")");
        }
        self.visit_opt(&n.index_where)?;

        if n.do_nothing {
            self.append(" do nothing");
        } else if !n.updates.is_empty() {
            self.append(" do update set ");
            self.visit_typed_list(&n.updates, ", ")?;
            self.visit_opt(&n.update_where)?;
        }
        Ok(())
    }

    fn visit_update_query(&mut self, n: &UpdateQueryNode) -> QuarryResult<()> {
        let wrap = self.wrap_sub_statement(NodeKind::UpdateQuery);
        if wrap {
            self.append("(");
        }

        if let Some(explain) = &n.explain {
            self.visit_typed(explain)?;
            self.append(" ");
        }
        if let Some(with) = &n.with {
            self.visit_typed(with)?;
            self.append(" ");
        }

        self.append("update");
        if let Some(table) = &n.table {
            self.append(" ");
            self.visit(table)?;
        }
        // `update a join b on ... set ...` without a from list
        if n.from.is_none() {
            for join in &n.joins {
                self.append(" ");
                self.visit_typed(join)?;
            }
        }
        self.append(" set ");
        self.visit_typed_list(&n.updates, ", ")?;
        if n.from.is_some() {
            self.visit_opt(&n.from)?;
            for join in &n.joins {
                self.append(" ");
                self.visit_typed(join)?;
            }
        }
        self.visit_opt(&n.where_)?;
        self.visit_opt(&n.limit)?;
        self.visit_opt(&n.returning)?;

        if wrap {
            self.append(")");
        }
        Ok(())
    }

    fn visit_delete_query(&mut self, n: &DeleteQueryNode) -> QuarryResult<()> {
        let wrap = self.wrap_sub_statement(NodeKind::DeleteQuery);
        if wrap {
            self.append("(");
        }

        if let Some(explain) = &n.explain {
            self.visit_typed(explain)?;
            self.append(" ");
        }
        if let Some(with) = &n.with {
            self.visit_typed(with)?;
            self.append(" ");
        }

        self.append("delete");
        // a bare `delete` is a merge action
        if !n.from.froms.is_empty() {
            self.append(" ");
            self.visit_typed(&n.from)?;
        }
        self.visit_opt(&n.using)?;
        for join in &n.joins {
            self.append(" ");
            self.visit_typed(join)?;
        }
        self.visit_opt(&n.where_)?;
        self.visit_opt(&n.order_by)?;
        self.visit_opt(&n.limit)?;
        self.visit_opt(&n.returning)?;

        if wrap {
            self.append(")");
        }
        Ok(())
    }

    fn visit_merge_query(&mut self, n: &MergeQueryNode) -> QuarryResult<()> {
        let wrap = self.wrap_sub_statement(NodeKind::MergeQuery);
        if wrap {
            self.append("(");
        }

        if let Some(with) = &n.with {
            self.visit_typed(with)?;
            self.append(" ");
        }

        self.append("merge into ");
        self.visit(&n.into)?;
        if let Some(using) = &n.using {
            self.append(" using ");
            self.visit(&using.table)?;
            if let Some(on) = &using.on {
                self.append(" ");
                self.visit_typed(on)?;
            }
        }
        for when in &n.whens {
            self.append(" ");
            self.visit_typed(when)?;
        }

        if wrap {
            self.append(")");
        }
        Ok(())
    }

    fn visit_create_table(&mut self, n: &CreateTableNode) -> QuarryResult<()> {
        self.append("create ");
        if n.temporary {
            self.append("temporary ");
        }
        self.append("table ");
        if n.if_not_exists {
            self.append("if not exists ");
        }
        self.visit_typed(&n.table)?;
        self.append(" (");
        self.visit_typed_list(&n.columns, ", ")?;
        if !n.constraints.is_empty() {
            if !n.columns.is_empty() {
                self.append(", ");
            }
            self.visit_list(&n.constraints, ", ")?;
        }
        self.append(")");
        if let Some(on_commit) = n.on_commit {
            self.append(" on commit ");
            self.append(on_commit.sql_keyword());
        }
        Ok(())
    }

    fn visit_column_definition(&mut self, n: &ColumnDefinitionNode) -> QuarryResult<()> {
        self.visit_typed(&n.column)?;
        self.append(" ");
        self.visit(&n.data_type)?;
        if n.unsigned {
            self.append(" unsigned");
        }
        self.visit_opt(&n.generated)?;
        self.visit_opt(&n.default_to)?;
        if n.not_null {
            self.append(" not null");
        }
        if n.unique {
            self.append(" unique");
        }
        if n.nulls_not_distinct {
            self.append(" nulls not distinct");
        }
        if n.primary_key {
            self.append(" primary key");
        }
        if n.auto_increment {
            self.append(" ");
            let keyword = self.generator.auto_increment();
            self.append(keyword);
        }
        self.visit_opt(&n.references)?;
        self.visit_opt(&n.check)?;
        Ok(())
    }

    fn visit_create_index(&mut self, n: &CreateIndexNode) -> QuarryResult<()> {
        self.append("create ");
        if n.unique {
            self.append("unique ");
        }
        self.append("index ");
        if n.if_not_exists {
            self.append("if not exists ");
        }
        self.visit_typed(&n.name)?;
        if let Some(table) = &n.table {
            self.append(" on ");
            self.visit_typed(table)?;
        }
        if let Some(using) = &n.using {
            self.append(" using ");
            self.append(using);
        }
        if !n.columns.is_empty() {
            self.append(" (");
            self.visit_list(&n.columns, ", ")?;
            self.append(")");
        }
        if n.nulls_not_distinct {
            self.append(" nulls not distinct");
        }
        self.visit_opt(&n.where_)
    }

    fn visit_create_view(&mut self, n: &CreateViewNode) -> QuarryResult<()> {
        self.append("create ");
        if n.or_replace {
            self.append("or replace ");
        }
        if n.temporary {
            self.append("temporary ");
        }
        if n.materialized {
            self.append("materialized ");
        }
        self.append("view ");
        if n.if_not_exists {
            self.append("if not exists ");
        }
        self.visit_typed(&n.name)?;
        if !n.columns.is_empty() {
            self.append(" ");
            self.column_list(&n.columns)?;
        }
        if let Some(as_) = &n.as_ {
            self.append(" as ");
            self.visit(as_)?;
        }
        Ok(())
    }

    fn visit_alter_table(&mut self, n: &AlterTableNode) -> QuarryResult<()> {
        self.append("alter table ");
        self.visit_typed(&n.table)?;
        if let Some(rename_to) = &n.rename_to {
            self.append(" rename to ");
            self.visit_typed(rename_to)?;
        }
        if let Some(schema) = &n.set_schema {
            self.append(" set schema ");
            self.visit_typed(schema)?;
        }
        if !n.column_alterations.is_empty() {
            self.append(" ");
            self.visit_list(&n.column_alterations, ", ")?;
        }
        self.visit_opt(&n.add_constraint)?;
        self.visit_opt(&n.drop_constraint)
    }
}
