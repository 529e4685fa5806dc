//! The per-kind rebuild table. Every arm re-emits every field of its node.

use crate::ast::*;
use crate::error::QuarryResult;

use super::ChildMapper;

pub(crate) fn map_children<M: ChildMapper + ?Sized>(
    m: &mut M,
    node: &OperationNode,
) -> QuarryResult<OperationNode> {
    use OperationNode as O;

    Ok(match node {
        O::Identifier(_)
        | O::SelectAll(_)
        | O::Value(_)
        | O::Operator(_)
        | O::DefaultInsertValue(_)
        | O::Matched(_)
        | O::DataType(_) => node.clone(),

        // references
        O::SchemableIdentifier(n) => SchemableIdentifierNode {
            schema: m.opt_typed(&n.schema)?,
            identifier: m.typed(&n.identifier)?,
        }
        .into(),
        O::Table(n) => TableNode {
            table: m.typed(&n.table)?,
        }
        .into(),
        O::Column(n) => ColumnNode {
            column: m.typed(&n.column)?,
        }
        .into(),
        O::Reference(n) => ReferenceNode {
            table: m.opt_typed(&n.table)?,
            column: m.node(&n.column)?,
        }
        .into(),
        O::Alias(n) => AliasNode {
            node: m.node(&n.node)?,
            alias: m.node(&n.alias)?,
        }
        .into(),

        // expressions
        O::ValueList(n) => match &n.values {
            ValueListItems::Primitive(_) => node.clone(),
            ValueListItems::Expressions(items) => ValueListNode::expressions(m.list(items)?).into(),
        },
        O::Values(n) => ValuesNode {
            values: m.typed_list(&n.values)?,
        }
        .into(),
        O::BinaryOperation(n) => BinaryOperationNode {
            left: m.node(&n.left)?,
            operator: m.typed(&n.operator)?,
            right: m.node(&n.right)?,
        }
        .into(),
        O::UnaryOperation(n) => UnaryOperationNode {
            operator: m.typed(&n.operator)?,
            operand: m.node(&n.operand)?,
        }
        .into(),
        O::And(n) => AndNode {
            left: m.node(&n.left)?,
            right: m.node(&n.right)?,
        }
        .into(),
        O::Or(n) => OrNode {
            left: m.node(&n.left)?,
            right: m.node(&n.right)?,
        }
        .into(),
        O::Parens(n) => ParensNode {
            node: m.node(&n.node)?,
        }
        .into(),
        O::Raw(n) => RawNode {
            sql_fragments: n.sql_fragments.clone(),
            parameters: m.list(&n.parameters)?,
        }
        .into(),
        O::Function(n) => FunctionNode {
            name: n.name.clone(),
            arguments: m.list(&n.arguments)?,
        }
        .into(),
        O::AggregateFunction(n) => AggregateFunctionNode {
            func: n.func.clone(),
            aggregated: m.list(&n.aggregated)?,
            distinct: n.distinct,
            order_by: m.opt_typed(&n.order_by)?,
            filter: m.opt_typed(&n.filter)?,
            over: m.opt_typed(&n.over)?,
        }
        .into(),
        O::Case(n) => CaseNode {
            value: m.opt(&n.value)?,
            when: m.typed_list(&n.when)?,
            else_: m.opt(&n.else_)?,
            is_statement: n.is_statement,
        }
        .into(),
        O::When(n) => WhenNode {
            condition: m.node(&n.condition)?,
            result: m.opt(&n.result)?,
        }
        .into(),
        O::Cast(n) => CastNode {
            expression: m.node(&n.expression)?,
            data_type: m.node(&n.data_type)?,
        }
        .into(),
        O::Over(n) => OverNode {
            partition_by: m.opt_typed(&n.partition_by)?,
            order_by: m.opt_typed(&n.order_by)?,
        }
        .into(),
        O::PartitionBy(n) => PartitionByNode {
            items: m.typed_list(&n.items)?,
        }
        .into(),
        O::PartitionByItem(n) => PartitionByItemNode {
            partition_by: m.node(&n.partition_by)?,
        }
        .into(),

        // clauses
        O::Selection(n) => SelectionNode {
            selection: m.node(&n.selection)?,
        }
        .into(),
        O::From(n) => FromNode {
            froms: m.list(&n.froms)?,
        }
        .into(),
        O::Join(n) => JoinNode {
            join_type: n.join_type,
            table: m.node(&n.table)?,
            on: m.opt_typed(&n.on)?,
        }
        .into(),
        O::On(n) => OnNode { on: m.node(&n.on)? }.into(),
        O::Where(n) => WhereNode {
            where_: m.node(&n.where_)?,
        }
        .into(),
        O::Having(n) => HavingNode {
            having: m.node(&n.having)?,
        }
        .into(),
        O::GroupBy(n) => GroupByNode {
            items: m.typed_list(&n.items)?,
        }
        .into(),
        O::GroupByItem(n) => GroupByItemNode {
            group_by: m.node(&n.group_by)?,
        }
        .into(),
        O::OrderBy(n) => OrderByNode {
            items: m.typed_list(&n.items)?,
        }
        .into(),
        O::OrderByItem(n) => OrderByItemNode {
            order_by: m.node(&n.order_by)?,
            direction: n.direction,
            nulls: n.nulls,
        }
        .into(),
        O::Limit(n) => LimitNode {
            limit: m.node(&n.limit)?,
        }
        .into(),
        O::Offset(n) => OffsetNode {
            offset: m.node(&n.offset)?,
        }
        .into(),
        O::Fetch(n) => FetchNode {
            row_count: m.node(&n.row_count)?,
            modifier: n.modifier,
        }
        .into(),
        O::Top(n) => TopNode {
            expression: m.node(&n.expression)?,
            modifier: n.modifier,
        }
        .into(),
        O::SelectModifier(n) => SelectModifierNode {
            modifier: n.modifier,
            raw: m.opt(&n.raw)?,
            of: m.list(&n.of)?,
        }
        .into(),
        O::SetOperation(n) => SetOperationNode {
            operator: n.operator,
            expression: m.node(&n.expression)?,
            all: n.all,
        }
        .into(),
        O::With(n) => WithNode {
            expressions: m.typed_list(&n.expressions)?,
            recursive: n.recursive,
        }
        .into(),
        O::CommonTableExpression(n) => CommonTableExpressionNode {
            name: m.typed(&n.name)?,
            materialized: n.materialized,
            expression: m.node(&n.expression)?,
        }
        .into(),
        O::CommonTableExpressionName(n) => CommonTableExpressionNameNode {
            table: m.typed(&n.table)?,
            columns: m.typed_list(&n.columns)?,
        }
        .into(),
        O::Returning(n) => ReturningNode {
            selections: m.typed_list(&n.selections)?,
        }
        .into(),
        O::ColumnUpdate(n) => ColumnUpdateNode {
            column: m.node(&n.column)?,
            value: m.node(&n.value)?,
        }
        .into(),
        O::OnConflict(n) => OnConflictNode {
            columns: m.typed_list(&n.columns)?,
            constraint: m.opt_typed(&n.constraint)?,
            index_expression: m.opt(&n.index_expression)?,
            index_where: m.opt_typed(&n.index_where)?,
            updates: m.typed_list(&n.updates)?,
            update_where: m.opt_typed(&n.update_where)?,
            do_nothing: n.do_nothing,
        }
        .into(),
        O::OnDuplicateKey(n) => OnDuplicateKeyNode {
            updates: m.typed_list(&n.updates)?,
        }
        .into(),
        O::Explain(n) => ExplainNode {
            options: m.opt(&n.options)?,
        }
        .into(),
        O::Using(n) => UsingNode {
            tables: m.list(&n.tables)?,
        }
        .into(),

        // statements
        O::SelectQuery(n) => SelectQueryNode {
            explain: m.opt_typed(&n.explain)?,
            with: m.opt_typed(&n.with)?,
            front_modifiers: m.typed_list(&n.front_modifiers)?,
            distinct_on: m.list(&n.distinct_on)?,
            top: m.opt_typed(&n.top)?,
            selections: m.typed_list(&n.selections)?,
            from: m.opt_typed(&n.from)?,
            joins: m.typed_list(&n.joins)?,
            where_: m.opt_typed(&n.where_)?,
            group_by: m.opt_typed(&n.group_by)?,
            having: m.opt_typed(&n.having)?,
            set_operations: m.typed_list(&n.set_operations)?,
            order_by: m.opt_typed(&n.order_by)?,
            limit: m.opt_typed(&n.limit)?,
            offset: m.opt_typed(&n.offset)?,
            fetch: m.opt_typed(&n.fetch)?,
            end_modifiers: m.typed_list(&n.end_modifiers)?,
        }
        .into(),
        O::InsertQuery(n) => InsertQueryNode {
            explain: m.opt_typed(&n.explain)?,
            with: m.opt_typed(&n.with)?,
            into: m.opt_typed(&n.into)?,
            columns: m.typed_list(&n.columns)?,
            values: m.opt(&n.values)?,
            on_conflict: m.opt_typed(&n.on_conflict)?,
            on_duplicate_key: m.opt_typed(&n.on_duplicate_key)?,
            returning: m.opt_typed(&n.returning)?,
            ignore: n.ignore,
            replace: n.replace,
            default_values: n.default_values,
        }
        .into(),
        O::UpdateQuery(n) => UpdateQueryNode {
            explain: m.opt_typed(&n.explain)?,
            with: m.opt_typed(&n.with)?,
            table: m.opt(&n.table)?,
            joins: m.typed_list(&n.joins)?,
            updates: m.typed_list(&n.updates)?,
            from: m.opt_typed(&n.from)?,
            where_: m.opt_typed(&n.where_)?,
            limit: m.opt_typed(&n.limit)?,
            returning: m.opt_typed(&n.returning)?,
        }
        .into(),
        O::DeleteQuery(n) => DeleteQueryNode {
            explain: m.opt_typed(&n.explain)?,
            with: m.opt_typed(&n.with)?,
            from: m.typed(&n.from)?,
            using: m.opt_typed(&n.using)?,
            joins: m.typed_list(&n.joins)?,
            where_: m.opt_typed(&n.where_)?,
            order_by: m.opt_typed(&n.order_by)?,
            limit: m.opt_typed(&n.limit)?,
            returning: m.opt_typed(&n.returning)?,
        }
        .into(),
        O::MergeQuery(n) => MergeQueryNode {
            with: m.opt_typed(&n.with)?,
            into: m.node(&n.into)?,
            using: m.opt_typed(&n.using)?,
            whens: m.typed_list(&n.whens)?,
        }
        .into(),

        // schema
        O::CreateTable(n) => CreateTableNode {
            table: m.typed(&n.table)?,
            columns: m.typed_list(&n.columns)?,
            constraints: m.list(&n.constraints)?,
            temporary: n.temporary,
            if_not_exists: n.if_not_exists,
            on_commit: n.on_commit,
        }
        .into(),
        O::ColumnDefinition(n) => ColumnDefinitionNode {
            column: m.typed(&n.column)?,
            data_type: m.node(&n.data_type)?,
            references: m.opt_typed(&n.references)?,
            primary_key: n.primary_key,
            auto_increment: n.auto_increment,
            unique: n.unique,
            not_null: n.not_null,
            unsigned: n.unsigned,
            nulls_not_distinct: n.nulls_not_distinct,
            default_to: m.opt_typed(&n.default_to)?,
            check: m.opt_typed(&n.check)?,
            generated: m.opt_typed(&n.generated)?,
        }
        .into(),
        O::DefaultValue(n) => DefaultValueNode {
            default_value: m.node(&n.default_value)?,
        }
        .into(),
        O::Generated(n) => GeneratedNode {
            by_default: n.by_default,
            always: n.always,
            identity: n.identity,
            stored: n.stored,
            expression: m.opt(&n.expression)?,
        }
        .into(),
        O::References(n) => ReferencesNode {
            table: m.typed(&n.table)?,
            columns: m.typed_list(&n.columns)?,
            on_delete: n.on_delete,
            on_update: n.on_update,
        }
        .into(),
        O::PrimaryKeyConstraint(n) => PrimaryKeyConstraintNode {
            columns: m.typed_list(&n.columns)?,
            name: m.opt_typed(&n.name)?,
        }
        .into(),
        O::UniqueConstraint(n) => UniqueConstraintNode {
            columns: m.typed_list(&n.columns)?,
            name: m.opt_typed(&n.name)?,
            nulls_not_distinct: n.nulls_not_distinct,
        }
        .into(),
        O::CheckConstraint(n) => CheckConstraintNode {
            expression: m.node(&n.expression)?,
            name: m.opt_typed(&n.name)?,
        }
        .into(),
        O::ForeignKeyConstraint(n) => ForeignKeyConstraintNode {
            columns: m.typed_list(&n.columns)?,
            references: m.typed(&n.references)?,
            name: m.opt_typed(&n.name)?,
        }
        .into(),
        O::DropTable(n) => DropTableNode {
            table: m.typed(&n.table)?,
            if_exists: n.if_exists,
            cascade: n.cascade,
        }
        .into(),
        O::CreateIndex(n) => CreateIndexNode {
            name: m.typed(&n.name)?,
            table: m.opt_typed(&n.table)?,
            columns: m.list(&n.columns)?,
            unique: n.unique,
            if_not_exists: n.if_not_exists,
            using: n.using.clone(),
            where_: m.opt_typed(&n.where_)?,
            nulls_not_distinct: n.nulls_not_distinct,
        }
        .into(),
        O::DropIndex(n) => DropIndexNode {
            name: m.typed(&n.name)?,
            table: m.opt_typed(&n.table)?,
            if_exists: n.if_exists,
            cascade: n.cascade,
        }
        .into(),
        O::CreateSchema(n) => CreateSchemaNode {
            schema: m.typed(&n.schema)?,
            if_not_exists: n.if_not_exists,
        }
        .into(),
        O::DropSchema(n) => DropSchemaNode {
            schema: m.typed(&n.schema)?,
            if_exists: n.if_exists,
            cascade: n.cascade,
        }
        .into(),
        O::CreateView(n) => CreateViewNode {
            name: m.typed(&n.name)?,
            columns: m.typed_list(&n.columns)?,
            as_: m.opt(&n.as_)?,
            or_replace: n.or_replace,
            temporary: n.temporary,
            materialized: n.materialized,
            if_not_exists: n.if_not_exists,
        }
        .into(),
        O::DropView(n) => DropViewNode {
            name: m.typed(&n.name)?,
            if_exists: n.if_exists,
            cascade: n.cascade,
            materialized: n.materialized,
        }
        .into(),
        O::AlterTable(n) => AlterTableNode {
            table: m.typed(&n.table)?,
            rename_to: m.opt_typed(&n.rename_to)?,
            set_schema: m.opt_typed(&n.set_schema)?,
            column_alterations: m.list(&n.column_alterations)?,
            add_constraint: m.opt_typed(&n.add_constraint)?,
            drop_constraint: m.opt_typed(&n.drop_constraint)?,
        }
        .into(),
        O::AddColumn(n) => AddColumnNode {
            column: m.typed(&n.column)?,
        }
        .into(),
        O::DropColumn(n) => DropColumnNode {
            column: m.typed(&n.column)?,
        }
        .into(),
        O::RenameColumn(n) => RenameColumnNode {
            column: m.typed(&n.column)?,
            rename_to: m.typed(&n.rename_to)?,
        }
        .into(),
        O::AlterColumn(n) => AlterColumnNode {
            column: m.typed(&n.column)?,
            data_type: m.opt(&n.data_type)?,
            set_default: m.opt(&n.set_default)?,
            drop_default: n.drop_default,
            set_not_null: n.set_not_null,
            drop_not_null: n.drop_not_null,
        }
        .into(),
        O::AddConstraint(n) => AddConstraintNode {
            constraint: m.node(&n.constraint)?,
        }
        .into(),
        O::DropConstraint(n) => DropConstraintNode {
            constraint_name: m.typed(&n.constraint_name)?,
            if_exists: n.if_exists,
            cascade: n.cascade,
        }
        .into(),
    })
}
