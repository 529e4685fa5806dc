mod ddl;
mod dialects;
mod expressions;
mod statements;

use crate::ast::OperationNode;
use crate::builder::ToOperationNode;
use crate::engine::Quarry;
use crate::transpiler::{Dialect, compile};

fn pg() -> Quarry {
    Quarry::offline(Dialect::Postgres)
}

fn sql_for(query: &impl ToOperationNode, dialect: Dialect) -> String {
    let node: OperationNode = query.to_operation_node();
    compile(&node, dialect).unwrap().sql
}

fn pg_sql(query: &impl ToOperationNode) -> String {
    sql_for(query, Dialect::Postgres)
}
