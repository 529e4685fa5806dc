//! # quarry
//!
//! An immutable SQL query builder with a dialect-aware compiler and an async
//! runtime.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use quarry::prelude::*;
//!
//! let db = Quarry::offline(Dialect::Postgres);
//! let query = db
//!     .select_from("person")?
//!     .select_all()
//!     .where_("age", ">", 18)?
//!     .order_by("first_name asc")?
//!     .limit(10)?;
//!
//! let compiled = query.compile()?;
//! // => select * from "person" where "age" > $1 order by "first_name" asc limit $2
//! // => parameters [18, 10]
//! ```
//!
//! ## Layers
//!
//! | Module        | Role                                                  |
//! |---------------|-------------------------------------------------------|
//! | `ast`         | Immutable `Arc` node tree                             |
//! | `parser`      | Reference, table and value strings into nodes         |
//! | `builder`     | Fluent select/insert/update/delete/merge/DDL builders |
//! | `transformer` | Structural rewrites that share untouched subtrees     |
//! | `transpiler`  | Nodes into SQL text plus parameters, per dialect      |
//! | `engine`      | Plugins, execution, transactions, streaming           |
//! | `driver`      | Driver SPI and the sqlx driver                        |
//! | `migrate`     | Ordered, locked schema migrations                     |

pub mod ast;
pub mod builder;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod expression;
pub mod log;
pub mod migrate;
pub mod parser;
pub mod plugin;
pub mod query_id;
pub mod transformer;
pub mod transpiler;

pub use config::QuarryConfig;
pub use engine::{Quarry, QueryCreator};
pub use error::{QuarryError, QuarryResult};
pub use transpiler::{CompiledQuery, Dialect};

pub mod prelude {
    pub use crate::ast::{OperationNode, Value};
    pub use crate::builder::{
        HavingInterface, JoinInterface, ReturningInterface, ToOperationNode, WhereInterface,
    };
    pub use crate::config::QuarryConfig;
    pub use crate::driver::{Driver, QueryResult, Row, SqlxDriver};
    pub use crate::engine::{Quarry, QueryCreator};
    pub use crate::error::*;
    pub use crate::expression::*;
    pub use crate::log::{LogConfig, LogLevel};
    pub use crate::migrate::{Migration, Migrator};
    pub use crate::plugin::{CamelCasePlugin, DeduplicateJoinsPlugin, Plugin, WithSchemaPlugin};
    pub use crate::transpiler::{CompiledQuery, Dialect};
}

/// Compile any node for `dialect`, without plugins.
///
/// # Example
///
/// ```
/// use quarry::{Dialect, Quarry, compile};
/// use quarry::builder::ToOperationNode;
///
/// let db = Quarry::offline(Dialect::Postgres);
/// let query = db.select_from("person").unwrap().select_all();
/// let compiled = compile(&query.to_operation_node(), Dialect::MySql).unwrap();
/// assert_eq!(compiled.sql, "select * from `person`");
/// ```
pub fn compile(node: &ast::OperationNode, dialect: Dialect) -> QuarryResult<CompiledQuery> {
    transpiler::compile(node, dialect)
}
