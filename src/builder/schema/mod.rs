//! DDL builders, reached through [`QueryCreator::schema`](crate::QueryCreator::schema).
//!
//! ```rust,ignore
//! db.schema()
//!     .create_table("person")?
//!     .add_column_with("id", "integer", |col| Ok(col.primary_key().auto_increment()))?
//!     .add_column_with("first_name", "varchar(255)", |col| Ok(col.not_null()))?
//!     .execute()
//!     .await?;
//! ```

mod alter_table;
mod column;
mod index;
mod namespace;
mod table;
mod view;

use crate::engine::QueryExecutor;
use crate::error::QuarryResult;
use crate::parser::{parse_identifier, parse_schemable_identifier, parse_table};

use super::QueryBuilderProps;

pub use alter_table::{AlterColumnBuilder, AlterTableBuilder, AlteredColumn};
pub use column::ColumnDefinitionBuilder;
pub use index::{CreateIndexBuilder, DropIndexBuilder};
pub use namespace::{CreateSchemaBuilder, DropSchemaBuilder};
pub use table::{CreateTableBuilder, DropTableBuilder, ForeignKeyConstraintBuilder};
pub use view::{CreateViewBuilder, DropViewBuilder};

/// Entry point of the DDL builders.
#[derive(Clone)]
pub struct SchemaModule {
    executor: QueryExecutor,
}

impl SchemaModule {
    pub(crate) fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    fn props(&self) -> QueryBuilderProps {
        QueryBuilderProps::new(self.executor.clone())
    }

    /// `table` may be schema-qualified: `"public.person"`.
    pub fn create_table(&self, table: &str) -> QuarryResult<CreateTableBuilder> {
        Ok(CreateTableBuilder::create(self.props(), parse_table(table)?))
    }

    pub fn drop_table(&self, table: &str) -> QuarryResult<DropTableBuilder> {
        Ok(DropTableBuilder::create(self.props(), parse_table(table)?))
    }

    pub fn alter_table(&self, table: &str) -> QuarryResult<AlterTableBuilder> {
        Ok(AlterTableBuilder::create(self.props(), parse_table(table)?))
    }

    pub fn create_index(&self, name: &str) -> QuarryResult<CreateIndexBuilder> {
        Ok(CreateIndexBuilder::create(self.props(), parse_identifier(name)?))
    }

    pub fn drop_index(&self, name: &str) -> QuarryResult<DropIndexBuilder> {
        Ok(DropIndexBuilder::create(
            self.props(),
            parse_schemable_identifier(name)?,
        ))
    }

    pub fn create_schema(&self, schema: &str) -> QuarryResult<CreateSchemaBuilder> {
        Ok(CreateSchemaBuilder::create(self.props(), parse_identifier(schema)?))
    }

    pub fn drop_schema(&self, schema: &str) -> QuarryResult<DropSchemaBuilder> {
        Ok(DropSchemaBuilder::create(self.props(), parse_identifier(schema)?))
    }

    pub fn create_view(&self, name: &str) -> QuarryResult<CreateViewBuilder> {
        Ok(CreateViewBuilder::create(
            self.props(),
            parse_schemable_identifier(name)?,
        ))
    }

    pub fn drop_view(&self, name: &str) -> QuarryResult<DropViewBuilder> {
        Ok(DropViewBuilder::create(
            self.props(),
            parse_schemable_identifier(name)?,
        ))
    }
}

/// `compile` and `execute` for DDL builders. The builder needs a
/// `props: QueryBuilderProps` field and a `ToOperationNode` impl.
macro_rules! ddl_executable {
    ($($builder:ty),* $(,)?) => {
        $(
            impl $builder {
                pub fn compile(&self) -> $crate::error::QuarryResult<$crate::transpiler::CompiledQuery> {
                    self.props.compile(&$crate::builder::ToOperationNode::to_operation_node(self))
                }

                /// Run the statement. DDL yields no rows, only success.
                pub async fn execute(&self) -> $crate::error::QuarryResult<()> {
                    self.props
                        .execute(&$crate::builder::ToOperationNode::to_operation_node(self))
                        .await?;
                    Ok(())
                }
            }
        )*
    };
}

ddl_executable!(
    CreateTableBuilder,
    DropTableBuilder,
    AlterTableBuilder,
    CreateIndexBuilder,
    DropIndexBuilder,
    CreateSchemaBuilder,
    DropSchemaBuilder,
    CreateViewBuilder,
    DropViewBuilder,
);
