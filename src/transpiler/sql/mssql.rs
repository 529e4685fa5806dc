use crate::ast::OperationNode;
use crate::error::QuarryResult;
use crate::transpiler::pagination::PaginationRewriter;
use crate::transpiler::traits::{PaginationStyle, SqlGenerator, quote_with};

pub struct MssqlGenerator;

impl SqlGenerator for MssqlGenerator {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_with(name, '[', ']')
    }

    fn placeholder(&self, index: usize) -> String {
        format!("@{}", index)
    }

    fn auto_increment(&self) -> &'static str {
        "identity"
    }

    fn bool_literal(&self, val: bool) -> &'static str {
        if val { "1" } else { "0" }
    }

    fn supports_returning(&self) -> bool {
        false
    }

    fn pagination(&self) -> PaginationStyle {
        PaginationStyle::TopOrFetch
    }

    fn rewrite(&self, node: &OperationNode) -> QuarryResult<OperationNode> {
        PaginationRewriter::new(self.pagination())
            .with_bit_comparisons()
            .rewrite(node)
    }
}
