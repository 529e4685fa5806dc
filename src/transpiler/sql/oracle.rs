use crate::ast::OperationNode;
use crate::error::QuarryResult;
use crate::transpiler::pagination::PaginationRewriter;
use crate::transpiler::traits::{PaginationStyle, SqlGenerator};

pub struct OracleGenerator;

impl SqlGenerator for OracleGenerator {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn placeholder(&self, index: usize) -> String {
        format!(":{}", index)
    }

    fn auto_increment(&self) -> &'static str {
        "generated by default as identity"
    }

    fn supports_returning(&self) -> bool {
        false
    }

    fn pagination(&self) -> PaginationStyle {
        PaginationStyle::FetchNext
    }

    fn rewrite(&self, node: &OperationNode) -> QuarryResult<OperationNode> {
        PaginationRewriter::new(self.pagination()).rewrite(node)
    }
}
